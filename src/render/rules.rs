use crate::scan::{ProjectInfo, ProjectType};
use chrono::{DateTime, Local};
use serde_json::{json, Value};

use super::TIMESTAMP_FORMAT;

/// Timestamp-free `.cursorrules` document. Everything except the project
/// identity comes from a fixed per-type template, so the output is fully
/// deterministic and comparable across cycles.
pub fn render_rules(project: &ProjectInfo) -> Value {
    json!({
        "version": "1.0",
        "project": {
            "name": project.name,
            "type": type_key(project.kind),
            "description": project.kind.description(),
            "version": project.version,
        },
        "behavior": behavior_template(project.kind),
    })
}

/// Serialize for writing, injecting the generation timestamp.
pub fn finalize_rules(rules: &Value, timestamp: DateTime<Local>) -> String {
    let mut document = rules.clone();
    if let Value::Object(map) = &mut document {
        map.insert(
            "last_updated".to_string(),
            json!(timestamp.format(TIMESTAMP_FORMAT).to_string()),
        );
    }
    let mut text = serde_json::to_string_pretty(&document).unwrap_or_default();
    text.push('\n');
    text
}

fn type_key(kind: ProjectType) -> &'static str {
    match kind {
        ProjectType::ChromeExtension => "chrome_extension",
        ProjectType::Node => "node_js",
        ProjectType::React => "react",
        ProjectType::Python => "python",
        ProjectType::Generic => "generic",
    }
}

fn behavior_template(kind: ProjectType) -> Value {
    match kind {
        ProjectType::ChromeExtension => json!({
            "tab_width": 2,
            "frameworks": ["Chrome Extension APIs"],
            "conventions": [
                "Keep manifest.json in sync with the feature code",
                "Separate content scripts from background logic",
                "Request the narrowest permissions that work",
            ],
        }),
        ProjectType::Node => json!({
            "tab_width": 2,
            "frameworks": ["Node.js"],
            "conventions": [
                "Match the module style (CommonJS or ESM) already in use",
                "Keep package.json scripts as the entry points for tooling",
                "Handle promise rejections explicitly",
            ],
        }),
        ProjectType::React => json!({
            "tab_width": 2,
            "frameworks": ["React"],
            "conventions": [
                "Prefer function components and hooks",
                "One component per file, named after the file",
                "Keep shared state close to where it is used",
            ],
        }),
        ProjectType::Python => json!({
            "tab_width": 4,
            "frameworks": ["Python"],
            "conventions": [
                "Follow PEP 8 naming and layout",
                "Keep modules under the configured length limits",
                "Prefer explicit imports over wildcard imports",
            ],
        }),
        ProjectType::Generic => json!({
            "tab_width": 4,
            "frameworks": [],
            "conventions": [
                "Keep the documentation in sync with the directory structure",
                "Prefer small, single-purpose files",
            ],
        }),
    }
}
