use crate::config::IgnoreConfig;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value as TomlValue;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProjectType {
    ChromeExtension,
    Node,
    React,
    Python,
    Generic,
}

impl ProjectType {
    pub fn description(&self) -> &'static str {
        match self {
            ProjectType::ChromeExtension => "Chrome Extension",
            ProjectType::Node => "Node.js Project",
            ProjectType::React => "React Application",
            ProjectType::Python => "Python Project",
            ProjectType::Generic => "Generic Project",
        }
    }
}

/// Identity of a scanned project, fixed for the duration of one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectInfo {
    pub root: PathBuf,
    pub kind: ProjectType,
    pub name: String,
    pub version: Option<String>,
}

pub fn detect(root: &Path) -> ProjectInfo {
    let kind = classify(root);
    ProjectInfo {
        root: root.to_path_buf(),
        kind,
        name: project_name(root),
        version: read_version(root, kind),
    }
}

/// Marker files checked in fixed priority order. Unknown layouts fail
/// soft to Generic.
fn classify(root: &Path) -> ProjectType {
    if root.join("manifest.json").is_file() {
        ProjectType::ChromeExtension
    } else if root.join("package.json").is_file() {
        if root.join("src").join("App.js").is_file() {
            ProjectType::React
        } else {
            ProjectType::Node
        }
    } else if root.join("setup.py").is_file() || root.join("pyproject.toml").is_file() {
        ProjectType::Python
    } else {
        ProjectType::Generic
    }
}

fn read_version(root: &Path, kind: ProjectType) -> Option<String> {
    match kind {
        ProjectType::ChromeExtension => json_version(&root.join("manifest.json")),
        ProjectType::Node | ProjectType::React => json_version(&root.join("package.json")),
        ProjectType::Python => pyproject_version(&root.join("pyproject.toml")),
        ProjectType::Generic => None,
    }
}

fn json_version(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let value: JsonValue = serde_json::from_str(&content).ok()?;
    value.get("version")?.as_str().map(String::from)
}

fn pyproject_version(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let value: TomlValue = toml::from_str(&content).ok()?;
    value
        .get("project")?
        .get("version")?
        .as_str()
        .map(String::from)
}

/// Display name from the directory name: common checkout suffixes are
/// stripped, separators become spaces, words are title-cased.
pub fn project_name(root: &Path) -> String {
    let base = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Project".to_string());

    let mut trimmed = base.as_str();
    for suffix in ["-main", "-master", "-dev", "-development", ".git"] {
        if let Some(rest) = trimmed.strip_suffix(suffix) {
            trimmed = rest;
            break;
        }
    }

    let words: Vec<String> = trimmed
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "Project".to_string()
    } else {
        words.join(" ")
    }
}

/// Find projects under `root` up to `max_depth` directory levels, for the
/// setup flow. A detected project's subdirectories are not searched for
/// nested projects.
pub fn discover(root: &Path, max_depth: usize, ignore: &IgnoreConfig) -> Vec<ProjectInfo> {
    let mut found: Vec<ProjectInfo> = Vec::new();

    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return false;
            }
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !name.starts_with('.') && !ignore.directories.iter().any(|d| d == name.as_ref())
        });

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if found
            .iter()
            .any(|p| path != p.root && path.starts_with(&p.root))
        {
            continue;
        }
        if classify(path) != ProjectType::Generic {
            found.push(detect(path));
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn setup_py_alone_means_python() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "setup.py", "from setuptools import setup");

        assert_eq!(detect(dir.path()).kind, ProjectType::Python);
    }

    #[test]
    fn package_json_with_app_js_means_react_not_node() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "package.json", r#"{"version": "2.1.0"}"#);
        write(dir.path(), "src/App.js", "export default function App() {}");

        let info = detect(dir.path());
        assert_eq!(info.kind, ProjectType::React);
        assert_eq!(info.version.as_deref(), Some("2.1.0"));
    }

    #[test]
    fn package_json_alone_means_node() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "package.json", r#"{"name": "svc"}"#);

        let info = detect(dir.path());
        assert_eq!(info.kind, ProjectType::Node);
        assert_eq!(info.version, None);
    }

    #[test]
    fn manifest_json_takes_priority_over_package_json() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "manifest.json", r#"{"version": "0.3"}"#);
        write(dir.path(), "package.json", r#"{"version": "9.9"}"#);

        let info = detect(dir.path());
        assert_eq!(info.kind, ProjectType::ChromeExtension);
        assert_eq!(info.version.as_deref(), Some("0.3"));
    }

    #[test]
    fn unknown_layout_fails_soft_to_generic() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.txt", "nothing to see");

        assert_eq!(detect(dir.path()).kind, ProjectType::Generic);
    }

    #[test]
    fn malformed_manifest_still_classifies() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "package.json", "not json at all");

        let info = detect(dir.path());
        assert_eq!(info.kind, ProjectType::Node);
        assert_eq!(info.version, None);
    }

    #[test]
    fn pyproject_version_is_read() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "pyproject.toml",
            "[project]\nname = \"demo\"\nversion = \"1.4.2\"\n",
        );

        let info = detect(dir.path());
        assert_eq!(info.kind, ProjectType::Python);
        assert_eq!(info.version.as_deref(), Some("1.4.2"));
    }

    #[test]
    fn name_cleanup_strips_checkout_suffixes() {
        assert_eq!(
            project_name(Path::new("/tmp/my-cool-project-main")),
            "My Cool Project"
        );
        assert_eq!(project_name(Path::new("/tmp/tool_box")), "Tool Box");
    }

    #[test]
    fn discover_finds_subprojects_and_skips_ignored_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "api/package.json", "{}");
        write(root, "worker/setup.py", "");
        write(root, "node_modules/dep/package.json", "{}");
        // Nested project inside an already detected one.
        write(root, "api/examples/package.json", "{}");

        let config = Config::default();
        let found = discover(root, 3, &config.ignore);
        let mut kinds: Vec<(String, ProjectType)> = found
            .iter()
            .map(|p| (p.name.clone(), p.kind))
            .collect();
        kinds.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(found.len(), 2);
        assert_eq!(kinds[0].1, ProjectType::Node);
        assert_eq!(kinds[1].1, ProjectType::Python);
    }
}
