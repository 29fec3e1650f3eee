use crate::scan::{FileEntry, ScanSnapshot, TreeNode};
use chrono::{DateTime, Local};
use std::fmt::Write;

pub mod rules;

pub use rules::{finalize_rules, render_rules};

// Same format the generated documents have always carried.
pub const TIMESTAMP_FORMAT: &str = "%B %d, %Y at %I:%M %p";

const GENERIC_OVERVIEW: &str =
    "This document tracks the structure of the project and is regenerated automatically.";

/// Timestamp-free Focus.md body. Pure: the same snapshot and summary
/// render to the identical string, which is what change detection
/// compares across cycles.
pub fn render_focus(snapshot: &ScanSnapshot, summary: &str, max_depth: usize) -> String {
    let mut out = String::new();
    let project = &snapshot.project;

    let _ = writeln!(out, "# Project Focus: {}", project.name);
    out.push('\n');
    let _ = writeln!(out, "**Project Type:** {}", project.kind.description());
    if let Some(version) = &project.version {
        let _ = writeln!(out, "**Version:** {}", version);
    }
    out.push('\n');

    let overview = summary.trim();
    if overview.is_empty() {
        out.push_str(GENERIC_OVERVIEW);
    } else {
        out.push_str(overview);
    }
    out.push('\n');

    out.push_str("\n## Directory Structure\n\n```\n");
    render_tree(&snapshot.tree.children, "", 1, max_depth, &mut out);
    out.push_str("```\n");

    let files = snapshot.tree.files();

    let documented: Vec<&&FileEntry> = files.iter().filter(|f| !f.functions.is_empty()).collect();
    if !documented.is_empty() {
        out.push_str("\n## Functions\n");
        for entry in documented {
            out.push('\n');
            let _ = writeln!(
                out,
                "### `{}` ({} lines, {})",
                entry.path.display(),
                entry.line_count,
                entry.language.name()
            );
            for function in &entry.functions {
                let _ = writeln!(
                    out,
                    "- `{}` (line {}): {}",
                    function.name, function.line, function.description
                );
            }
        }
    }

    let alerts: Vec<&&FileEntry> = files.iter().filter(|f| f.too_long).collect();
    if !alerts.is_empty() {
        out.push_str("\n## Length Alerts\n\n");
        for entry in alerts {
            let _ = writeln!(
                out,
                "- `{}`: {} lines (limit {})",
                entry.path.display(),
                entry.line_count,
                entry.line_limit
            );
        }
    }

    out
}

/// Append the embedded timestamp. Kept out of the body so an unchanged
/// snapshot never forces a rewrite.
pub fn finalize_focus(body: &str, timestamp: DateTime<Local>) -> String {
    format!(
        "{}\n---\n*Last updated: {}*\n",
        body.trim_end(),
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

fn render_tree(nodes: &[TreeNode], prefix: &str, depth: usize, max_depth: usize, out: &mut String) {
    let last_index = nodes.len().saturating_sub(1);
    for (index, node) in nodes.iter().enumerate() {
        let connector = if index == last_index {
            "└─ "
        } else {
            "├─ "
        };
        match node {
            TreeNode::Dir { name, children } => {
                let _ = writeln!(out, "{}{}{}/", prefix, connector, name);
                if depth < max_depth {
                    let child_prefix = if index == last_index {
                        format!("{}   ", prefix)
                    } else {
                        format!("{}│  ", prefix)
                    };
                    render_tree(children, &child_prefix, depth + 1, max_depth, out);
                }
            }
            TreeNode::File(entry) => {
                if entry.unreadable {
                    let _ = writeln!(out, "{}{}{} (unreadable)", prefix, connector, entry.name);
                } else {
                    let _ = writeln!(
                        out,
                        "{}{}{} ({} lines)",
                        prefix, connector, entry.name, entry.line_count
                    );
                }
            }
        }
    }
}
