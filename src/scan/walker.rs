use crate::config::{IgnoreConfig, LengthConfig};
use crate::scan::extract::{FunctionExtractor, FunctionInfo, LanguageTag};
use anyhow::{Context, Result};
use glob::Pattern;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

// Our own output artifacts never take part in a scan, otherwise every
// write would change the next snapshot and the loop would never settle.
const GENERATED_FILES: &[&str] = &["Focus.md", ".cursorrules"];

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Path relative to the project root.
    pub path: PathBuf,
    pub name: String,
    pub language: LanguageTag,
    pub line_count: usize,
    /// Soft limit that applied to this file, for the alert report.
    pub line_limit: usize,
    pub too_long: bool,
    pub unreadable: bool,
    pub functions: Vec<FunctionInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub enum TreeNode {
    Dir { name: String, children: Vec<TreeNode> },
    File(FileEntry),
}

/// Nested snapshot of the project, rebuilt fully on every scan cycle.
/// Ordering is deterministic: depth-first, directories before files,
/// byte order of names within each level.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryTree {
    pub children: Vec<TreeNode>,
}

impl DirectoryTree {
    /// Flat file list in traversal order.
    pub fn files(&self) -> Vec<&FileEntry> {
        let mut entries = Vec::new();
        collect_files(&self.children, &mut entries);
        entries
    }

    pub fn file_count(&self) -> usize {
        self.files().len()
    }
}

fn collect_files<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a FileEntry>) {
    for node in nodes {
        match node {
            TreeNode::Dir { children, .. } => collect_files(children, out),
            TreeNode::File(entry) => out.push(entry),
        }
    }
}

pub struct DirectoryWalker<'a> {
    ignore: &'a IgnoreConfig,
    lengths: &'a LengthConfig,
    extractor: &'a FunctionExtractor,
    file_patterns: Vec<Pattern>,
}

impl<'a> DirectoryWalker<'a> {
    pub fn new(
        ignore: &'a IgnoreConfig,
        lengths: &'a LengthConfig,
        extractor: &'a FunctionExtractor,
    ) -> Self {
        let file_patterns = ignore
            .files
            .iter()
            .filter_map(|raw| match Pattern::new(raw) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!("Skipping invalid ignore pattern {:?}: {}", raw, e);
                    None
                }
            })
            .collect();

        Self {
            ignore,
            lengths,
            extractor,
            file_patterns,
        }
    }

    pub fn walk(&self, root: &Path) -> Result<DirectoryTree> {
        let children = self
            .walk_dir(root, root)
            .with_context(|| format!("Failed to walk {}", root.display()))?;
        Ok(DirectoryTree { children })
    }

    fn walk_dir(&self, dir: &Path, root: &Path) -> Result<Vec<TreeNode>> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if path.is_dir() {
                if !self.is_ignored_dir(&name) {
                    dirs.push((name, path));
                }
            } else if path.is_file() && !self.is_ignored_file(&name) {
                files.push((name, path));
            }
        }

        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut children = Vec::new();
        for (name, path) in dirs {
            let grandchildren = match self.walk_dir(&path, root) {
                Ok(nodes) => nodes,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory {}: {}", path.display(), e);
                    continue;
                }
            };
            children.push(TreeNode::Dir {
                name,
                children: grandchildren,
            });
        }
        for (name, path) in files {
            children.push(TreeNode::File(self.process_file(&path, root, name)));
        }

        Ok(children)
    }

    fn is_ignored_dir(&self, name: &str) -> bool {
        name.starts_with('.') || self.ignore.directories.iter().any(|d| d == name)
    }

    fn is_ignored_file(&self, name: &str) -> bool {
        if name.starts_with('.') || GENERATED_FILES.contains(&name) {
            return true;
        }
        let extension = dotted_extension(name);
        if self
            .ignore
            .binary_extensions
            .iter()
            .any(|b| b.eq_ignore_ascii_case(&extension))
        {
            return true;
        }
        self.file_patterns.iter().any(|p| p.matches(name))
    }

    fn process_file(&self, path: &Path, root: &Path, name: String) -> FileEntry {
        let extension = dotted_extension(&name);
        let language = LanguageTag::from_extension(&extension);
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();

        let line_limit = self.lengths.limit_for(&extension);

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Unreadable file {}: {}", path.display(), e);
                return FileEntry {
                    path: relative,
                    name,
                    language,
                    line_count: 0,
                    line_limit,
                    too_long: false,
                    unreadable: true,
                    functions: Vec::new(),
                };
            }
        };

        let line_count = content.lines().count();
        let too_long = line_count > line_limit;
        let functions = self.extractor.extract(language, &content);

        FileEntry {
            path: relative,
            name,
            language,
            line_count,
            line_limit,
            too_long,
            unreadable: false,
            functions,
        }
    }
}

fn dotted_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!(".{}", ext.to_lowercase()),
        _ => String::new(),
    }
}
