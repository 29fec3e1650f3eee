use crate::config::Config;
use anyhow::Result;
use chrono::{DateTime, Local};
use std::path::Path;

pub mod detect;
pub mod extract;
pub mod walker;

pub use detect::{detect, discover, ProjectInfo, ProjectType};
pub use extract::{FunctionExtractor, FunctionInfo, LanguageTag};
pub use walker::{DirectoryTree, DirectoryWalker, FileEntry, TreeNode};

/// Everything captured in one scan cycle. Rebuilt from scratch every
/// time; nothing survives into the next cycle.
#[derive(Debug)]
pub struct ScanSnapshot {
    pub project: ProjectInfo,
    pub tree: DirectoryTree,
    pub generated_at: DateTime<Local>,
}

/// Runs the detect + walk pipeline against a project root.
pub struct ProjectScanner<'a> {
    config: &'a Config,
    extractor: FunctionExtractor,
}

impl<'a> ProjectScanner<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        Ok(Self {
            config,
            extractor: FunctionExtractor::new()?,
        })
    }

    pub fn scan(&self, root: &Path) -> Result<ScanSnapshot> {
        let project = detect::detect(root);
        let walker = DirectoryWalker::new(
            &self.config.ignore,
            &self.config.lengths,
            &self.extractor,
        );
        let tree = walker.walk(root)?;

        Ok(ScanSnapshot {
            project,
            tree,
            generated_at: Local::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn scan_produces_a_full_snapshot() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("setup.py"), "from setuptools import setup").unwrap();
        fs::write(dir.path().join("app.py"), "def run():\n    pass\n").unwrap();

        let config = Config::default();
        let scanner = ProjectScanner::new(&config).unwrap();
        let snapshot = scanner.scan(dir.path()).unwrap();

        assert_eq!(snapshot.project.kind, ProjectType::Python);
        assert_eq!(snapshot.tree.file_count(), 2);
        let app = snapshot
            .tree
            .files()
            .into_iter()
            .find(|f| f.name == "app.py")
            .unwrap();
        assert_eq!(app.functions.len(), 1);
    }

    #[test]
    fn missing_root_is_an_error() {
        let config = Config::default();
        let scanner = ProjectScanner::new(&config).unwrap();
        assert!(scanner.scan(Path::new("/nonexistent/path/here")).is_err());
    }
}
