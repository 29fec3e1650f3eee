use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub ignore: IgnoreConfig,
    #[serde(default)]
    pub lengths: LengthConfig,
}

/// One monitored project. Optional fields fall back to the global
/// `[scan]` settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProjectConfig {
    pub name: String,
    pub path: PathBuf,
    pub update_interval: Option<u64>,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScanConfig {
    /// Seconds between scan cycles.
    pub update_interval: u64,
    /// Depth limit for the rendered directory tree. The walk itself is
    /// never truncated.
    pub max_depth: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            update_interval: 60,
            max_depth: 3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IgnoreConfig {
    pub directories: Vec<String>,
    /// Glob patterns matched against file names.
    pub files: Vec<String>,
    pub binary_extensions: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            directories: [
                "__pycache__",
                "node_modules",
                "venv",
                ".git",
                ".idea",
                ".vscode",
                "dist",
                "build",
                "coverage",
                "vendor",
                "tmp",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            files: [".DS_Store", "*.pyc", "*.pyo", "*.lock", "*.min.js"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            binary_extensions: [
                ".png", ".jpg", ".jpeg", ".gif", ".ico", ".pdf", ".exe", ".bin", ".zip", ".tar",
                ".gz", ".woff", ".woff2", ".ttf", ".eot",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Soft per-extension line limits. Files above their limit get flagged in
/// the length-alert section; the scan itself is never blocked.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LengthConfig {
    pub standards: HashMap<String, usize>,
    #[serde(rename = "default")]
    pub default_limit: usize,
}

impl Default for LengthConfig {
    fn default() -> Self {
        let standards = [
            (".js", 300),
            (".jsx", 250),
            (".ts", 300),
            (".tsx", 250),
            (".py", 400),
            (".rs", 400),
            (".css", 400),
            (".scss", 400),
            (".html", 300),
            (".vue", 250),
            (".svelte", 250),
            (".json", 100),
            (".yaml", 100),
            (".yml", 100),
            (".toml", 100),
            (".md", 500),
            (".php", 400),
        ]
        .iter()
        .map(|(ext, limit)| (ext.to_string(), *limit))
        .collect();

        Self {
            standards,
            default_limit: 300,
        }
    }
}

impl LengthConfig {
    /// Line limit for a dotted extension such as ".py".
    pub fn limit_for(&self, extension: &str) -> usize {
        self.standards
            .get(extension)
            .copied()
            .unwrap_or(self.default_limit)
    }
}

impl Config {
    pub fn create_default(path: &Path) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn effective_interval(&self, project: &ProjectConfig) -> u64 {
        project.update_interval.unwrap_or(self.scan.update_interval)
    }

    pub fn effective_depth(&self, project: &ProjectConfig) -> usize {
        project.max_depth.unwrap_or(self.scan.max_depth)
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "cursorfocus", "cursorfocus")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
