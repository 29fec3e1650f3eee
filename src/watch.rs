use crate::config::Config;
use crate::render;
use crate::scan::{self, ProjectScanner};
use crate::summary::SummaryClient;
use anyhow::{bail, Result};
use colored::*;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

pub const FOCUS_FILE: &str = "Focus.md";
pub const RULES_FILE: &str = ".cursorrules";

/// Per-project state carried across cycles: effective settings plus the
/// rendered-body caches used for change detection.
pub struct ProjectState {
    pub name: String,
    pub root: PathBuf,
    pub interval: Duration,
    pub max_depth: usize,
    last_run: Option<Instant>,
    last_focus: Option<String>,
    last_rules: Option<String>,
}

impl ProjectState {
    pub fn new(name: String, root: PathBuf, interval: Duration, max_depth: usize) -> Self {
        Self {
            name,
            root,
            interval,
            max_depth,
            last_run: None,
            last_focus: None,
            last_rules: None,
        }
    }

    fn due(&self) -> bool {
        self.last_run.map_or(true, |t| t.elapsed() >= self.interval)
    }
}

pub struct Watcher {
    config: Config,
    projects: Vec<ProjectState>,
    summary: Option<SummaryClient>,
}

impl Watcher {
    /// Resolves the configured projects and validates their roots.
    /// A missing root is fatal when it is the only project; with several
    /// configured, missing roots are skipped with a warning and only
    /// zero survivors aborts startup.
    pub fn new(config: Config, summary: Option<SummaryClient>) -> Result<Self> {
        let configured = if config.projects.is_empty() {
            let cwd = std::env::current_dir()?;
            vec![crate::config::ProjectConfig {
                name: scan::detect::project_name(&cwd),
                path: cwd,
                update_interval: None,
                max_depth: None,
            }]
        } else {
            config.projects.clone()
        };

        let single = configured.len() == 1;
        let mut projects = Vec::new();
        for project in &configured {
            if !project.path.is_dir() {
                if single {
                    bail!("Project root not found: {}", project.path.display());
                }
                tracing::warn!("Skipping missing project root {}", project.path.display());
                println!(
                    "{} Not found: {}",
                    "warning:".yellow(),
                    project.path.display()
                );
                continue;
            }
            projects.push(ProjectState::new(
                project.name.clone(),
                project.path.clone(),
                Duration::from_secs(config.effective_interval(project)),
                config.effective_depth(project),
            ));
        }

        if projects.is_empty() {
            bail!("No projects to monitor");
        }

        Ok(Self {
            config,
            projects,
            summary,
        })
    }

    /// Single cooperative loop: every tick, each project whose interval
    /// elapsed gets one full pipeline run. Scans never overlap and a
    /// started scan always runs to completion. Cycle failures are
    /// logged; the next interval is the retry.
    pub async fn run(&mut self) -> Result<()> {
        let scanner = ProjectScanner::new(&self.config)?;

        println!(
            "{}",
            format!("Monitoring {} project(s), Ctrl+C to stop", self.projects.len())
                .green()
                .bold()
        );
        for project in &self.projects {
            println!(
                "  {} {} ({})",
                "watching".blue(),
                project.name,
                project.root.display()
            );
        }

        loop {
            for state in self.projects.iter_mut() {
                if !state.due() {
                    continue;
                }
                if let Err(e) = run_cycle(&scanner, self.summary.as_ref(), state).await {
                    tracing::error!("{}: cycle failed: {:#}", state.name, e);
                    eprintln!("{} {}: {:#}", "error:".red().bold(), state.name, e);
                }
                state.last_run = Some(Instant::now());
            }
            tokio::time::sleep(TICK).await;
        }
    }
}

async fn run_cycle(
    scanner: &ProjectScanner<'_>,
    summary: Option<&SummaryClient>,
    state: &mut ProjectState,
) -> Result<()> {
    let snapshot = scanner.scan(&state.root)?;

    let overview = match summary {
        Some(client) => client.summarize(&snapshot.project, &snapshot.tree).await,
        None => String::new(),
    };

    let focus_body = render::render_focus(&snapshot, &overview, state.max_depth);
    let rules_doc = render::render_rules(&snapshot.project);
    let rules_body = rules_doc.to_string();

    let mut wrote = false;

    if state.last_focus.as_deref() != Some(focus_body.as_str()) {
        let full = render::finalize_focus(&focus_body, snapshot.generated_at);
        fs::write(state.root.join(FOCUS_FILE), full)?;
        state.last_focus = Some(focus_body);
        wrote = true;
    }

    if state.last_rules.as_deref() != Some(rules_body.as_str()) {
        let full = render::finalize_rules(&rules_doc, snapshot.generated_at);
        fs::write(state.root.join(RULES_FILE), full)?;
        state.last_rules = Some(rules_body);
        wrote = true;
    }

    if wrote {
        println!(
            "{} {} ({})",
            "✓".green(),
            state.name,
            snapshot.generated_at.format("%H:%M")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn state_for(root: &Path) -> ProjectState {
        ProjectState::new(
            "Demo".to_string(),
            root.to_path_buf(),
            Duration::from_secs(60),
            3,
        )
    }

    #[tokio::test]
    async fn unchanged_filesystem_writes_only_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.py"), "def main():\n    pass\n").unwrap();

        let config = Config::default();
        let scanner = ProjectScanner::new(&config).unwrap();
        let mut state = state_for(dir.path());

        run_cycle(&scanner, None, &mut state).await.unwrap();
        assert!(dir.path().join(FOCUS_FILE).is_file());
        assert!(dir.path().join(RULES_FILE).is_file());

        // Remove the outputs; an idempotent second cycle must not
        // recreate them because nothing changed.
        fs::remove_file(dir.path().join(FOCUS_FILE)).unwrap();
        fs::remove_file(dir.path().join(RULES_FILE)).unwrap();

        run_cycle(&scanner, None, &mut state).await.unwrap();
        assert!(!dir.path().join(FOCUS_FILE).exists());
        assert!(!dir.path().join(RULES_FILE).exists());
    }

    #[tokio::test]
    async fn changed_filesystem_triggers_a_rewrite() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.py"), "def main():\n    pass\n").unwrap();

        let config = Config::default();
        let scanner = ProjectScanner::new(&config).unwrap();
        let mut state = state_for(dir.path());

        run_cycle(&scanner, None, &mut state).await.unwrap();
        let first = fs::read_to_string(dir.path().join(FOCUS_FILE)).unwrap();

        fs::write(dir.path().join("extra.py"), "def extra():\n    pass\n").unwrap();
        run_cycle(&scanner, None, &mut state).await.unwrap();
        let second = fs::read_to_string(dir.path().join(FOCUS_FILE)).unwrap();

        assert_ne!(first, second);
        assert!(second.contains("extra.py"));
    }

    #[tokio::test]
    async fn focus_is_produced_without_a_summary_client() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.py"), "x = 1\n").unwrap();

        let config = Config::default();
        let scanner = ProjectScanner::new(&config).unwrap();
        let mut state = state_for(dir.path());

        run_cycle(&scanner, None, &mut state).await.unwrap();
        let focus = fs::read_to_string(dir.path().join(FOCUS_FILE)).unwrap();
        assert!(focus.contains("regenerated automatically"));
    }

    #[tokio::test]
    async fn summary_failure_never_escapes_the_pipeline() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.py"), "x = 1\n").unwrap();

        // Nothing listens here, so every summary attempt fails.
        let client = SummaryClient::new("key".to_string(), "http://127.0.0.1:9".to_string()).unwrap();

        let config = Config::default();
        let scanner = ProjectScanner::new(&config).unwrap();
        let mut state = state_for(dir.path());

        run_cycle(&scanner, Some(&client), &mut state).await.unwrap();
        let focus = fs::read_to_string(dir.path().join(FOCUS_FILE)).unwrap();
        // Generic fallback overview in place of the summary prose.
        assert!(focus.contains("regenerated automatically"));
    }

    #[test]
    fn missing_single_root_is_a_startup_error() {
        let config: Config = toml::from_str(
            r#"
            [[projects]]
            name = "Gone"
            path = "/definitely/not/here"
            "#,
        )
        .unwrap();

        assert!(Watcher::new(config, None).is_err());
    }

    #[test]
    fn missing_roots_are_skipped_when_others_remain() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().to_string_lossy().into_owned();
        let config: Config = toml::from_str(&format!(
            r#"
            [[projects]]
            name = "Gone"
            path = "/definitely/not/here"

            [[projects]]
            name = "Good"
            path = "{}"
            "#,
            good
        ))
        .unwrap();

        let watcher = Watcher::new(config, None).unwrap();
        assert_eq!(watcher.projects.len(), 1);
        assert_eq!(watcher.projects[0].name, "Good");
    }
}
