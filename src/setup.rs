use crate::config::{Config, ProjectConfig};
use crate::scan;
use anyhow::{Context, Result};
use colored::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DISCOVER_DEPTH: usize = 3;

/// Discover sub-projects under `target`, let the operator pick, and
/// persist the selection to the config file the watcher reads.
pub fn scan_command(config: &mut Config, config_path: &Path, target: &Path) -> Result<()> {
    let root = target
        .canonicalize()
        .with_context(|| format!("Scan path not found: {}", target.display()))?;

    println!("{} {}", "Scanning:".blue().bold(), root.display());
    let found = scan::discover(&root, DISCOVER_DEPTH, &config.ignore);

    if found.is_empty() {
        println!("No projects found");
        return Ok(());
    }

    println!("\nFound {} projects:", found.len());
    for (i, project) in found.iter().enumerate() {
        println!(
            "{}. {} ({})",
            i + 1,
            project.name.bold(),
            project.kind.description()
        );
        println!("   Path: {}", project.root.display());
        if let Some(version) = &project.version {
            println!("   Version: {}", version);
        }
    }

    println!("\nSelect projects (numbers/all/q):");
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let indices = match parse_selection(input.trim(), found.len()) {
        Selection::Quit => return Ok(()),
        Selection::Invalid => {
            println!("{}", "Invalid selection".red());
            return Ok(());
        }
        Selection::Indices(indices) => indices,
    };

    let mut added = 0;
    for index in indices {
        let project = &found[index];
        if config.projects.iter().any(|p| p.path == project.root) {
            continue;
        }
        config.projects.push(ProjectConfig {
            name: project.name.clone(),
            path: project.root.clone(),
            update_interval: None,
            max_depth: None,
        });
        added += 1;
    }

    if added > 0 {
        dedupe_names(&mut config.projects);
        config.save(config_path)?;
        println!("{} Added {} projects", "✓".green(), added);
    }

    Ok(())
}

pub fn list_command(config: &Config) {
    if config.projects.is_empty() {
        println!("No projects configured");
        return;
    }

    println!("{}", "Configured projects:".bold());
    for (i, project) in config.projects.iter().enumerate() {
        println!("\n  {}. {}", i + 1, project.name.bold());
        println!("     Path: {}", project.path.display());
        if let Some(interval) = project.update_interval {
            println!("     Update interval: {} seconds", interval);
        }
        if let Some(depth) = project.max_depth {
            println!("     Max depth: {} levels", depth);
        }
    }
}

/// Non-interactive add. Paths that do not exist are warned about and
/// skipped; existing entries for the same path are updated in place.
pub fn add_command(
    config: &mut Config,
    config_path: &Path,
    paths: &[PathBuf],
    names: &[String],
) -> Result<()> {
    for (i, raw) in paths.iter().enumerate() {
        let path = match raw.canonicalize() {
            Ok(path) => path,
            Err(_) => {
                println!("{} Path not found: {}", "warning:".yellow(), raw.display());
                continue;
            }
        };

        let name = names
            .get(i)
            .cloned()
            .unwrap_or_else(|| scan::detect::project_name(&path));
        let entry = ProjectConfig {
            name,
            path,
            update_interval: None,
            max_depth: None,
        };

        match config.projects.iter_mut().find(|p| p.path == entry.path) {
            Some(existing) => *existing = entry,
            None => config.projects.push(entry),
        }
    }

    dedupe_names(&mut config.projects);
    config.save(config_path)?;
    list_command(config);
    Ok(())
}

/// Remove projects by name, 1-based index, or "all" (with confirmation).
pub fn remove_command(config: &mut Config, config_path: &Path, targets: &[String]) -> Result<()> {
    if config.projects.is_empty() {
        println!("No projects configured");
        return Ok(());
    }

    if targets.iter().any(|t| t == "all") {
        if confirm("Remove all projects?")? {
            config.projects.clear();
            config.save(config_path)?;
            println!("{} All projects removed", "✓".green());
        }
        return Ok(());
    }

    let before = config.projects.len();
    let keep = removal_survivors(&config.projects, targets);
    let removed = before - keep.len();
    config.projects = keep;

    if removed > 0 {
        config.save(config_path)?;
        println!("{} Removed {} projects", "✓".green(), removed);
    } else {
        println!("No matching projects found");
    }

    Ok(())
}

enum Selection {
    Indices(Vec<usize>),
    Quit,
    Invalid,
}

fn parse_selection(input: &str, count: usize) -> Selection {
    let input = input.to_lowercase();
    match input.as_str() {
        "q" | "quit" | "exit" => return Selection::Quit,
        "all" => return Selection::Indices((0..count).collect()),
        _ => {}
    }

    let mut indices = Vec::new();
    for token in input.split_whitespace() {
        match token.parse::<usize>() {
            Ok(n) if n >= 1 && n <= count => indices.push(n - 1),
            _ => return Selection::Invalid,
        }
    }

    if indices.is_empty() {
        Selection::Invalid
    } else {
        Selection::Indices(indices)
    }
}

/// Duplicate display names get a numeric suffix, first occurrence wins.
fn dedupe_names(projects: &mut [ProjectConfig]) {
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for project in projects.iter_mut() {
        let base = project.name.clone();
        let seen = counts.entry(base.clone()).or_insert(0);
        *seen += 1;
        if *seen > 1 {
            project.name = format!("{} ({})", base, seen);
        }
    }
}

fn removal_survivors(projects: &[ProjectConfig], targets: &[String]) -> Vec<ProjectConfig> {
    projects
        .iter()
        .enumerate()
        .filter(|(i, project)| {
            !targets.iter().any(|target| {
                if let Ok(index) = target.parse::<usize>() {
                    index == i + 1
                } else {
                    project.name.eq_ignore_ascii_case(target)
                }
            })
        })
        .map(|(_, project)| project.clone())
        .collect()
}

fn confirm(message: &str) -> Result<bool> {
    loop {
        print!("{} (y/n): ", message);
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;
        match response.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => continue,
        }
    }
}
