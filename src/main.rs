use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use cursorfocus::config::{self, Config};
use cursorfocus::setup;
use cursorfocus::summary::SummaryClient;
use cursorfocus::watch::Watcher;

#[derive(Parser)]
#[command(
    name = "cursorfocus",
    version,
    about = "Keeps Focus.md and .cursorrules up to date for your projects"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Monitor the configured projects (the default)
    Run,
    /// Discover projects under a directory and pick which to monitor
    Scan {
        /// Directory to search, defaults to the current one
        path: Option<PathBuf>,
    },
    /// Show the configured projects
    List,
    /// Add projects without the interactive picker
    Add {
        /// Project roots to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Display names, matched to paths by position
        #[arg(long = "name")]
        names: Vec<String>,
    },
    /// Remove projects by name, 1-based index, or "all"
    Remove {
        #[arg(required = true)]
        targets: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::get_config_path()?,
    };

    if !config_path.exists() {
        Config::create_default(&config_path)?;
        println!("Created default config file at {:?}", config_path);
    }
    let mut config = Config::load(&config_path)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let summary = SummaryClient::from_env();
            if summary.is_none() {
                println!(
                    "{}",
                    "GEMINI_API_KEY not set, project summaries disabled".yellow()
                );
            }

            let mut watcher = Watcher::new(config, summary)?;
            tokio::select! {
                result = watcher.run() => result,
                _ = tokio::signal::ctrl_c() => {
                    println!("\nStopping");
                    Ok(())
                }
            }
        }
        Command::Scan { path } => {
            let target = path.unwrap_or_else(|| PathBuf::from("."));
            setup::scan_command(&mut config, &config_path, &target)
        }
        Command::List => {
            setup::list_command(&config);
            Ok(())
        }
        Command::Add { paths, names } => {
            setup::add_command(&mut config, &config_path, &paths, &names)
        }
        Command::Remove { targets } => setup::remove_command(&mut config, &config_path, &targets),
    }
}
