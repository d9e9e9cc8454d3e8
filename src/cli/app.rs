//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::dep::{self, DepCommands};
use super::output::{Output, OutputFormat};
use super::query;
use super::source::Source;
use super::task::{self, TaskCommands};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "taskgate")]
#[command(author, version, about = "Dependency-aware task tracking that keeps the task graph acyclic")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true, env = "TASKGATE_VERBOSE")]
    pub verbose: bool,

    /// Read tasks from a JSON or JSONL file instead of the project (read-only)
    #[arg(long, global = true, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new taskgate project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommands),

    /// Manage dependencies between tasks
    #[command(subcommand)]
    Dep(DepCommands),

    /// Show tasks ready to work on
    Ready,

    /// Show tasks waiting on prerequisites
    Blocked,

    /// Show all tasks in dependency order
    Order,

    /// Check the task graph for dangling references, duplicates and cycles
    Check,

    /// Rewrite the task store, dropping superseded records
    Compact,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let global = Config::load_global()?;
    let format = cli.format.unwrap_or_else(|| global.default_format.into());
    let output = Output::new(format, cli.verbose);

    output.verbose("taskgate starting");

    let open_source = || Source::open(cli.snapshot.as_deref(), global.clone(), &output);

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created state directory at: {}", project.state_dir().display()),
            );
            output.success(&format!(
                "Initialized taskgate project at {}",
                project.root().display()
            ));
        }

        Commands::Task(cmd) => task::run(cmd, &open_source()?, &output)?,
        Commands::Dep(cmd) => dep::run(cmd, &open_source()?, &output)?,
        Commands::Ready => query::ready(&open_source()?, &output)?,
        Commands::Blocked => query::blocked(&open_source()?, &output)?,
        Commands::Order => query::order(&open_source()?, &output)?,
        Commands::Check => query::check(&open_source()?, &output)?,
        Commands::Compact => compact(&open_source()?, &output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}

/// Rewrites tasks.jsonl with one record per task
fn compact(source: &Source, output: &Output) -> Result<()> {
    let store = source.store()?;
    output.verbose_ctx("compact", &format!("Compacting {}", store.path().display()));

    let count = store.compact()?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "success": true,
            "tasks": count,
        }));
    } else {
        output.success(&format!("Compacted task store: {} tasks", count));
    }

    Ok(())
}
