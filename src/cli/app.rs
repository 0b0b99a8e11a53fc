//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{task_cmd, views_cmd};
use crate::storage::Workspace;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(author, version, about = "Business-day task scheduling for small teams")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cadence workspace
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(task_cmd::TaskCommands),

    /// Re-plan an assignee's sequential backlog from today
    Reallocate {
        /// Assignee whose backlog to re-plan
        assignee: String,
    },

    /// Show the kanban board
    Board,

    /// Show tasks as calendar events
    Calendar {
        /// Only events starting on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only events starting on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Show allocation statistics
    Stats,

    /// Show the audit log
    Log {
        /// Only entries for this task ID
        #[arg(long)]
        task: Option<String>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    match cli.command {
        Commands::Init { path } => {
            let workspace = Workspace::init(&path)?;
            output.verbose(&format!(
                "Created .cadence directory under {}",
                workspace.root().display()
            ));
            output.success(&format!(
                "Initialized cadence workspace at {}",
                workspace.root().display()
            ));
        }

        Commands::Task(cmd) => task_cmd::run(cmd, &output)?,

        Commands::Reallocate { assignee } => views_cmd::reallocate(&output, &assignee)?,

        Commands::Board => views_cmd::board(&output)?,

        Commands::Calendar { from, to } => {
            views_cmd::calendar_view(&output, from.as_deref(), to.as_deref())?
        }

        Commands::Stats => views_cmd::stats_view(&output)?,

        Commands::Log { task } => views_cmd::log_view(&output, task.as_deref())?,
    }

    Ok(())
}
