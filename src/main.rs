//! Binary entry point for tasklist.
//!
//! This binary provides the CLI interface for the tasklist store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process::ExitCode;
use tasklist::cli::{OutputFormat, TaskFilter, render_config, render_status, render_tasks};
use tasklist::config::TasklistConfig;
use tasklist::observability::{self, InitOptions};
use tasklist::services::{BackendFactory, ConfiguredBackend};
use tasklist::{KeyValueStore, Task, TaskId, TaskStore};

/// Tasklist - a small persistent to-do list.
#[derive(Parser)]
#[command(name = "tasklist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Add a task.
    Add {
        /// The task text.
        text: String,
    },

    /// List tasks, newest first.
    List {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Show only pending tasks.
        #[arg(long)]
        pending: bool,

        /// Show only completed tasks.
        #[arg(long)]
        completed: bool,
    },

    /// Flip a task between pending and completed.
    Toggle {
        /// Task ID.
        id: String,
    },

    /// Delete a task.
    Delete {
        /// Task ID.
        id: String,
    },

    /// Replace a task's text.
    Edit {
        /// Task ID.
        id: String,

        /// New text.
        text: String,
    },

    /// Show status.
    Status,

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Completions need neither config nor storage.
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "tasklist", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    let config = match TasklistConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let _observability =
        match observability::init_from_config(&config, InitOptions { verbose: cli.verbose }) {
            Ok(handle) => handle,
            Err(e) => {
                eprintln!("Failed to initialize observability: {e}");
                return ExitCode::FAILURE;
            },
        };

    for warning in &config.warnings {
        tracing::warn!("{warning}");
    }

    match run_command(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

async fn run_command(command: Commands, config: TasklistConfig) -> anyhow::Result<()> {
    if let Commands::Config { show } = command {
        if show {
            println!("{}", render_config(&config));
        } else {
            println!("Use --show to display configuration");
        }
        return Ok(());
    }

    let backend = BackendFactory::create(&config).context("failed to open storage backend")?;
    let store = TaskStore::with_key(backend, config.storage_key.clone());
    // Read and parse failures are logged and leave the list empty.
    store.prepare().await;

    match command {
        Commands::Add { text } => cmd_add(&store, &text).await,
        Commands::List {
            format,
            pending,
            completed,
        } => {
            let filter = TaskFilter::from_flags(pending, completed);
            println!("{}", render_tasks(&store.ordered(), format, filter)?);
            Ok(())
        },
        Commands::Toggle { id } => {
            let task = store.toggle_task(&TaskId::new(id)).await?;
            let state = if task.completed { "completed" } else { "pending" };
            println!("Task {} marked {state}", task.id);
            Ok(())
        },
        Commands::Delete { id } => {
            let id = TaskId::new(id);
            if store.delete_task(&id).await? {
                println!("Task {id} deleted");
            } else {
                println!("No task with id {id}");
            }
            Ok(())
        },
        Commands::Edit { id, text } => cmd_edit(&store, TaskId::new(id), text).await,
        Commands::Status => {
            println!(
                "{}",
                render_status(store.stats(), store.backend().name(), store.storage_key())
            );
            Ok(())
        },
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

async fn cmd_add(store: &TaskStore<ConfiguredBackend>, text: &str) -> anyhow::Result<()> {
    let text = text.trim();
    if text.is_empty() {
        bail!("task text must not be empty");
    }
    let task = store.add_task(text).await?;
    println!("Task added:");
    println!("  ID: {}", task.id);
    println!("  Text: {}", task.text);
    Ok(())
}

async fn cmd_edit(
    store: &TaskStore<ConfiguredBackend>,
    id: TaskId,
    text: String,
) -> anyhow::Result<()> {
    let Some(existing) = store.snapshot().get(&id).cloned() else {
        bail!("task not found: {id}");
    };
    let updated = Task { text, ..existing };
    store.update_task(updated).await?;
    println!("Task {id} updated");
    Ok(())
}
