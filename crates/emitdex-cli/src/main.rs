//! emitdex CLI
//!
//! Command-line interface for scanning a workspace for emit calls and
//! querying the resulting event index.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use emitdex_core::{EmitdexConfig, Workspace};
use emitdex_indexer::{CycleReport, Direction};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emitdex")]
#[command(about = "emitdex - Index alt:V-style event emits across a workspace")]
#[command(version)]
struct Cli {
    /// Config file (default: <PATH>/.emitdex.yaml, then ~/.emitdex/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan once and print every file's events
    Scan {
        /// Workspace path (default: current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Scan once and print event names emitted in one direction
    Query {
        /// Workspace path (default: current directory)
        #[arg(default_value = ".")]
        path: String,

        /// to-client, to-server, server-only, client-only, to-webview, from-webview
        #[arg(short, long)]
        direction: Direction,
    },

    /// Scan once and print parameter hints for a line of code
    Context {
        /// Line of code being edited
        line: String,

        /// Workspace path (default: current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Keep the index fresh and log every cycle until Ctrl+C
    Watch {
        /// Workspace path (default: current directory)
        #[arg(default_value = ".")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = match &cli.command {
        Commands::Scan { path }
        | Commands::Query { path, .. }
        | Commands::Context { path, .. }
        | Commands::Watch { path } => PathBuf::from(path),
    };

    let config = match &cli.config {
        Some(file) => EmitdexConfig::load_from(file)
            .with_context(|| format!("Failed to load config {}", file.display()))?,
        None => EmitdexConfig::load(&path),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Scan { .. } => cmd_scan(&path, config, cli.json).await,
        Commands::Query { direction, .. } => cmd_query(&path, config, direction, cli.json).await,
        Commands::Context { line, .. } => cmd_context(&path, config, &line, cli.json).await,
        Commands::Watch { .. } => cmd_watch(&path, config).await,
    }
}

async fn open_and_refresh(path: &Path, config: EmitdexConfig) -> Result<Workspace> {
    let workspace = Workspace::open(path, config).context("Invalid path")?;
    workspace.refresh().await;
    Ok(workspace)
}

async fn cmd_scan(path: &Path, config: EmitdexConfig, json: bool) -> Result<()> {
    let workspace = open_and_refresh(path, config).await?;
    let engine = workspace.engine();
    let entries: Vec<_> = engine
        .index()
        .entries()
        .into_iter()
        .filter(|(_, records)| !records.is_empty())
        .collect();

    if json {
        let files: Vec<_> = entries
            .iter()
            .map(|(file, records)| {
                serde_json::json!({
                    "path": file.strip_prefix(&workspace.root).unwrap_or(file),
                    "events": records,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    for (file, records) in &entries {
        println!("{}", file.strip_prefix(&workspace.root).unwrap_or(file).display());
        for record in records {
            let direction = record
                .direction
                .map_or("unclassified", |d| d.as_str());
            print!("  {:<14} {}", direction, record.event_name);
            if let Some(variable) = &record.variable_name {
                print!(" ({})", variable);
            }
            if let Some(hint) = &record.event_suggestion {
                print!("  // {}", hint);
            }
            println!();
        }
    }

    println!();
    println!(
        "{} files, {} events, {} variables",
        entries.len(),
        engine.index().record_count(),
        engine.variable_count()
    );

    Ok(())
}

async fn cmd_query(path: &Path, config: EmitdexConfig, direction: Direction, json: bool) -> Result<()> {
    let workspace = open_and_refresh(path, config).await?;
    let names = workspace.engine().query_by_direction(direction);

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for name in names {
            println!("{}", name);
        }
    }

    Ok(())
}

async fn cmd_context(path: &Path, config: EmitdexConfig, line: &str, json: bool) -> Result<()> {
    let workspace = open_and_refresh(path, config).await?;
    let suggestions = workspace.engine().query_by_context(line);

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
    } else if suggestions.is_empty() {
        println!("No parameter hints for this line.");
    } else {
        for suggestion in suggestions {
            println!("{:<24} {}", suggestion.event, suggestion.signature);
        }
    }

    Ok(())
}

async fn cmd_watch(path: &Path, config: EmitdexConfig) -> Result<()> {
    let mut workspace = Workspace::open(path, config).context("Invalid path")?;
    let mut reports = workspace.start_watching();

    println!("Watching {}", workspace.root.display());
    println!("Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT");
                break;
            }
            report = reports.recv() => match report {
                Ok(CycleReport::Events(report)) if report.files_scanned > 0 => {
                    println!(
                        "events: {} files rescanned, {} records, {} names indexed",
                        report.files_scanned,
                        report.records,
                        workspace.engine().all_event_names().len()
                    );
                }
                Ok(CycleReport::Variables(report)) if report.files_walked > 0 => {
                    println!("variables: {} defined", report.variables);
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Report receiver lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    workspace.stop_watching().await;
    Ok(())
}
