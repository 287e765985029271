//! cclog - Claude Code conversation log inspector
//!
//! Reconstructs a Claude Code session log and prints the resolved
//! conversation forest as JSON or as an indented text outline.

mod outline;

use anyhow::{Context, Result};
use cclog_core::engine::Engine;
use cclog_core::{Config, ConversationStats, ToolRegistry, TreeNode};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Output format for the reconstructed conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser)]
#[command(name = "cclog")]
#[command(about = "Reconstruct Claude Code conversation logs into a resolved tree")]
#[command(version)]
struct Args {
    /// Path to the JSONL log file
    file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Compact JSON output (default: pretty)
    #[arg(long)]
    compact: bool,

    /// Config file (default: ~/.config/cclog/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output (log to stderr, show parse warnings)
    #[arg(short, long)]
    verbose: bool,

    /// Include summary statistics
    #[arg(long)]
    stats: bool,
}

/// JSON document printed for `--format json`
#[derive(Serialize)]
struct ExportOutput {
    file: String,
    roots: Vec<TreeNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<ConversationStats>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };

    let _log_guard = if args.verbose {
        cclog_core::logging::init_stderr("debug");
        None
    } else {
        cclog_core::logging::init(&config.logging).ok()
    };

    info!(
        file = %args.file.display(),
        config = ?args.config,
        format = ?args.format,
        "cclog starting"
    );

    let registry = ToolRegistry::with_defaults();
    let conversation = Engine::new(&config.engine, &registry)
        .run_file(&args.file)
        .with_context(|| format!("failed to read log {}", args.file.display()))?;

    info!(
        roots = conversation.roots().len(),
        warnings = conversation.warnings.len(),
        "Reconstruction complete"
    );

    if args.verbose {
        for warning in &conversation.warnings {
            eprintln!("Warning: {}", warning);
        }
    }

    let stats = args.stats.then(|| conversation.stats());
    let roots = conversation.to_tree();

    match args.format {
        OutputFormat::Json => {
            let output = ExportOutput {
                file: args.file.display().to_string(),
                roots,
                stats,
                warnings: if args.verbose {
                    conversation.warnings.clone()
                } else {
                    vec![]
                },
            };
            if args.compact {
                println!("{}", serde_json::to_string(&output)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        OutputFormat::Text => {
            print!("{}", outline::render(&roots));
            if let Some(stats) = stats {
                print!("{}", outline::render_stats(&stats));
            }
        }
    }

    Ok(())
}
