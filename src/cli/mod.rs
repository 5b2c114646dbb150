//! Command-line interface.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;

use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;

#[derive(Parser, Debug)]
#[command(name = "embedding-backfill")]
#[command(about = "Backfill vector embeddings for rows that do not have one yet", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Defaults to `run`
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to a YAML config file (default: ./backfill.yaml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Embed every row whose embedding field is unset
    Run,
    /// Show how many rows have and lack embeddings
    Status,
}

/// Load configuration, set up logging and dispatch the command.
///
/// Configuration is validated before any network call is made.
pub async fn execute(cli: &Cli) -> Result<()> {
    let config = ConfigLoader::load(cli.config.as_deref())?;
    let _logger = LoggerImpl::init(&config.logging)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::execute(&config, cli.json).await,
        Commands::Status => commands::status::execute(&config, cli.json).await,
    }
}

/// Print the error chain and exit with status 1.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
        let body = serde_json::json!({ "error": err.to_string(), "causes": chain });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err}", style("Error:").red().bold());
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }
    std::process::exit(1);
}
