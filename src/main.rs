//! Quill command-line entry point
//!
//! Loads a file into the editing core and prints diagnostics, highlight
//! markup or search results.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use quill::commands::{format_diagnostics, CheckCommand, HighlightCommand, SearchCommand};
use quill::core::{AppConfig, APP_NAME, VERSION};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "quill", version, about = "Quill editing core")]
struct Cli {
    /// Configuration file (defaults to the per-user config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print diagnostics for a file
    Check {
        path: PathBuf,
        /// Language identifier, overriding detection from the extension
        #[arg(short, long)]
        language: Option<String>,
        /// Emit JSON instead of `path:line:col: message`
        #[arg(long)]
        json: bool,
        /// Hide diagnostics on this 1-based line (repeatable)
        #[arg(long = "mute")]
        mute: Vec<usize>,
    },
    /// Print highlight markup as HTML
    Highlight {
        path: PathBuf,
        #[arg(short, long)]
        language: Option<String>,
        /// Overlay occurrences of this term
        #[arg(short, long)]
        term: Option<String>,
        #[arg(long)]
        case_sensitive: bool,
    },
    /// Search a file and optionally replace every occurrence
    Search {
        path: PathBuf,
        term: String,
        #[arg(short, long)]
        language: Option<String>,
        #[arg(short, long)]
        replace: Option<String>,
        /// Override the configured case sensitivity
        #[arg(long)]
        case_sensitive: Option<bool>,
        /// Write replacements back to the file
        #[arg(short, long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    debug!("{} v{} starting", APP_NAME, VERSION);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path).await?,
        None => AppConfig::load().await.unwrap_or_else(|e| {
            info!("{}; using defaults", e.user_message());
            AppConfig::default()
        }),
    };

    match cli.command {
        Commands::Check {
            path,
            language,
            json,
            mute,
        } => {
            let command = CheckCommand {
                path,
                language,
                muted_lines: mute,
            };
            let diagnostics = command.execute().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&diagnostics)?);
            } else {
                print!("{}", format_diagnostics(&command.path, &diagnostics));
            }
        }
        Commands::Highlight {
            path,
            language,
            term,
            case_sensitive,
        } => {
            let command = HighlightCommand {
                path,
                language,
                term,
                case_sensitive,
            };
            println!("{}", command.execute().await?.to_html());
        }
        Commands::Search {
            path,
            term,
            language,
            replace,
            case_sensitive,
            write,
        } => {
            let command = SearchCommand {
                path,
                language,
                term,
                replacement: replace,
                case_sensitive,
                write,
            };
            let report = command.execute(&config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
