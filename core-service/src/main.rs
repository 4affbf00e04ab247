//! DeepSecure - Main Entry Point
//!
//! Command-line front end for the detection API and the analysis history.

mod api;
mod logic;
pub mod constants;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use api::commands::{self, AppContext};
use logic::config::{AppConfig, StorageKind};
use logic::history::HistoryItem;

#[derive(Parser)]
#[command(name = "deepsecure", version, about = "Upload files to the DeepSecure detection API and browse past analyses")]
struct Cli {
    /// Detection API base URL (overrides DEEPSECURE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// History backend (overrides DEEPSECURE_STORAGE)
    #[arg(long, global = true, value_enum)]
    storage: Option<StorageKind>,

    /// Directory holding history (overrides DEEPSECURE_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a file for analysis and record the result
    Analyze {
        file: PathBuf,
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List previous analyses
    History {
        #[arg(long)]
        json: bool,
    },
    /// Show a stored analysis again without contacting the API
    Open {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Record a chat entry in history
    Message {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Check that the detection API is up
    Health,
    /// Keep the history list on screen, refreshing relative times
    Watch,
    /// Remove all stored history
    ClearHistory,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(storage) = cli.storage {
        config.storage = storage;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    log::info!("Starting {} v{}", constants::APP_NAME, constants::APP_VERSION);
    log::debug!("API: {}, storage: {:?}", config.api_url, config.storage);

    let ctx = AppContext::new(config)?;

    match cli.command {
        Command::Analyze { file, json } => {
            let report = commands::analyze_file(&ctx, &file).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report.result)?);
            } else {
                print!("{}", report.view);
            }
        }
        Command::History { json } => {
            let items = commands::get_history(&ctx);
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print_history(&items);
            }
        }
        Command::Open { id, json } => {
            let view = commands::open_entry(&ctx, &id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", view);
            }
        }
        Command::Message { text } => {
            match commands::send_message(&ctx, &text.join(" ")) {
                Some(entry) => println!("Recorded: {} ({})", entry.title, entry.id),
                None => println!("Nothing to record"),
            }
        }
        Command::Health => {
            let health = commands::check_health(&ctx).await?;
            println!("Status: {}", health.status);
            for (name, value) in &health.components {
                println!("  {}: {}", name, value);
            }
        }
        Command::Watch => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Cannot listen for Ctrl+C: {}", e);
                }
            };
            commands::watch_history(&ctx, shutdown, |items| {
                println!();
                print_history(items);
            })
            .await;
        }
        Command::ClearHistory => {
            commands::clear_history(&ctx);
            println!("History cleared");
        }
    }

    Ok(())
}

fn print_history(items: &[HistoryItem]) {
    if items.is_empty() {
        println!("No previous analyses");
        return;
    }

    for item in items {
        let marker = if item.entry.has_result() { "*" } else { " " };
        println!("{} {:<16} {:<50} {}", marker, item.entry.id, item.entry.title, item.time);
    }
}
