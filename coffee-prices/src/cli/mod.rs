//! Command line interface

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::config::repository::connect;
use crate::ingest::SqlitePriceStore;
use commands::ingest::IngestArgs;
use commands::prices::{HistoryArgs, LatestArgs};
use commands::trigger::TriggerArgs;

#[derive(Debug, Parser)]
#[command(name = "coffee-prices", version, about = "Colombian coffee reference price ingestion")]
pub struct Cli {
    /// Config file (defaults to <config dir>/coffee-prices/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database URL, overrides DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download the price workbook and store new daily prices
    Ingest(IngestArgs),
    /// Dispatch one inbound request through the trigger
    Trigger(TriggerArgs),
    /// Show the most recent stored price
    Latest(LatestArgs),
    /// Show recent stored prices
    History(HistoryArgs),
}

/// Resolve configuration and dispatch the selected command
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    match cli.command {
        Commands::Ingest(args) => commands::ingest::handler::handle_ingest_command(args, config).await,
        Commands::Trigger(args) => {
            commands::trigger::handler::handle_trigger_command(args, config).await
        }
        Commands::Latest(args) => commands::prices::handler::handle_latest_command(args, config).await,
        Commands::History(args) => {
            commands::prices::handler::handle_history_command(args, config).await
        }
    }
}

/// Open the configured database as a price store
pub(crate) async fn open_store(config: &Config) -> Result<SqlitePriceStore> {
    let pool = connect(&config.database_url).await?;
    Ok(SqlitePriceStore::new(pool))
}
