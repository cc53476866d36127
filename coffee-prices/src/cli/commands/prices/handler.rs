//! Stored price queries

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::*;

use super::{HistoryArgs, LatestArgs, OutputFormat};
use crate::cli::open_store;
use crate::config::Config;
use crate::config::repository::prices;
use crate::ingest::PriceRecord;

pub async fn handle_latest_command(args: LatestArgs, config: Config) -> Result<ExitCode> {
    let store = open_store(&config).await?;
    let latest = prices::latest_price(store.pool()).await?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&latest).context("Failed to format JSON output")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    match latest {
        Some(record) => println!(
            "{} {}",
            record.date_key().cyan(),
            record.price.to_string().bright_green().bold()
        ),
        None => println!("{}", "No prices stored".yellow()),
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn handle_history_command(args: HistoryArgs, config: Config) -> Result<ExitCode> {
    let store = open_store(&config).await?;
    let records = prices::recent_prices(store.pool(), args.limit).await?;

    if records.is_empty() && matches!(args.format, OutputFormat::Table) {
        println!("{}", "No prices stored".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    print!("{}", format_history(&records, args.format)?);
    Ok(ExitCode::SUCCESS)
}

fn format_history(records: &[PriceRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let mut out = format!("{:<12}{:>14}\n", "Date".bold(), "Price".bold());
            for record in records {
                out.push_str(&format!(
                    "{:<12}{:>14}\n",
                    record.date_key(),
                    format!("{:.0}", record.price.value())
                ));
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let mut out =
                serde_json::to_string_pretty(records).context("Failed to format JSON output")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(["date", "price"])?;
            for record in records {
                writer.write_record([record.date_key(), record.price.to_string()])?;
            }
            let bytes = writer.into_inner().context("Failed to flush CSV output")?;
            String::from_utf8(bytes).context("CSV output was not UTF-8")
        }
    }
}
