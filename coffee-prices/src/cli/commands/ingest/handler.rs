//! Ingest command handler

use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::*;
use log::warn;

use super::IngestArgs;
use crate::api::trigger::{self, CorsPolicy};
use crate::cli::open_store;
use crate::config::Config;
use crate::config::repository::open_existing;
use crate::ingest::{
    self, DryRunStore, IngestReport, MemoryPriceStore, PriceStore, SqlitePriceStore,
};

/// Run the pipeline once against the configured database
pub async fn handle_ingest_command(args: IngestArgs, mut config: Config) -> Result<ExitCode> {
    if let Some(url) = args.source_url {
        config.source_url = url;
    }

    let ingest_config = config.ingest_config();
    let empty = MemoryPriceStore::new();
    let sqlite;
    let base: &dyn PriceStore = if args.dry_run {
        match open_existing(&config.database_url).await {
            Ok(pool) => {
                sqlite = SqlitePriceStore::new(pool);
                &sqlite
            }
            Err(e) => {
                warn!("Dry run without stored prices: {:#}", e);
                &empty
            }
        }
    } else {
        sqlite = open_store(&config).await?;
        &sqlite
    };
    let dry_run = DryRunStore::new(base);
    let store: &dyn PriceStore = if args.dry_run { &dry_run } else { base };

    if args.json {
        let cors = CorsPolicy::for_environment(config.environment, &config.allowed_origin);
        let response = trigger::handle("POST", &cors, || ingest::run(&ingest_config, store)).await;
        println!("{}", response.body);
        return Ok(if response.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let started = Instant::now();
    let report = ingest::run(&ingest_config, store)
        .await
        .context("Coffee price ingestion failed")?;

    print_report(&report, args.dry_run, started.elapsed());
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &IngestReport, dry_run: bool, elapsed: Duration) {
    let summary = &report.summary;

    println!("Sheet: {}", report.sheet_name.cyan());
    println!(
        "Records parsed: {}",
        summary.total_records_parsed.to_string().bold()
    );

    let inserted_label = if dry_run { "Would insert" } else { "Inserted" };
    println!(
        "{}: {}",
        inserted_label,
        summary.new_records_inserted.to_string().bright_green().bold()
    );
    println!(
        "Already stored: {}",
        summary.existing_records_skipped.to_string().dimmed()
    );

    if let Some(latest) = report.latest_price() {
        println!(
            "Latest price: {} on {}",
            latest.price.to_string().bright_green().bold(),
            latest.date_key().cyan()
        );
    }

    println!("Done in {:.2}ms", elapsed.as_secs_f64() * 1000.0);
}
