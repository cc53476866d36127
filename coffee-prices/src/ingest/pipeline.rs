//! One ingestion run, start to finish
//!
//! fetch -> decode + sheet selection -> header scan -> row extraction -> reconcile
//!
//! Each step is a single suspending or synchronous call; nothing runs in
//! parallel and nothing partial survives a failure.

use log::info;

use super::columns::locate_columns;
use super::config::IngestConfig;
use super::error::IngestError;
use super::reconcile::reconcile;
use super::rows::{extract_records, latest_allowed_date};
use super::store::PriceStore;
use super::types::{ColumnMap, IngestionSummary, PriceRecord};
use super::workbook::{Sheet, decode_workbook, http_client, load};

/// Everything a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub sheet_name: String,
    pub columns: ColumnMap,
    pub summary: IngestionSummary,
}

impl IngestReport {
    /// Most recent price in the sheet
    pub fn latest_price(&self) -> Option<&PriceRecord> {
        self.summary.latest_record.as_ref()
    }
}

/// Download the configured workbook and ingest it into `store`
pub async fn run(config: &IngestConfig, store: &dyn PriceStore) -> Result<IngestReport, IngestError> {
    info!("Fetching coffee prices from {}", config.source_url);
    let client = http_client(config)?;
    let sheet = load(&client, config).await?;
    ingest_sheet(&sheet, config, store).await
}

/// Ingest an already downloaded workbook
pub async fn ingest_workbook(
    bytes: Vec<u8>,
    config: &IngestConfig,
    store: &dyn PriceStore,
) -> Result<IngestReport, IngestError> {
    let sheet = decode_workbook(bytes, &config.sheet_rules)?;
    ingest_sheet(&sheet, config, store).await
}

/// Ingest a decoded sheet
pub async fn ingest_sheet(
    sheet: &Sheet,
    config: &IngestConfig,
    store: &dyn PriceStore,
) -> Result<IngestReport, IngestError> {
    let columns = locate_columns(&sheet.rows, config.header_scan_rows)?;
    info!(
        "Header at row {}: date column {}, price column {}",
        columns.header_row, columns.date_column, columns.price_column
    );

    let records = extract_records(&sheet.rows, &columns, latest_allowed_date(config.max_future_days))?;
    let summary = reconcile(store, &records).await?;

    Ok(IngestReport {
        sheet_name: sheet.name.clone(),
        columns,
        summary,
    })
}
