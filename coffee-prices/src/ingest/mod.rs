//! Coffee price ingestion pipeline
//!
//! Downloads the federation's price workbook, finds the daily internal
//! price columns, normalises the rows and stores the dates not yet known.

pub mod columns;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod rows;
pub mod store;
pub mod types;
pub mod values;
pub mod workbook;

pub use columns::locate_columns;
pub use config::{IngestConfig, IngestConfigBuilder};
pub use error::{IngestError, ValueError};
pub use pipeline::{IngestReport, ingest_sheet, ingest_workbook, run};
pub use reconcile::reconcile;
pub use rows::extract_records;
pub use store::{DryRunStore, MemoryPriceStore, PriceStore, SqlitePriceStore};
pub use types::{ColumnMap, IngestionSummary, Price, PriceRecord};
pub use values::{RawCell, parse_date, parse_price};
pub use workbook::{Sheet, SheetRule};
