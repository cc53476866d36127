//! Daily Colombian coffee reference price ingestion
//!
//! Pulls the coffee federation's published price workbook, extracts the
//! daily internal price series and keeps a date-keyed history in SQLite.

pub mod api;
pub mod cli;
pub mod config;
pub mod ingest;
