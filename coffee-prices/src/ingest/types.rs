//! Core data types of the price pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A strictly positive, finite price in Colombian pesos per carga
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(f64);

impl Price {
    /// Returns `None` unless `value` is finite and greater than zero
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && value > 0.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One day's internal reference price
///
/// `date` serialises as `YYYY-MM-DD`, which is also the storage and
/// comparison key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub price: Price,
}

impl PriceRecord {
    pub fn new(date: NaiveDate, price: Price) -> Self {
        Self { date, price }
    }

    /// ISO 8601 calendar date used as the store key
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Where the date and price columns were found
///
/// All indices are 0-based and relative to the sheet's row grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date_column: usize,
    pub price_column: usize,
    pub header_row: usize,
}

/// Outcome of reconciling extracted records with the store
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionSummary {
    pub total_records_parsed: usize,
    pub new_records_inserted: usize,
    pub existing_records_skipped: usize,
    /// Last record in sheet order, which is the most recent publication
    pub latest_record: Option<PriceRecord>,
}

impl IngestionSummary {
    pub fn total_records(&self) -> usize {
        self.new_records_inserted + self.existing_records_skipped
    }
}
