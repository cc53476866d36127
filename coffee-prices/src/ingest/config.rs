//! Ingestion run configuration with builder pattern
//!
//! Groups everything that shapes a single run: where the workbook comes
//! from, how its sheet and header are located, and the outbound timeout.

use std::time::Duration;

use super::workbook::SheetRule;

/// Workbook published by the Federación Nacional de Cafeteros
pub const DEFAULT_SOURCE_URL: &str =
    "https://federaciondecafeteros.org/app/uploads/2025/01/Precios-area-y-produccion-de-cafe-2025.xlsx";

/// Name of the daily internal price sheet as last published
pub const DAILY_PRICE_SHEET_NAME: &str = "Precio Interno Diario";

/// Rows scanned from the top of the sheet when looking for the header
pub const MAX_HEADER_SEARCH_ROWS: usize = 20;

/// Configuration for one ingestion run
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub source_url: String,
    /// Evaluated in order; the first rule that resolves a sheet wins
    pub sheet_rules: Vec<SheetRule>,
    pub header_scan_rows: usize,
    pub request_timeout: Duration,
    /// Rows dated further than this past today are dropped
    pub max_future_days: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            sheet_rules: default_sheet_rules(),
            header_scan_rows: MAX_HEADER_SEARCH_ROWS,
            request_timeout: Duration::from_secs(60),
            max_future_days: 366,
        }
    }
}

/// Name markers first, then the second sheet as a positional fallback
///
/// The publisher renames sheets without notice; the positional rule keeps
/// ingestion alive when both name markers disappear.
pub fn default_sheet_rules() -> Vec<SheetRule> {
    vec![
        SheetRule::NameContainsAny(vec![
            DAILY_PRICE_SHEET_NAME.to_string(),
            "Diario".to_string(),
        ]),
        SheetRule::Position(1),
    ]
}

impl IngestConfig {
    /// Create a new builder for IngestConfig
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::new()
    }
}

/// Builder for IngestConfig
#[derive(Debug)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: IngestConfig::default(),
        }
    }

    /// Set the workbook URL
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.config.source_url = url.into();
        self
    }

    /// Replace the sheet selection rules
    pub fn sheet_rules(mut self, rules: Vec<SheetRule>) -> Self {
        self.config.sheet_rules = rules;
        self
    }

    /// Append a rule after the existing ones
    pub fn push_sheet_rule(mut self, rule: SheetRule) -> Self {
        self.config.sheet_rules.push(rule);
        self
    }

    /// Set how many leading rows are searched for the header
    pub fn header_scan_rows(mut self, rows: usize) -> Self {
        self.config.header_scan_rows = rows;
        self
    }

    /// Set the outbound fetch timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the future-date tolerance in days
    pub fn max_future_days(mut self, days: u32) -> Self {
        self.config.max_future_days = days;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> IngestConfig {
        self.config
    }
}

impl Default for IngestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
