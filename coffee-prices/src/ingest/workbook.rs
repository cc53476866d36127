//! Fetch and decode the price workbook
//!
//! Sheet selection is an ordered rule list so that new naming conventions
//! can be appended without disturbing the existing ones.

use std::io::Cursor;

use calamine::{Reader, open_workbook_auto_from_rs};
use log::{debug, info};

use super::config::IngestConfig;
use super::error::IngestError;
use super::values::RawCell;

/// One rule for choosing the sheet to ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetRule {
    /// First sheet, in workbook order, whose name contains any of the
    /// markers (case-sensitive)
    NameContainsAny(Vec<String>),
    /// Sheet at this 0-based position
    Position(usize),
}

impl SheetRule {
    fn resolve<'a>(&self, names: &'a [String]) -> Option<&'a String> {
        match self {
            SheetRule::NameContainsAny(markers) => names
                .iter()
                .find(|name| markers.iter().any(|marker| name.contains(marker.as_str()))),
            SheetRule::Position(index) => names.get(*index),
        }
    }
}

impl std::fmt::Display for SheetRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetRule::NameContainsAny(markers) => {
                write!(f, "name contains any of '{}'", markers.join("', '"))
            }
            SheetRule::Position(index) => write!(f, "position {}", index),
        }
    }
}

/// A decoded sheet
///
/// Row and column indices are absolute: row 0 / column 0 is cell A1 even when
/// the sheet's used range starts further down or right.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<RawCell>>,
}

/// Pick the sheet name to ingest
///
/// Returns the chosen name together with the rule that matched.
pub fn select_sheet<'a>(names: &[String], rules: &'a [SheetRule]) -> Option<(String, &'a SheetRule)> {
    rules
        .iter()
        .find_map(|rule| rule.resolve(names).map(|name| (name.clone(), rule)))
}

/// Download the workbook bytes
///
/// A single GET; non-success statuses are fatal and not retried here.
pub async fn fetch_workbook(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, IngestError> {
    let fetch_error = |reason: String| IngestError::Fetch {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP {}", status)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| fetch_error(format!("failed to read body: {}", e)))?;

    info!("Downloaded price workbook ({} bytes)", bytes.len());
    Ok(bytes.to_vec())
}

/// Decode workbook bytes and read the sheet chosen by `rules`
pub fn decode_workbook(bytes: Vec<u8>, rules: &[SheetRule]) -> Result<Sheet, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::Decode(e.to_string()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    debug!("Workbook sheets: {:?}", sheet_names);

    let (sheet_name, rule) = select_sheet(&sheet_names, rules).ok_or_else(|| IngestError::SheetNotFound {
        available: sheet_names.clone(),
    })?;
    info!("Using sheet '{}' (matched rule: {})", sheet_name, rule);

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::Decode(format!("failed to read sheet '{}': {}", sheet_name, e)))?;

    let (start_row, start_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<RawCell>> = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![RawCell::Empty; start_col];
        cells.extend(row.iter().map(RawCell::from));
        rows.push(cells);
    }

    debug!("Sheet '{}' has {} rows", sheet_name, rows.len());
    Ok(Sheet {
        name: sheet_name,
        rows,
    })
}

/// Build the outbound HTTP client for a run
pub fn http_client(config: &IngestConfig) -> Result<reqwest::Client, IngestError> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("coffee-prices/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| IngestError::Fetch {
            url: config.source_url.clone(),
            reason: format!("failed to build HTTP client: {}", e),
        })
}

/// Fetch, decode and select the sheet in one step
pub async fn load(client: &reqwest::Client, config: &IngestConfig) -> Result<Sheet, IngestError> {
    let bytes = fetch_workbook(client, &config.source_url).await?;
    decode_workbook(bytes, &config.sheet_rules)
}
