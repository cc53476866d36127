//! Error taxonomy for an ingestion run
//!
//! Every variant is fatal for the run. Per-row problems never surface here;
//! they are [`ValueError`]s that the row extractor swallows.

/// Fatal failure of a single ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Remote unreachable, timed out, or answered with a non-success status
    Fetch { url: String, reason: String },
    /// Body is not a readable workbook, or the chosen sheet cannot be read
    Decode(String),
    /// No sheet rule resolved to a sheet
    SheetNotFound { available: Vec<String> },
    /// Header scan window ended without both columns
    MissingColumns {
        date_found: bool,
        price_found: bool,
        scanned_rows: usize,
    },
    /// A header matched but nothing below it parsed
    NoValidRows { header_row: usize },
    /// The bulk write was rejected by the store
    Store(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Fetch { url, reason } => {
                write!(f, "failed to fetch price workbook from {}: {}", url, reason)
            }
            IngestError::Decode(reason) => write!(f, "failed to decode price workbook: {}", reason),
            IngestError::SheetNotFound { available } => write!(
                f,
                "no daily price sheet found (sheets: {})",
                if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                }
            ),
            IngestError::MissingColumns {
                date_found,
                price_found,
                scanned_rows,
            } => {
                let missing = match (date_found, price_found) {
                    (false, false) => "date and price columns",
                    (false, true) => "date column",
                    _ => "price column",
                };
                write!(
                    f,
                    "could not find {} in the first {} rows; the source layout has changed",
                    missing, scanned_rows
                )
            }
            IngestError::NoValidRows { header_row } => write!(
                f,
                "no valid price rows found below header row {}",
                header_row
            ),
            IngestError::Store(reason) => write!(f, "failed to store prices: {}", reason),
        }
    }
}

impl std::error::Error for IngestError {}

/// Why a single cell could not be normalised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Cell kind cannot carry this value (e.g. a boolean in the price column)
    UnsupportedCell(&'static str),
    /// Text that does not parse as a number
    InvalidNumber(String),
    /// Number parsed but is zero, negative or not finite
    NonPositivePrice(String),
    /// Text or serial that does not resolve to a calendar date
    InvalidDate(String),
}

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueError::UnsupportedCell(kind) => write!(f, "unsupported cell type: {}", kind),
            ValueError::InvalidNumber(raw) => write!(f, "not a number: '{}'", raw),
            ValueError::NonPositivePrice(raw) => write!(f, "price must be positive: {}", raw),
            ValueError::InvalidDate(raw) => write!(f, "not a date: '{}'", raw),
        }
    }
}

impl std::error::Error for ValueError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_names_the_missing_side() {
        let err = IngestError::MissingColumns {
            date_found: true,
            price_found: false,
            scanned_rows: 20,
        };
        assert_eq!(
            err.to_string(),
            "could not find price column in the first 20 rows; the source layout has changed"
        );
    }

    #[test]
    fn test_sheet_not_found_lists_sheets() {
        let err = IngestError::SheetNotFound {
            available: vec!["Portada".to_string()],
        };
        assert_eq!(err.to_string(), "no daily price sheet found (sheets: Portada)");
    }
}
