//! Header detection for the daily price sheet
//!
//! The publisher shifts columns and renames headers from year to year, so
//! columns are found by header text rather than fixed position. When the
//! text no longer matches, the run fails instead of guessing.

use log::debug;

use super::error::IngestError;
use super::types::ColumnMap;
use super::values::RawCell;

const DATE_HEADER: &str = "Fecha";
const PRICE_HEADER: &str = "Precio Interno";
/// Monthly/annual average columns share the price header prefix
const EXCLUDED_PRICE_HEADER: &str = "Promedio";

fn is_date_header(text: &str) -> bool {
    text.contains(DATE_HEADER) || text.eq_ignore_ascii_case("fecha")
}

fn is_price_header(text: &str) -> bool {
    text.contains(PRICE_HEADER) && !text.contains(EXCLUDED_PRICE_HEADER)
}

/// Scan the first `scan_rows` rows for the date and price headers
///
/// Cells are visited row-major, left to right. The first date header fixes
/// both the date column and the header row; the first price header in a
/// different column fixes the price column. Scanning stops once both are
/// known.
pub fn locate_columns(rows: &[Vec<RawCell>], scan_rows: usize) -> Result<ColumnMap, IngestError> {
    let mut date: Option<(usize, usize)> = None;
    let mut price_column: Option<usize> = None;

    for (row_idx, row) in rows.iter().take(scan_rows).enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let Some(text) = cell.as_text() else {
                continue;
            };

            if date.is_none() && is_date_header(text) {
                debug!("Date header '{}' at row {}, column {}", text, row_idx, col_idx);
                date = Some((row_idx, col_idx));
            }

            let date_column = date.map(|(_, col)| col);
            if price_column.is_none() && is_price_header(text) && date_column != Some(col_idx) {
                debug!("Price header '{}' at row {}, column {}", text, row_idx, col_idx);
                price_column = Some(col_idx);
            }
        }

        if date.is_some() && price_column.is_some() {
            break;
        }
    }

    match (date, price_column) {
        (Some((header_row, date_column)), Some(price_column)) => Ok(ColumnMap {
            date_column,
            price_column,
            header_row,
        }),
        (date, price_column) => Err(IngestError::MissingColumns {
            date_found: date.is_some(),
            price_found: price_column.is_some(),
            scanned_rows: scan_rows.min(rows.len()),
        }),
    }
}
