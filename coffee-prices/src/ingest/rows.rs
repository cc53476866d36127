//! Data row extraction below the detected header

use chrono::{Days, NaiveDate, Utc};
use chrono_tz::America::Bogota;
use log::{debug, info};

use super::error::{IngestError, ValueError};
use super::types::{ColumnMap, PriceRecord};
use super::values::{RawCell, parse_date, parse_price};

/// Latest date a row may carry: today in Bogotá plus `max_future_days`
pub fn latest_allowed_date(max_future_days: u32) -> NaiveDate {
    let today = Utc::now().with_timezone(&Bogota).date_naive();
    today
        .checked_add_days(Days::new(u64::from(max_future_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Walk every row after the header and collect valid price records
///
/// Rows with a blank date or price cell are skipped silently; rows whose
/// cells fail to parse, or whose date lies after `not_after`, are dropped.
/// Output keeps sheet order. An empty result is fatal: the header matched
/// but the data region did not.
pub fn extract_records(
    rows: &[Vec<RawCell>],
    columns: &ColumnMap,
    not_after: NaiveDate,
) -> Result<Vec<PriceRecord>, IngestError> {
    let mut records = Vec::new();
    let mut blank = 0usize;
    let mut rejected = 0usize;

    for (row_idx, row) in rows.iter().enumerate().skip(columns.header_row + 1) {
        let date_cell = row.get(columns.date_column).unwrap_or(&RawCell::Empty);
        let price_cell = row.get(columns.price_column).unwrap_or(&RawCell::Empty);

        if date_cell.is_blank() || price_cell.is_blank() {
            blank += 1;
            continue;
        }

        match parse_row(date_cell, price_cell, not_after) {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!("Dropping row {}: {}", row_idx, e);
                rejected += 1;
            }
        }
    }

    info!(
        "Extracted {} price records ({} blank rows skipped, {} rows rejected)",
        records.len(),
        blank,
        rejected
    );

    if records.is_empty() {
        return Err(IngestError::NoValidRows {
            header_row: columns.header_row,
        });
    }

    Ok(records)
}

fn parse_row(date_cell: &RawCell, price_cell: &RawCell, not_after: NaiveDate) -> Result<PriceRecord, ValueError> {
    let date = parse_date(date_cell)?;
    if date > not_after {
        return Err(ValueError::InvalidDate(format!("{} is too far in the future", date)));
    }
    let price = parse_price(price_cell)?;
    Ok(PriceRecord::new(date, price))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    fn columns() -> ColumnMap {
        ColumnMap {
            date_column: 0,
            price_column: 1,
            header_row: 0,
        }
    }

    fn header() -> Vec<RawCell> {
        vec![text("Fecha"), text("Precio Interno")]
    }

    #[test]
    fn test_extracts_valid_rows_in_sheet_order() {
        let rows = vec![
            header(),
            vec![RawCell::Date(ymd(2024, 1, 1)), text("250.000")],
            vec![text("2024-01-02"), text("251.500")],
            vec![text("bad"), text("bad")],
        ];

        let records = extract_records(&rows, &columns(), ymd(2030, 1, 1)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, ymd(2024, 1, 1));
        assert_eq!(records[0].price.value(), 250_000.0);
        assert_eq!(records[1].date, ymd(2024, 1, 2));
        assert_eq!(records[1].price.value(), 251_500.0);
    }

    #[test]
    fn test_drops_blank_and_invalid_rows() {
        let rows = vec![
            header(),
            vec![RawCell::Empty, RawCell::Number(250_000.0)],
            vec![text("  "), RawCell::Number(250_000.0)],
            vec![RawCell::Number(45292.0), RawCell::Number(0.0)],
            vec![RawCell::Number(45292.0), RawCell::Number(-10.0)],
            vec![RawCell::Number(45292.0), text("n/d")],
            vec![RawCell::Number(45292.0)],
            vec![RawCell::Number(45293.0), RawCell::Number(1_900_000.0)],
        ];

        let records = extract_records(&rows, &columns(), ymd(2030, 1, 1)).unwrap();
        assert_eq!(records, vec![PriceRecord::new(
            ymd(2024, 1, 2),
            crate::ingest::types::Price::new(1_900_000.0).unwrap()
        )]);
    }

    #[test]
    fn test_rows_above_and_on_header_are_ignored() {
        let rows = vec![
            vec![RawCell::Number(45000.0), RawCell::Number(1.0)],
            header(),
            vec![RawCell::Number(45292.0), RawCell::Number(2.0)],
        ];
        let map = ColumnMap {
            header_row: 1,
            ..columns()
        };

        let records = extract_records(&rows, &map, ymd(2030, 1, 1)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, ymd(2024, 1, 1));
    }

    #[test]
    fn test_future_rows_are_dropped() {
        let rows = vec![
            header(),
            vec![text("2024-01-01"), RawCell::Number(2.0)],
            vec![text("2099-01-01"), RawCell::Number(3.0)],
        ];

        let records = extract_records(&rows, &columns(), ymd(2024, 6, 1)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, ymd(2024, 1, 1));
    }

    #[test]
    fn test_no_valid_rows_is_fatal() {
        let rows = vec![header(), vec![text("bad"), text("bad")], vec![]];
        assert_eq!(
            extract_records(&rows, &columns(), ymd(2030, 1, 1)).unwrap_err(),
            IngestError::NoValidRows { header_row: 0 }
        );
    }

    #[test]
    fn test_latest_allowed_date_is_after_today() {
        let today = Utc::now().with_timezone(&Bogota).date_naive();
        assert_eq!(latest_allowed_date(0), today);
        assert!(latest_allowed_date(366) > today);
    }
}
