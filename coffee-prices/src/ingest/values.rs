//! Cell normalisation for the federation's spreadsheet
//!
//! The sheet mixes native date cells, day-first text dates and bare serial
//! numbers in the date column, and both numeric cells and Colombian-formatted
//! text ("277.000", "1.234,5") in the price column.

use calamine::Data;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Utc};

use super::error::ValueError;
use super::types::Price;

/// Date-only text layouts, tried in order after RFC 3339
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Date-time text layouts; only the calendar date is kept
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Earliest year accepted from text; shorter years are two-digit shorthand
/// that chrono's `%Y` would otherwise read literally
const MIN_TEXT_YEAR: i32 = 1900;

/// Serial of the fictitious 1900-02-29 in the 1900 date system
const PHANTOM_LEAP_DAY: i64 = 60;

/// An untyped cell as read from the sheet
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Date-typed cell already resolved by the decoder
    Date(NaiveDate),
    /// Date-typed cell the decoder could not resolve; raw day serial
    Serial(f64),
}

impl RawCell {
    /// Empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text content, if this is a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawCell::Text(s) => Some(s),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RawCell::Empty => "empty",
            RawCell::Bool(_) => "boolean",
            RawCell::Number(_) => "number",
            RawCell::Text(_) => "text",
            RawCell::Date(_) => "date",
            RawCell::Serial(_) => "date serial",
        }
    }
}

impl From<&Data> for RawCell {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => RawCell::Empty,
            Data::String(s) => RawCell::Text(s.clone()),
            Data::Int(i) => RawCell::Number(*i as f64),
            Data::Float(f) => RawCell::Number(*f),
            Data::Bool(b) => RawCell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(ndt) => RawCell::Date(ndt.date()),
                None => RawCell::Serial(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        }
    }
}

/// Parse a price cell
///
/// Numbers are taken as-is. Text uses the thousands-dot / decimal-comma
/// convention: every `.` is dropped, then `,` becomes the decimal point.
/// A leading `$` is tolerated.
pub fn parse_price(cell: &RawCell) -> Result<Price, ValueError> {
    let value = match cell {
        RawCell::Number(n) => *n,
        RawCell::Text(s) => parse_colombian_number(s)?,
        other => return Err(ValueError::UnsupportedCell(other.kind())),
    };

    Price::new(value).ok_or_else(|| ValueError::NonPositivePrice(value.to_string()))
}

fn parse_colombian_number(raw: &str) -> Result<f64, ValueError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    let normalized = trimmed.replace('.', "").replace(',', ".");

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValueError::InvalidNumber(raw.to_string()))
}

/// Parse a date cell
///
/// Shapes are handled in this order: native date, text, numeric serial.
pub fn parse_date(cell: &RawCell) -> Result<NaiveDate, ValueError> {
    match cell {
        RawCell::Date(date) => Ok(*date),
        RawCell::Text(s) => parse_date_text(s),
        RawCell::Number(serial) | RawCell::Serial(serial) => {
            serial_to_date(*serial).ok_or_else(|| ValueError::InvalidDate(serial.to_string()))
        }
        other => Err(ValueError::UnsupportedCell(other.kind())),
    }
}

fn parse_date_text(raw: &str) -> Result<NaiveDate, ValueError> {
    let s = raw.trim();

    // Instants with an offset resolve to their UTC calendar day
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }

    let plausible = |date: &NaiveDate| date.year() >= MIN_TEXT_YEAR;

    for fmt in DATE_FORMATS {
        if let Some(date) = NaiveDate::parse_from_str(s, fmt).ok().filter(plausible) {
            return Ok(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Some(date) = NaiveDateTime::parse_from_str(s, fmt)
            .ok()
            .map(|dt| dt.date())
            .filter(plausible)
        {
            return Ok(date);
        }
    }

    Err(ValueError::InvalidDate(raw.to_string()))
}

/// Convert a 1900-system spreadsheet serial to a calendar date
///
/// Serial 1 is 1900-01-01. Serial 60 is the non-existent 1900-02-29 that
/// spreadsheet software keeps for compatibility, so it is rejected and every
/// later serial is shifted back by one day. The fractional time part is
/// ignored.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }

    let days = serial.trunc() as i64;
    let epoch = match days.cmp(&PHANTOM_LEAP_DAY) {
        std::cmp::Ordering::Less => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        std::cmp::Ordering::Equal => return None,
        std::cmp::Ordering::Greater => NaiveDate::from_ymd_opt(1899, 12, 30)?,
    };

    epoch.checked_add_days(Days::new(u64::try_from(days).ok()?))
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

    #[test]
    fn test_parse_price_colombian_text() {
        assert_eq!(parse_price(&text("277.000")).unwrap().value(), 277_000.0);
        assert_eq!(parse_price(&text("1,5")).unwrap().value(), 1.5);
        assert_eq!(parse_price(&text("2.150.000,50")).unwrap().value(), 2_150_000.5);
        assert_eq!(parse_price(&text(" $ 2.150.000 ")).unwrap().value(), 2_150_000.0);
    }

    #[test]
    fn test_parse_price_numeric_cell() {
        assert_eq!(parse_price(&RawCell::Number(251_500.0)).unwrap().value(), 251_500.0);
    }

    #[test]
    fn test_parse_price_failures() {
        assert_eq!(
            parse_price(&text("abc")),
            Err(ValueError::InvalidNumber("abc".to_string()))
        );
        assert!(matches!(
            parse_price(&RawCell::Number(0.0)),
            Err(ValueError::NonPositivePrice(_))
        ));
        assert!(matches!(
            parse_price(&text("-5")),
            Err(ValueError::NonPositivePrice(_))
        ));
        assert_eq!(
            parse_price(&RawCell::Bool(true)),
            Err(ValueError::UnsupportedCell("boolean"))
        );
        assert!(parse_price(&RawCell::Date(ymd(2024, 1, 1))).is_err());
    }

    #[test]
    fn test_parse_date_shapes_agree() {
        let native = parse_date(&RawCell::Date(ymd(2024, 1, 1))).unwrap();
        let iso = parse_date(&text("2024-01-01")).unwrap();
        let serial = parse_date(&RawCell::Number(45292.0)).unwrap();
        let unresolved = parse_date(&RawCell::Serial(45292.75)).unwrap();

        assert_eq!(native.to_string(), "2024-01-01");
        assert_eq!(iso, native);
        assert_eq!(serial, native);
        assert_eq!(unresolved, native);
    }

    #[test]
    fn test_parse_date_text_layouts() {
        assert_eq!(parse_date(&text("02/01/2024")).unwrap(), ymd(2024, 1, 2));
        assert_eq!(parse_date(&text("2-1-2024")).unwrap(), ymd(2024, 1, 2));
        assert_eq!(parse_date(&text("2024/01/02")).unwrap(), ymd(2024, 1, 2));
        assert_eq!(parse_date(&text("2024-01-02 00:00:00")).unwrap(), ymd(2024, 1, 2));
        assert_eq!(parse_date(&text("2024-01-02T08:30:00")).unwrap(), ymd(2024, 1, 2));
        // 23:00 in Bogotá is already the next day in UTC
        assert_eq!(
            parse_date(&text("2024-01-01T23:00:00-05:00")).unwrap(),
            ymd(2024, 1, 2)
        );
    }

    #[test]
    fn test_parse_date_failures() {
        assert!(parse_date(&text("bad")).is_err());
        assert!(parse_date(&text("31/02/2024")).is_err());
        assert!(parse_date(&RawCell::Empty).is_err());
        assert!(parse_date(&RawCell::Bool(false)).is_err());
        assert!(parse_date(&RawCell::Number(-3.0)).is_err());
    }

    #[test]
    fn test_parse_date_rejects_two_digit_years() {
        assert!(parse_date(&text("15/01/24")).is_err());
        assert!(parse_date(&text("01-02-24")).is_err());
        assert!(parse_date(&text("24-01-15")).is_err());
        assert!(parse_date(&text("0015-01-24 00:00:00")).is_err());
        assert_eq!(parse_date(&text("15/01/2024")).unwrap(), ymd(2024, 1, 15));
    }

    #[test]
    fn test_serial_to_date_1900_system() {
        assert_eq!(serial_to_date(1.0), Some(ymd(1900, 1, 1)));
        assert_eq!(serial_to_date(59.0), Some(ymd(1900, 2, 28)));
        assert_eq!(serial_to_date(60.0), None);
        assert_eq!(serial_to_date(61.0), Some(ymd(1900, 3, 1)));
        assert_eq!(serial_to_date(45658.0), Some(ymd(2025, 1, 1)));
        assert_eq!(serial_to_date(0.5), None);
        assert_eq!(serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_raw_cell_from_calamine_data() {
        assert_eq!(RawCell::from(&Data::Empty), RawCell::Empty);
        assert_eq!(RawCell::from(&Data::Int(7)), RawCell::Number(7.0));
        assert_eq!(
            RawCell::from(&Data::String("Fecha".to_string())),
            text("Fecha")
        );
        assert_eq!(
            RawCell::from(&Data::DateTimeIso("2024-01-01".to_string())),
            text("2024-01-01")
        );
    }

    #[test]
    fn test_is_blank() {
        assert!(RawCell::Empty.is_blank());
        assert!(text("   ").is_blank());
        assert!(!text("0").is_blank());
        assert!(!RawCell::Number(0.0).is_blank());
    }
}
