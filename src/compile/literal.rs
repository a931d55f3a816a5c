//! Literal parsing and rendering.
//!
//! Designers type operands as free text. Numbers are validated and emitted
//! unquoted; strings are quoted; dates and times are parsed from a range of
//! human formats and emitted as canonical digit strings that compare
//! correctly against `format-date` output.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use thiserror::Error;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("integer pattern is valid"));
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(\d+(\.\d*)?|\.\d+)$").expect("decimal pattern is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,]+").expect("whitespace pattern is valid"));

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d %Y", "%B %d %Y", "%d %b %Y", "%d %B %Y",
];

const TIME_FORMATS: &[&str] = &[
    "%H:%M", "%H:%M:%S", "%I:%M%p", "%I:%M %p", "%I:%M:%S%p", "%I:%M:%S %p",
];

/// A literal that does not parse as the question's type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LiteralError {
    /// Not a whole number.
    #[error("'{0}' is not an integer")]
    Integer(String),
    /// Not a decimal number.
    #[error("'{0}' is not a decimal number")]
    Decimal(String),
    /// Not a recognisable date.
    #[error("'{0}' is not a recognisable date")]
    Date(String),
    /// Not a recognisable time.
    #[error("'{0}' is not a recognisable time")]
    Time(String),
    /// Not a recognisable date and time.
    #[error("'{0}' is not a recognisable date and time")]
    Datetime(String),
}

/// Validates an integer literal and returns it without surrounding space.
///
/// # Errors
///
/// Returns [`LiteralError::Integer`] if the input is not a whole number.
pub fn integer(raw: &str) -> Result<String, LiteralError> {
    let trimmed = raw.trim();
    if INTEGER.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(LiteralError::Integer(raw.to_string()))
    }
}

/// Validates a decimal literal and returns it without surrounding space.
///
/// Exponent notation is rejected because the target language cannot read
/// it.
///
/// # Errors
///
/// Returns [`LiteralError::Decimal`] if the input is not a plain decimal.
pub fn decimal(raw: &str) -> Result<String, LiteralError> {
    let trimmed = raw.trim();
    if DECIMAL.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(LiteralError::Decimal(raw.to_string()))
    }
}

/// Quotes a string literal.
///
/// String literals have no escapes. Text containing `'` is delimited with
/// `"` instead, and text containing both quote characters is spliced
/// together with `concat`.
#[must_use]
pub fn string(raw: &str) -> String {
    if !raw.contains('\'') {
        return format!("'{raw}'");
    }
    if !raw.contains('"') {
        return format!("\"{raw}\"");
    }
    let pieces: Vec<_> = raw.split('\'').map(|piece| format!("'{piece}'")).collect();
    format!("concat({})", pieces.join(", \"'\", "))
}

fn normalize(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Parses a date typed by a person.
///
/// # Errors
///
/// Returns [`LiteralError::Date`] if no supported format matches.
pub fn date(raw: &str) -> Result<NaiveDate, LiteralError> {
    let text = normalize(raw);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&text, format).ok())
        .ok_or_else(|| LiteralError::Date(raw.to_string()))
}

/// Parses a time of day typed by a person.
///
/// # Errors
///
/// Returns [`LiteralError::Time`] if no supported format matches.
pub fn time(raw: &str) -> Result<NaiveTime, LiteralError> {
    let text = normalize(raw);
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&text, format).ok())
        .ok_or_else(|| LiteralError::Time(raw.to_string()))
}

/// Parses a date and time typed by a person.
///
/// RFC 3339 timestamps keep their local wall-clock time. A date on its own
/// is read as midnight.
///
/// # Errors
///
/// Returns [`LiteralError::Datetime`] if no supported format matches.
pub fn datetime(raw: &str) -> Result<NaiveDateTime, LiteralError> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(stamp.naive_local());
    }

    let text = normalize(raw).replacen('T', " ", 1);
    for date_format in DATE_FORMATS {
        for time_format in TIME_FORMATS {
            let format = format!("{date_format} {time_format}");
            if let Ok(parsed) = NaiveDateTime::parse_from_str(&text, &format) {
                return Ok(parsed);
            }
        }
    }

    date(raw)
        .map(|day| day.and_time(NaiveTime::MIN))
        .map_err(|_| LiteralError::Datetime(raw.to_string()))
}

/// Renders a date as `'YYYYMMDD'`.
#[must_use]
pub fn date_key(value: NaiveDate) -> String {
    format!("'{}'", value.format("%Y%m%d"))
}

/// Renders a time as `'HHMM'`.
#[must_use]
pub fn time_key(value: NaiveTime) -> String {
    format!("'{}'", value.format("%H%M"))
}

/// Renders a date and time as `'YYYYMMDDHHMM'`.
#[must_use]
pub fn datetime_key(value: NaiveDateTime) -> String {
    format!("'{}'", value.format("%Y%m%d%H%M"))
}
