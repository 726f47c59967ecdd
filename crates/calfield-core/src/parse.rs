//! Input parsing for instants and field assignments.
//!
//! Instants are returned as epoch milliseconds, the calendar's native time
//! value. Supported timestamp formats:
//! - `epoch_ms`: Unix epoch milliseconds (default)
//! - `epoch_s`: Unix epoch seconds
//! - `rfc3339`: RFC3339 formatted strings (e.g., `2024-03-10T07:30:00Z`)

use chrono::DateTime;
use std::str::FromStr;

use crate::error::{CalendarError, Result};
use crate::models::Field;

/// Supported timestamp formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// Unix epoch milliseconds (e.g., "1710055800000")
    #[default]
    EpochMs,
    /// Unix epoch seconds (e.g., "1710055800")
    EpochS,
    /// RFC3339 format (e.g., "2024-03-10T07:30:00Z" or "2024-03-10T08:30:00+01:00")
    Rfc3339,
}

impl std::fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampFormat::EpochMs => write!(f, "epoch_ms"),
            TimestampFormat::EpochS => write!(f, "epoch_s"),
            TimestampFormat::Rfc3339 => write!(f, "rfc3339"),
        }
    }
}

impl FromStr for TimestampFormat {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "epoch_ms" => Ok(TimestampFormat::EpochMs),
            "epoch_s" => Ok(TimestampFormat::EpochS),
            "rfc3339" => Ok(TimestampFormat::Rfc3339),
            _ => Err(CalendarError::ParseError(format!(
                "Unknown format: '{}'. Expected 'epoch_ms', 'epoch_s', or 'rfc3339'",
                s
            ))),
        }
    }
}

/// Parse a timestamp string into epoch milliseconds.
///
/// Epoch inputs are not limited to chrono's date range; any `i64` millisecond
/// value is accepted.
///
/// # Arguments
///
/// * `input` - The timestamp string to parse
/// * `format` - The format to use for parsing
///
/// # Returns
///
/// Milliseconds since 1970-01-01T00:00:00Z, or an error if parsing fails.
///
/// # Examples
///
/// ```
/// use calfield_core::parse::{parse_timestamp, TimestampFormat};
///
/// let ms = parse_timestamp("1710055800000", TimestampFormat::EpochMs).unwrap();
/// assert_eq!(ms, 1_710_055_800_000);
///
/// let ms = parse_timestamp("2024-03-10T07:30:00Z", TimestampFormat::Rfc3339).unwrap();
/// assert_eq!(ms, 1_710_055_800_000);
/// ```
pub fn parse_timestamp(input: &str, format: TimestampFormat) -> Result<i64> {
    let trimmed = input.trim();

    match format {
        TimestampFormat::EpochMs => parse_epoch_ms(trimmed),
        TimestampFormat::EpochS => parse_epoch_s(trimmed),
        TimestampFormat::Rfc3339 => parse_rfc3339(trimmed),
    }
}

fn parse_epoch_ms(input: &str) -> Result<i64> {
    input.parse().map_err(|_| {
        CalendarError::ParseError(format!(
            "Invalid epoch milliseconds: '{}'. Expected integer value.",
            input
        ))
    })
}

fn parse_epoch_s(input: &str) -> Result<i64> {
    let s: i64 = input.parse().map_err(|_| {
        CalendarError::ParseError(format!(
            "Invalid epoch seconds: '{}'. Expected integer value.",
            input
        ))
    })?;

    s.checked_mul(1000)
        .ok_or_else(|| CalendarError::ParseError(format!("Epoch seconds out of range: {}", s)))
}

/// Parse RFC3339 formatted timestamp.
///
/// Supports formats like:
/// - `2024-03-10T07:30:00Z`
/// - `2024-03-10T08:30:00+01:00`
/// - `2024-03-10T02:30:00.250-05:00`
fn parse_rfc3339(input: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| {
            CalendarError::ParseError(format!(
                "Invalid RFC3339 timestamp: '{}'. Error: {}",
                input, e
            ))
        })
}

/// Parse a timestamp string, auto-detecting the format.
///
/// This function attempts to parse the input in the following order:
/// 1. RFC3339 (if it contains 'T' or 'Z' or an offset)
/// 2. Epoch milliseconds (if the magnitude exceeds 10^10)
/// 3. Epoch seconds
pub fn parse_timestamp_auto(input: &str) -> Result<i64> {
    let trimmed = input.trim();

    if trimmed.contains('T')
        || trimmed.contains('Z')
        || trimmed.contains('+')
        || (trimmed.len() > 6 && trimmed.chars().nth(trimmed.len() - 6) == Some('-'))
    {
        return parse_rfc3339(trimmed);
    }

    if let Ok(num) = trimmed.parse::<i64>() {
        if num.unsigned_abs() > 10_000_000_000 {
            return Ok(num);
        } else {
            return parse_epoch_s(trimmed);
        }
    }

    Err(CalendarError::ParseError(format!(
        "Could not auto-detect format for: '{}'",
        input
    )))
}

/// Parse a `FIELD=VALUE` assignment such as `DAY_OF_MONTH=30`.
///
/// Field names are matched case-insensitively and may use `-` in place of
/// `_`.
///
/// # Examples
///
/// ```
/// use calfield_core::models::Field;
/// use calfield_core::parse::parse_assignment;
///
/// assert_eq!(parse_assignment("month=1").unwrap(), (Field::Month, 1));
/// assert_eq!(parse_assignment("DAY_OF_WEEK_IN_MONTH=-1").unwrap(), (Field::DayOfWeekInMonth, -1));
/// ```
pub fn parse_assignment(input: &str) -> Result<(Field, i32)> {
    let (name, value) = input.split_once('=').ok_or_else(|| {
        CalendarError::ParseError(format!(
            "Invalid assignment: '{}'. Expected FIELD=VALUE",
            input
        ))
    })?;
    let field: Field = name.parse()?;
    let value = value.trim().parse::<i32>().map_err(|_| {
        CalendarError::ParseError(format!(
            "Invalid value for {}: '{}'. Expected integer value.",
            field,
            value.trim()
        ))
    })?;
    Ok((field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAR_10_0730Z: i64 = 1_710_055_800_000;

    #[test]
    fn parse_epoch_milliseconds() {
        let ms = parse_timestamp("1710055800000", TimestampFormat::EpochMs).unwrap();
        assert_eq!(ms, MAR_10_0730Z);
        let far = parse_timestamp("-62135769600000", TimestampFormat::EpochMs).unwrap();
        assert_eq!(far, -62_135_769_600_000);
    }

    #[test]
    fn parse_epoch_seconds() {
        let ms = parse_timestamp("1710055800", TimestampFormat::EpochS).unwrap();
        assert_eq!(ms, MAR_10_0730Z);
        assert!(parse_timestamp(&i64::MAX.to_string(), TimestampFormat::EpochS).is_err());
    }

    #[test]
    fn parse_rfc3339_zulu() {
        let ms = parse_timestamp("2024-03-10T07:30:00Z", TimestampFormat::Rfc3339).unwrap();
        assert_eq!(ms, MAR_10_0730Z);
    }

    #[test]
    fn parse_rfc3339_with_offset() {
        let ms = parse_timestamp("2024-03-10T08:30:00.250+01:00", TimestampFormat::Rfc3339)
            .unwrap();
        assert_eq!(ms, MAR_10_0730Z + 250);
    }

    #[test]
    fn parse_invalid_inputs() {
        assert!(parse_timestamp("not-a-number", TimestampFormat::EpochMs).is_err());
        assert!(parse_timestamp("not-a-date", TimestampFormat::Rfc3339).is_err());
    }

    #[test]
    fn format_from_str() {
        assert_eq!(
            TimestampFormat::from_str("epoch_ms").unwrap(),
            TimestampFormat::EpochMs
        );
        assert_eq!(
            TimestampFormat::from_str("RFC3339").unwrap(),
            TimestampFormat::Rfc3339
        );
        assert!(TimestampFormat::from_str("invalid").is_err());
        assert_eq!(TimestampFormat::EpochS.to_string(), "epoch_s");
    }

    #[test]
    fn auto_detect() {
        assert_eq!(
            parse_timestamp_auto("2024-03-10T07:30:00Z").unwrap(),
            MAR_10_0730Z
        );
        assert_eq!(parse_timestamp_auto("1710055800000").unwrap(), MAR_10_0730Z);
        assert_eq!(parse_timestamp_auto("1710055800").unwrap(), MAR_10_0730Z);
        assert!(parse_timestamp_auto("yesterday").is_err());
    }

    #[test]
    fn assignments() {
        assert_eq!(
            parse_assignment("day-of-month = 30").unwrap(),
            (Field::DayOfMonth, 30)
        );
        assert!(matches!(
            parse_assignment("FORTNIGHT=2"),
            Err(CalendarError::UnknownField(_))
        ));
        assert!(matches!(
            parse_assignment("YEAR"),
            Err(CalendarError::ParseError(_))
        ));
        assert!(matches!(
            parse_assignment("YEAR=two"),
            Err(CalendarError::ParseError(_))
        ));
    }
}
