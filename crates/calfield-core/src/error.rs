//! Error types for calfield-core.
//!
//! Every error surfaces synchronously from the call that triggered it;
//! nothing is retried. Lenient calendars never produce
//! [`CalendarError::NonLenientFieldMismatch`].

use thiserror::Error;

use crate::models::Field;

/// The main error type for calendar operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// Field index outside the 17-field range.
    #[error("Invalid field index: {0}")]
    InvalidFieldIndex(i32),

    /// Field name that does not match any calendar field.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Value outside the absolute range of a field.
    #[error("Invalid value {value} for {field}")]
    InvalidFieldValue { field: Field, value: i32 },

    /// Strict recomputation changed a caller-supplied field.
    #[error("{field}: {expected} -> {actual}")]
    NonLenientFieldMismatch {
        field: Field,
        expected: i32,
        actual: i32,
    },

    /// Strict resolution landed in the days skipped by a calendar cutover.
    #[error("Nonexistent date: {0}")]
    NonexistentDate(String),

    /// Week-date operation on a calendar system without week dates.
    #[error("Week dates are not supported by the {0} calendar")]
    UnsupportedWeekDate(String),

    /// Operation that the active calendar system does not provide.
    #[error("{operation} is not supported by the {calendar} calendar")]
    UnsupportedOperation {
        operation: &'static str,
        calendar: String,
    },

    /// Era table that is empty or not strictly ordered.
    #[error("Invalid era table: {0}")]
    InvalidEraTable(String),

    /// Invalid time zone identifier.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Time value that cannot be represented as a UTC date-time.
    #[error("Instant out of range: {0}")]
    InstantOutOfRange(i64),

    /// Error parsing a timestamp or field assignment.
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type alias for calendar operations.
pub type Result<T> = std::result::Result<T, CalendarError>;
