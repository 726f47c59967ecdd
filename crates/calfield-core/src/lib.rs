//! # calfield-core
//!
//! A field-based calendar engine for Rust.
//!
//! A [`Calendar`] converts between an absolute instant (milliseconds since
//! the Unix epoch) and 17 broken-down fields: era, year, month, week, day,
//! time of day and zone offsets. Fields can be set in any combination and
//! the most recently set group decides how the date is resolved.
//!
//! ## Features
//!
//! - **Lazy resolution**: setting fields is cheap; the instant is computed
//!   on the next read, and fields are recomputed from the instant after that.
//! - **Lenient or strict**: out-of-range values roll over, or are rejected
//!   when the calendar is strict.
//! - **Three calendar systems**: proleptic Gregorian, hybrid Julian/Gregorian
//!   with a configurable cutover, and Japanese imperial eras.
//! - **Field arithmetic**: `add` carries into larger fields, `roll` wraps
//!   within the current range, both respecting cutover and era boundaries.
//! - **IANA Timezones**: zone and DST offsets via chrono-tz.
//!
//! ## Example
//!
//! ```rust
//! use calfield_core::prelude::*;
//!
//! let mut cal = Calendar::gregorian().with_zone(parse_tz("Europe/Berlin").unwrap());
//! cal.set_date(2024, JANUARY, 31);
//!
//! // Adding a month pins the day to the end of February.
//! cal.add(Field::Month, 1).unwrap();
//! assert_eq!(cal.get(Field::Month).unwrap(), FEBRUARY);
//! assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 29);
//! assert_eq!(cal.get(Field::DayOfWeek).unwrap(), THURSDAY);
//! ```

pub mod arith;
pub mod calendar;
pub mod compute;
pub mod config;
pub mod cutover;
pub mod era;
pub mod error;
pub mod fixed_date;
pub mod limits;
pub mod models;
pub mod parse;
pub mod resolver;
pub mod store;
pub mod tz;
pub mod week;

// Re-export commonly used types at the crate root
pub use arith::rolled_value;
pub use calendar::{Calendar, CalendarSystem};
pub use config::{CalendarConfig, SystemKind};
pub use cutover::Cutover;
pub use era::{Era, EraTable};
pub use error::{CalendarError, Result};
pub use models::{CalendarState, Field, FieldMask, FieldValues};
pub use parse::{TimestampFormat, parse_assignment, parse_timestamp, parse_timestamp_auto};
pub use tz::{Zone, ZoneRules, parse_tz};
pub use week::WeekRules;

/// Prelude module for convenient imports.
///
/// ```
/// use calfield_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::calendar::{Calendar, CalendarSystem};
    pub use crate::config::{CalendarConfig, SystemKind};
    pub use crate::cutover::Cutover;
    pub use crate::era::EraTable;
    pub use crate::error::{CalendarError, Result};
    pub use crate::models::*;
    pub use crate::parse::{TimestampFormat, parse_assignment, parse_timestamp, parse_timestamp_auto};
    pub use crate::tz::{Zone, ZoneRules, parse_tz};
    pub use crate::week::WeekRules;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn full_workflow_resolve_and_step() {
        let start = parse_timestamp("2024-03-10T07:30:00Z", TimestampFormat::Rfc3339).unwrap();
        let mut cal = Calendar::hybrid()
            .with_zone(parse_tz("America/New_York").unwrap())
            .at(start);

        assert_eq!(cal.get(Field::HourOfDay).unwrap(), 3);
        assert_eq!(cal.get(Field::DstOffset).unwrap(), 3_600_000);

        cal.add(Field::DayOfMonth, -1).unwrap();
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 9);
        assert_eq!(cal.get(Field::HourOfDay).unwrap(), 3);
        assert_eq!(cal.get(Field::DstOffset).unwrap(), 0);
    }

    #[test]
    fn config_workflow() {
        let config = CalendarConfig::from_json(r#"{"system": "japanese", "zone": "Asia/Tokyo"}"#)
            .unwrap();
        let mut cal = Calendar::from_config(&config).unwrap();
        cal.set_time_in_millis(parse_timestamp_auto("2019-05-01T00:00:00+09:00").unwrap());
        assert_eq!(cal.get(Field::Era).unwrap(), 5);
        assert_eq!(cal.get(Field::Year).unwrap(), 1);
    }

    #[test]
    fn assignments_drive_resolution() {
        let mut cal = Calendar::gregorian().at(0);
        for text in ["YEAR=2024", "MONTH=1", "DAY_OF_MONTH=30"] {
            let (field, value) = parse_assignment(text).unwrap();
            cal.set(field, value);
        }
        assert_eq!(cal.get(Field::Month).unwrap(), MARCH);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 1);
    }
}
