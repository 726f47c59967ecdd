//! Time zone boundary.
//!
//! The calendar only asks a zone for offsets: by UTC instant when computing
//! fields, and by wall-clock time when computing the instant of a set of
//! fields. Rule data itself comes from `chrono-tz`.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::{OffsetComponents, Tz};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};
use crate::models::{ONE_DAY, ONE_HOUR, ONE_MINUTE};

/// Standard (raw) offset and daylight saving amount, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneOffsets {
    pub raw: i32,
    pub dst: i32,
}

impl ZoneOffsets {
    pub fn total(&self) -> i64 {
        i64::from(self.raw) + i64::from(self.dst)
    }
}

/// Offset lookups a calendar needs from a time zone.
pub trait ZoneRules {
    fn id(&self) -> &str;

    /// Offsets in effect at a UTC instant.
    fn offsets_at_utc(&self, utc_millis: i64) -> ZoneOffsets;

    /// Offsets that apply to a local wall-clock time.
    ///
    /// An ambiguous wall time resolves to the earlier instant. A wall time
    /// skipped by a transition uses the offsets in effect before it.
    fn offsets_at_wall(&self, wall_millis: i64) -> ZoneOffsets {
        let before = self.offsets_at_utc(wall_millis.saturating_sub(ONE_DAY));
        let after = self.offsets_at_utc(wall_millis.saturating_add(ONE_DAY));
        let guess = self.offsets_at_utc(wall_millis.saturating_sub(before.total()));

        [before, after, guess]
            .into_iter()
            .filter(|c| self.offsets_at_utc(wall_millis.saturating_sub(c.total())) == *c)
            .max_by_key(|c| c.total())
            .unwrap_or(before)
    }
}

/// A fixed offset or an IANA zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Zone {
    Fixed { id: String, offset: i32 },
    Iana(Tz),
}

impl Zone {
    pub fn utc() -> Zone {
        Zone::Fixed {
            id: "UTC".to_string(),
            offset: 0,
        }
    }

    /// Fixed offset zone named like `UTC+05:30`.
    pub fn fixed(offset_millis: i32) -> Zone {
        if offset_millis == 0 {
            return Zone::utc();
        }
        let sign = if offset_millis < 0 { '-' } else { '+' };
        let abs = i64::from(offset_millis).abs();
        Zone::Fixed {
            id: format!(
                "UTC{}{:02}:{:02}",
                sign,
                abs / ONE_HOUR,
                (abs % ONE_HOUR) / ONE_MINUTE
            ),
            offset: offset_millis,
        }
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::utc()
    }
}

impl ZoneRules for Zone {
    fn id(&self) -> &str {
        match self {
            Zone::Fixed { id, .. } => id,
            Zone::Iana(tz) => tz.name(),
        }
    }

    fn offsets_at_utc(&self, utc_millis: i64) -> ZoneOffsets {
        match self {
            Zone::Fixed { offset, .. } => ZoneOffsets {
                raw: *offset,
                dst: 0,
            },
            Zone::Iana(tz) => {
                let clamped = utc_millis.clamp(
                    DateTime::<Utc>::MIN_UTC.timestamp_millis(),
                    DateTime::<Utc>::MAX_UTC.timestamp_millis(),
                );
                let Some(utc) = DateTime::from_timestamp_millis(clamped) else {
                    return ZoneOffsets::default();
                };
                let offset = *utc.with_timezone(tz).offset();
                ZoneOffsets {
                    raw: offset.base_utc_offset().num_milliseconds() as i32,
                    dst: offset.dst_offset().num_milliseconds() as i32,
                }
            }
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<Zone> for String {
    fn from(zone: Zone) -> String {
        zone.id().to_string()
    }
}

impl TryFrom<String> for Zone {
    type Error = CalendarError;

    fn try_from(id: String) -> Result<Zone> {
        parse_tz(&id)
    }
}

/// Parse a zone identifier.
///
/// Accepts `UTC`, `GMT`, `Z`, fixed offsets such as `+05:30`, `-0800` or
/// `GMT-03:00`, and IANA names such as `Europe/Berlin`.
///
/// # Arguments
///
/// * `name` - The zone identifier
///
/// # Returns
///
/// The parsed zone on success, or [`CalendarError::InvalidTimezone`].
///
/// # Examples
///
/// ```
/// use calfield_core::tz::{parse_tz, ZoneRules};
///
/// let tz = parse_tz("Europe/Berlin").unwrap();
/// assert_eq!(tz.id(), "Europe/Berlin");
///
/// let fixed = parse_tz("+05:30").unwrap();
/// assert_eq!(fixed.offsets_at_utc(0).raw, 19_800_000);
/// ```
pub fn parse_tz(name: &str) -> Result<Zone> {
    let trimmed = name.trim();
    let invalid = || CalendarError::InvalidTimezone(name.to_string());

    let rest = ["UTC", "GMT"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    if rest.is_empty() || trimmed == "Z" {
        return Ok(Zone::utc());
    }
    if rest.starts_with('+') || rest.starts_with('-') {
        return parse_offset(rest).map(Zone::fixed).ok_or_else(invalid);
    }
    trimmed.parse::<Tz>().map(Zone::Iana).map_err(|_| invalid())
}

/// Parse `+hh`, `+hhmm` or `+hh:mm` into milliseconds.
fn parse_offset(s: &str) -> Option<i32> {
    let (sign, digits) = match s.split_at(1) {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() > 2 => digits.split_at(digits.len() - 2),
        None => (digits, "0"),
    };
    if hours.is_empty() || !hours.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i64 = hours.parse().ok()?;
    let minutes: i64 = minutes.parse().ok()?;
    if hours > 18 || minutes > 59 {
        return None;
    }
    Some((sign * (hours * ONE_HOUR + minutes * ONE_MINUTE)) as i32)
}
