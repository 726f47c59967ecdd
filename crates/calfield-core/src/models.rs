//! Core data types for calfield.
//!
//! This module defines the primary types used throughout the library:
//! - [`Field`] - One of the 17 calendar fields
//! - [`FieldMask`] - A set of fields, used by resolution and computation
//! - [`FieldValues`] - A consistent snapshot of all computed fields
//! - [`CalendarState`] - The persisted form of a calendar
//!
//! It also holds the numeric constants for months, weekdays, eras and
//! time units that field values are expressed in.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

pub const BCE: i32 = 0;
pub const CE: i32 = 1;

pub const JANUARY: i32 = 0;
pub const FEBRUARY: i32 = 1;
pub const MARCH: i32 = 2;
pub const APRIL: i32 = 3;
pub const MAY: i32 = 4;
pub const JUNE: i32 = 5;
pub const JULY: i32 = 6;
pub const AUGUST: i32 = 7;
pub const SEPTEMBER: i32 = 8;
pub const OCTOBER: i32 = 9;
pub const NOVEMBER: i32 = 10;
pub const DECEMBER: i32 = 11;

pub const SUNDAY: i32 = 1;
pub const MONDAY: i32 = 2;
pub const TUESDAY: i32 = 3;
pub const WEDNESDAY: i32 = 4;
pub const THURSDAY: i32 = 5;
pub const FRIDAY: i32 = 6;
pub const SATURDAY: i32 = 7;

pub const AM: i32 = 0;
pub const PM: i32 = 1;

pub const ONE_SECOND: i64 = 1_000;
pub const ONE_MINUTE: i64 = 60 * ONE_SECOND;
pub const ONE_HOUR: i64 = 60 * ONE_MINUTE;
pub const ONE_DAY: i64 = 24 * ONE_HOUR;
pub const ONE_WEEK: i64 = 7 * ONE_DAY;

/// A calendar field.
///
/// The discriminant is the field's slot in the field array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Field {
    Era = 0,
    Year,
    Month,
    WeekOfYear,
    WeekOfMonth,
    DayOfMonth,
    DayOfYear,
    DayOfWeek,
    DayOfWeekInMonth,
    AmPm,
    Hour,
    HourOfDay,
    Minute,
    Second,
    Millisecond,
    ZoneOffset,
    DstOffset,
}

impl Field {
    /// Number of calendar fields.
    pub const COUNT: usize = 17;

    /// All fields in slot order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::Era,
        Field::Year,
        Field::Month,
        Field::WeekOfYear,
        Field::WeekOfMonth,
        Field::DayOfMonth,
        Field::DayOfYear,
        Field::DayOfWeek,
        Field::DayOfWeekInMonth,
        Field::AmPm,
        Field::Hour,
        Field::HourOfDay,
        Field::Minute,
        Field::Second,
        Field::Millisecond,
        Field::ZoneOffset,
        Field::DstOffset,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn mask(self) -> FieldMask {
        FieldMask(1 << self as u32)
    }

    /// Look up a field by its slot index.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::models::Field;
    ///
    /// assert_eq!(Field::from_index(5).unwrap(), Field::DayOfMonth);
    /// assert!(Field::from_index(17).is_err());
    /// ```
    pub fn from_index(index: i32) -> Result<Field> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Field::ALL.get(i).copied())
            .ok_or(CalendarError::InvalidFieldIndex(index))
    }

    /// Upper-case field name, e.g. `DAY_OF_MONTH`.
    pub const fn name(self) -> &'static str {
        match self {
            Field::Era => "ERA",
            Field::Year => "YEAR",
            Field::Month => "MONTH",
            Field::WeekOfYear => "WEEK_OF_YEAR",
            Field::WeekOfMonth => "WEEK_OF_MONTH",
            Field::DayOfMonth => "DAY_OF_MONTH",
            Field::DayOfYear => "DAY_OF_YEAR",
            Field::DayOfWeek => "DAY_OF_WEEK",
            Field::DayOfWeekInMonth => "DAY_OF_WEEK_IN_MONTH",
            Field::AmPm => "AM_PM",
            Field::Hour => "HOUR",
            Field::HourOfDay => "HOUR_OF_DAY",
            Field::Minute => "MINUTE",
            Field::Second => "SECOND",
            Field::Millisecond => "MILLISECOND",
            Field::ZoneOffset => "ZONE_OFFSET",
            Field::DstOffset => "DST_OFFSET",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for Field {
    type Error = CalendarError;

    fn try_from(index: i32) -> Result<Self> {
        Field::from_index(index)
    }
}

impl FromStr for Field {
    type Err = CalendarError;

    /// Accepts `DAY_OF_MONTH`, `day_of_month` and `day-of-month`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name() == normalized)
            .ok_or_else(|| CalendarError::UnknownField(s.to_string()))
    }
}

/// A bit set of [`Field`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldMask(u32);

impl FieldMask {
    pub const EMPTY: FieldMask = FieldMask(0);
    pub const ALL: FieldMask = FieldMask((1 << Field::COUNT) - 1);

    pub const ZONE: FieldMask = FieldMask(
        Field::ZoneOffset.mask().bits() | Field::DstOffset.mask().bits(),
    );

    pub const TIME_OF_DAY: FieldMask = FieldMask(
        Field::AmPm.mask().bits()
            | Field::Hour.mask().bits()
            | Field::HourOfDay.mask().bits()
            | Field::Minute.mask().bits()
            | Field::Second.mask().bits()
            | Field::Millisecond.mask().bits(),
    );

    pub const MONTH_DAY: FieldMask = FieldMask(
        Field::Month.mask().bits()
            | Field::DayOfMonth.mask().bits()
            | Field::DayOfWeek.mask().bits(),
    );

    pub const WEEKS: FieldMask = FieldMask(
        Field::DayOfYear.mask().bits()
            | Field::WeekOfYear.mask().bits()
            | Field::WeekOfMonth.mask().bits()
            | Field::DayOfWeekInMonth.mask().bits(),
    );

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, field: Field) -> bool {
        self.0 & field.mask().0 != 0
    }

    /// True when at least one field of `other` is in `self`.
    pub const fn intersects(self, other: FieldMask) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn with(self, field: Field) -> FieldMask {
        FieldMask(self.0 | field.mask().0)
    }

    pub fn fields(self) -> impl Iterator<Item = Field> {
        Field::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl BitOr for FieldMask {
    type Output = FieldMask;

    fn bitor(self, rhs: FieldMask) -> FieldMask {
        FieldMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for FieldMask {
    fn bitor_assign(&mut self, rhs: FieldMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FieldMask {
    type Output = FieldMask;

    fn bitand(self, rhs: FieldMask) -> FieldMask {
        FieldMask(self.0 & rhs.0)
    }
}

impl Not for FieldMask {
    type Output = FieldMask;

    fn not(self) -> FieldMask {
        FieldMask(!self.0 & FieldMask::ALL.0)
    }
}

impl From<Field> for FieldMask {
    fn from(field: Field) -> Self {
        field.mask()
    }
}

/// A consistent snapshot of all calendar fields, as read by formatters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValues {
    pub era: i32,
    pub year: i32,
    pub month: i32,
    pub week_of_year: i32,
    pub week_of_month: i32,
    pub day_of_month: i32,
    pub day_of_year: i32,
    pub day_of_week: i32,
    pub day_of_week_in_month: i32,
    pub am_pm: i32,
    pub hour: i32,
    pub hour_of_day: i32,
    pub minute: i32,
    pub second: i32,
    pub millisecond: i32,
    pub zone_offset: i32,
    pub dst_offset: i32,
}

impl FieldValues {
    pub(crate) fn from_array(v: &[i32; Field::COUNT]) -> Self {
        FieldValues {
            era: v[0],
            year: v[1],
            month: v[2],
            week_of_year: v[3],
            week_of_month: v[4],
            day_of_month: v[5],
            day_of_year: v[6],
            day_of_week: v[7],
            day_of_week_in_month: v[8],
            am_pm: v[9],
            hour: v[10],
            hour_of_day: v[11],
            minute: v[12],
            second: v[13],
            millisecond: v[14],
            zone_offset: v[15],
            dst_offset: v[16],
        }
    }

    pub fn get(&self, field: Field) -> i32 {
        match field {
            Field::Era => self.era,
            Field::Year => self.year,
            Field::Month => self.month,
            Field::WeekOfYear => self.week_of_year,
            Field::WeekOfMonth => self.week_of_month,
            Field::DayOfMonth => self.day_of_month,
            Field::DayOfYear => self.day_of_year,
            Field::DayOfWeek => self.day_of_week,
            Field::DayOfWeekInMonth => self.day_of_week_in_month,
            Field::AmPm => self.am_pm,
            Field::Hour => self.hour,
            Field::HourOfDay => self.hour_of_day,
            Field::Minute => self.minute,
            Field::Second => self.second,
            Field::Millisecond => self.millisecond,
            Field::ZoneOffset => self.zone_offset,
            Field::DstOffset => self.dst_offset,
        }
    }
}

/// Current version of [`CalendarState`].
pub const STATE_VERSION: u32 = 1;

/// The persisted form of a calendar.
///
/// Stamps are not part of the persisted form. On load every set field is
/// treated as internally computed. Version 0 payloads carry no set flags;
/// those are rebuilt from `are_fields_set`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarState {
    #[serde(default)]
    pub version: u32,
    pub fields: [i32; Field::COUNT],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_set: Option<[bool; Field::COUNT]>,
    pub time: i64,
    pub is_time_set: bool,
    pub are_fields_set: bool,
    pub lenient: bool,
    pub first_day_of_week: i32,
    pub minimal_days_in_first_week: i32,
    pub zone: String,
    pub system: crate::calendar::CalendarSystem,
}
