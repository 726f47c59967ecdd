//! Fixed-date arithmetic for the proleptic Gregorian and Julian systems.
//!
//! A fixed date is a day number on a single shared epoch: fixed date 1 is
//! January 1 of year 1 in the proleptic Gregorian calendar. Years are
//! normalized (astronomical), so year 0 is 1 BCE. Months are 1-based here;
//! the calendar field layer converts to 0-based MONTH values.
//!
//! Every function in this module is pure.

use serde::{Deserialize, Serialize};

use crate::models::ONE_DAY;

/// Fixed date of 1970-01-01.
pub const EPOCH_OFFSET: i64 = 719_163;

const ACCUMULATED_DAYS: [i64; 13] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];
const ACCUMULATED_DAYS_LEAP: [i64; 13] =
    [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335, 366];

/// The two date systems a hybrid calendar switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateSystem {
    Gregorian,
    Julian,
}

/// A normalized year, 1-based month and day of month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    pub const fn new(year: i32, month: u32, day: u32) -> Self {
        CalendarDate { year, month, day }
    }
}

pub fn is_gregorian_leap_year(year: i64) -> bool {
    year.rem_euclid(4) == 0 && (year.rem_euclid(100) != 0 || year.rem_euclid(400) == 0)
}

pub fn is_julian_leap_year(year: i64) -> bool {
    year.rem_euclid(4) == 0
}

/// Day of week of a fixed date, 1 (Sunday) through 7 (Saturday).
///
/// # Examples
///
/// ```
/// use calfield_core::fixed_date::day_of_week;
/// use calfield_core::models::MONDAY;
///
/// // 0001-01-01 (proleptic Gregorian) was a Monday.
/// assert_eq!(day_of_week(1), MONDAY);
/// ```
pub fn day_of_week(fixed_date: i64) -> i32 {
    fixed_date.rem_euclid(7) as i32 + 1
}

/// The latest date on or before `fixed_date` that falls on `dow`.
pub fn day_of_week_on_or_before(fixed_date: i64, dow: i32) -> i64 {
    fixed_date - (fixed_date - (i64::from(dow) - 1)).rem_euclid(7)
}

/// Split epoch milliseconds into a fixed date and the milliseconds into that day.
pub fn split_millis(millis: i64) -> (i64, i64) {
    (millis.div_euclid(ONE_DAY) + EPOCH_OFFSET, millis.rem_euclid(ONE_DAY))
}

/// Epoch milliseconds at midnight of a fixed date, plus a time of day.
pub fn millis_of(fixed_date: i64, time_of_day: i64) -> i64 {
    (fixed_date - EPOCH_OFFSET)
        .wrapping_mul(ONE_DAY)
        .wrapping_add(time_of_day)
}

impl DateSystem {
    pub fn is_leap_year(self, year: i64) -> bool {
        match self {
            DateSystem::Gregorian => is_gregorian_leap_year(year),
            DateSystem::Julian => is_julian_leap_year(year),
        }
    }

    pub fn year_length(self, year: i64) -> i64 {
        if self.is_leap_year(year) { 366 } else { 365 }
    }

    /// Length of a 1-based month.
    pub fn month_length(self, year: i64, month: u32) -> i64 {
        let table = if self.is_leap_year(year) {
            &ACCUMULATED_DAYS_LEAP
        } else {
            &ACCUMULATED_DAYS
        };
        let m = month.clamp(1, 12) as usize;
        table[m] - table[m - 1]
    }

    /// Fixed date of (year, month, day). The day may lie outside the month;
    /// the result simply counts forward or backward from day 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::fixed_date::{DateSystem, EPOCH_OFFSET};
    ///
    /// assert_eq!(DateSystem::Gregorian.fixed_date(1970, 1, 1), EPOCH_OFFSET);
    /// // The day after Julian 1582-10-04 is Gregorian 1582-10-15.
    /// assert_eq!(
    ///     DateSystem::Julian.fixed_date(1582, 10, 4) + 1,
    ///     DateSystem::Gregorian.fixed_date(1582, 10, 15),
    /// );
    /// ```
    pub fn fixed_date(self, year: i64, month: u32, day: i64) -> i64 {
        let prev = year - 1;
        let mut days = match self {
            DateSystem::Gregorian => {
                365 * prev + prev.div_euclid(4) - prev.div_euclid(100) + prev.div_euclid(400)
            }
            DateSystem::Julian => -2 + 365 * prev + prev.div_euclid(4),
        };
        let m = i64::from(month);
        days += (367 * m - 362).div_euclid(12) + day;
        if month > 2 {
            days -= if self.is_leap_year(year) { 1 } else { 2 };
        }
        days
    }

    pub fn fixed_date_of(self, date: CalendarDate) -> i64 {
        self.fixed_date(i64::from(date.year), date.month, i64::from(date.day))
    }

    /// Normalized year containing a fixed date.
    pub fn year_from_fixed(self, fixed_date: i64) -> i64 {
        match self {
            DateSystem::Gregorian => {
                let d0 = fixed_date - 1;
                let n400 = d0.div_euclid(146_097);
                let d1 = d0.rem_euclid(146_097);
                let n100 = d1.div_euclid(36_524);
                let d2 = d1.rem_euclid(36_524);
                let n4 = d2.div_euclid(1_461);
                let d3 = d2.rem_euclid(1_461);
                let n1 = d3.div_euclid(365);
                let year = 400 * n400 + 100 * n100 + 4 * n4 + n1;
                if n100 == 4 || n1 == 4 { year } else { year + 1 }
            }
            DateSystem::Julian => (4 * (fixed_date + 1) + 1464).div_euclid(1461),
        }
    }

    /// Convert a fixed date into (year, month, day).
    pub fn date_from_fixed(self, fixed_date: i64) -> CalendarDate {
        let year = self.year_from_fixed(fixed_date);
        let jan1 = self.fixed_date(year, 1, 1);
        let mut prior_days = fixed_date - jan1;
        if fixed_date >= self.fixed_date(year, 3, 1) {
            prior_days += if self.is_leap_year(year) { 1 } else { 2 };
        }
        let month = (12 * prior_days + 373).div_euclid(367);
        let month1 = self.fixed_date(year, month as u32, 1);
        CalendarDate {
            year: year as i32,
            month: month as u32,
            day: (fixed_date - month1 + 1) as u32,
        }
    }
}
