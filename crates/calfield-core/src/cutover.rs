//! Hybrid Julian/Gregorian calendar system.
//!
//! Dates before the cutover fixed date are Julian, dates on or after it are
//! Gregorian. The year containing the cutover (the transition year) is
//! shorter than a regular year by the cutover gap, so year and month
//! boundaries around it are found by probing rather than by formula.

use serde::{Deserialize, Serialize};

use crate::fixed_date::{CalendarDate, DateSystem, EPOCH_OFFSET};
use crate::models::ONE_DAY;

/// 1582-10-15T00:00:00Z, the first day of the Gregorian calendar.
pub const DEFAULT_CUTOVER_MILLIS: i64 = -12_219_292_800_000;

/// A cutover instant with its derived fixed date and years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Cutover {
    instant: i64,
    fixed_date: i64,
    /// Gregorian year of the cutover date.
    year: i32,
    /// Julian year of the day before the cutover.
    julian_year: i32,
}

impl Default for Cutover {
    fn default() -> Self {
        Cutover::new(DEFAULT_CUTOVER_MILLIS)
    }
}

impl From<i64> for Cutover {
    fn from(instant: i64) -> Self {
        Cutover::new(instant)
    }
}

impl From<Cutover> for i64 {
    fn from(cutover: Cutover) -> i64 {
        cutover.instant
    }
}

impl Cutover {
    /// Derive the cutover data for an instant in epoch milliseconds.
    ///
    /// `i64::MIN` gives a pure Gregorian calendar and `i64::MAX` a pure
    /// Julian one.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::cutover::Cutover;
    ///
    /// let c = Cutover::default();
    /// assert_eq!(c.year(), 1582);
    /// assert_eq!(c.julian_year(), 1582);
    /// ```
    pub fn new(instant: i64) -> Self {
        let mut fixed_date = instant.div_euclid(ONE_DAY) + EPOCH_OFFSET;
        if instant == i64::MAX {
            fixed_date += 1;
        }
        let year = DateSystem::Gregorian.year_from_fixed(fixed_date) as i32;
        let julian_year = DateSystem::Julian.year_from_fixed(fixed_date - 1) as i32;
        Cutover {
            instant,
            fixed_date,
            year,
            julian_year,
        }
    }

    pub fn instant(&self) -> i64 {
        self.instant
    }

    pub fn fixed_date(&self) -> i64 {
        self.fixed_date
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn julian_year(&self) -> i32 {
        self.julian_year
    }

    pub fn system_of(&self, fixed_date: i64) -> DateSystem {
        if fixed_date >= self.fixed_date {
            DateSystem::Gregorian
        } else {
            DateSystem::Julian
        }
    }

    pub fn date_from_fixed(&self, fixed_date: i64) -> (DateSystem, CalendarDate) {
        let system = self.system_of(fixed_date);
        (system, system.date_from_fixed(fixed_date))
    }

    /// Leap year test for a normalized year.
    ///
    /// Gregorian above the cutover year, Julian below it. In the boundary
    /// year the Gregorian rule applies only if the cutover falls before March.
    pub fn is_leap_year(&self, year: i32) -> bool {
        if year & 3 != 0 {
            return false;
        }
        let gregorian_rule = year % 100 != 0 || year % 400 == 0;
        if year > self.year {
            return gregorian_rule;
        }
        if year < self.julian_year {
            return true;
        }
        let gregorian = if self.year == self.julian_year {
            DateSystem::Gregorian.date_from_fixed(self.fixed_date).month < 3
        } else {
            year == self.year
        };
        if gregorian { gregorian_rule } else { true }
    }

    /// First day of normalized year `year`: Julian January 1 if it precedes
    /// the cutover, else Gregorian January 1 if it follows it, else the
    /// cutover date.
    pub fn first_day_of_year(&self, year: i64) -> i64 {
        let julian = DateSystem::Julian.fixed_date(year, 1, 1);
        if julian < self.fixed_date {
            return julian;
        }
        let gregorian = DateSystem::Gregorian.fixed_date(year, 1, 1);
        if gregorian >= self.fixed_date {
            gregorian
        } else {
            self.fixed_date
        }
    }

    /// First day of the calendar year containing `fixed_date`.
    pub fn year_start(&self, fixed_date: i64) -> i64 {
        let (system, date) = self.date_from_fixed(fixed_date);
        let year = i64::from(date.year);
        match system {
            DateSystem::Julian => DateSystem::Julian.fixed_date(year, 1, 1),
            DateSystem::Gregorian => {
                let jan1 = DateSystem::Gregorian.fixed_date(year, 1, 1);
                if jan1 >= self.fixed_date {
                    jan1
                } else if self.year == self.julian_year {
                    DateSystem::Julian.fixed_date(year, 1, 1)
                } else {
                    self.fixed_date
                }
            }
        }
    }

    /// First day of the calendar year following the one containing `fixed_date`.
    pub fn next_year_start(&self, fixed_date: i64) -> i64 {
        let (system, date) = self.date_from_fixed(fixed_date);
        let next = self.first_day_of_year(i64::from(date.year) + 1);
        if next > fixed_date {
            next
        } else {
            system.fixed_date(i64::from(date.year) + 1, 1, 1)
        }
    }

    /// First day of the calendar month containing `fixed_date`.
    pub fn month_start(&self, fixed_date: i64) -> i64 {
        let (system, date) = self.date_from_fixed(fixed_date);
        let month1 = fixed_date - i64::from(date.day) + 1;
        if system == DateSystem::Julian || month1 >= self.fixed_date {
            return month1;
        }
        let last_julian = DateSystem::Julian.date_from_fixed(self.fixed_date - 1);
        if self.year == self.julian_year && last_julian.month == date.month {
            // The gap lies inside this month.
            DateSystem::Julian.fixed_date(i64::from(date.year), date.month, 1)
        } else {
            self.fixed_date
        }
    }

    /// First day of the calendar month following the one containing `fixed_date`.
    pub fn next_month_start(&self, fixed_date: i64) -> i64 {
        let month1 = self.month_start(fixed_date);
        let (system, date) = self.date_from_fixed(month1);
        let probe = month1 - i64::from(date.day) + 1
            + system.month_length(i64::from(date.year), date.month);
        if probe < self.fixed_date {
            return probe;
        }
        let start = self.month_start(probe);
        if start > month1 { start } else { probe }
    }

    /// First day and length of the calendar month holding the cutover gap,
    /// if the Gregorian month `year`/`month` (1-based) overlaps that gap.
    pub fn gap_month(&self, year: i64, month: u32) -> Option<(i64, i64)> {
        let g = DateSystem::Gregorian;
        let month1 = g.fixed_date(year, month, 1);
        if month1 >= self.fixed_date || month1 + g.month_length(year, month) <= self.fixed_date {
            return None;
        }
        let start = self.month_start(self.fixed_date);
        Some((start, self.next_month_start(self.fixed_date) - start))
    }

    /// First day of month `month` (1-based) in normalized year `year`.
    pub fn first_day_of_month(&self, year: i64, month: u32) -> i64 {
        let julian = DateSystem::Julian.fixed_date(year, month, 1);
        if julian < self.fixed_date {
            return julian;
        }
        let gregorian = DateSystem::Gregorian.fixed_date(year, month, 1);
        if gregorian >= self.fixed_date {
            gregorian
        } else {
            self.fixed_date
        }
    }
}
