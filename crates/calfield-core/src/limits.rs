//! Field bounds.
//!
//! Four fixed bounds per field (minimum, greatest minimum, least maximum,
//! maximum) plus the actual bounds at the calendar's current date. Hybrid
//! and era calendars derive some fixed bounds from their cutover or era
//! transitions; those are probed once per calendar and cached until the
//! cutover or week rules change.

use crate::calendar::{Calendar, CalendarSystem};
use crate::compute::split_local;
use crate::error::Result;
use crate::fixed_date::{DateSystem, day_of_week, split_millis};
use crate::models::{
    AM, BCE, CE, DECEMBER, Field, JANUARY, ONE_DAY, ONE_HOUR, ONE_MINUTE, PM, SATURDAY, SUNDAY,
};
use crate::tz::ZoneRules;

const HOUR: i32 = ONE_HOUR as i32;
const MINUTE: i32 = ONE_MINUTE as i32;

const MIN_VALUES: [i32; Field::COUNT] = [
    BCE, 1, JANUARY, 1, 0, 1, 1, SUNDAY, 1, AM, 0, 0, 0, 0, 0, -13 * HOUR, 0,
];

const LEAST_MAX_VALUES: [i32; Field::COUNT] = [
    CE,
    292_269_054,
    DECEMBER,
    52,
    4,
    28,
    365,
    SATURDAY,
    4,
    PM,
    11,
    23,
    59,
    59,
    999,
    14 * HOUR,
    20 * MINUTE,
];

const MAX_VALUES: [i32; Field::COUNT] = [
    CE,
    292_278_994,
    DECEMBER,
    53,
    6,
    31,
    366,
    SATURDAY,
    6,
    PM,
    11,
    23,
    59,
    59,
    999,
    14 * HOUR,
    2 * HOUR,
];

/// Smallest YEAR of the synthetic first era.
const ERA_MIN_YEAR: i32 = -292_275_055;

/// Date fields whose maxima depend on the calendar system.
const PROBED: [Field; 7] = [
    Field::Month,
    Field::DayOfMonth,
    Field::DayOfYear,
    Field::WeekOfYear,
    Field::WeekOfMonth,
    Field::DayOfWeekInMonth,
    Field::Year,
];

/// Fixed bounds of one calendar configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProbedLimits {
    minimum: [i32; Field::COUNT],
    greatest_minimum: [i32; Field::COUNT],
    least_maximum: [i32; Field::COUNT],
    maximum: [i32; Field::COUNT],
}

impl Default for ProbedLimits {
    fn default() -> Self {
        ProbedLimits {
            minimum: MIN_VALUES,
            greatest_minimum: MIN_VALUES,
            least_maximum: LEAST_MAX_VALUES,
            maximum: MAX_VALUES,
        }
    }
}

impl Calendar {
    /// Smallest value the field can take in any date.
    pub fn minimum(&self, field: Field) -> i32 {
        self.limits().minimum[field.index()]
    }

    /// Largest value the field can take in any date.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::prelude::*;
    ///
    /// let cal = Calendar::gregorian();
    /// assert_eq!(cal.maximum(Field::DayOfMonth), 31);
    /// assert_eq!(cal.least_maximum(Field::DayOfMonth), 28);
    /// ```
    pub fn maximum(&self, field: Field) -> i32 {
        self.limits().maximum[field.index()]
    }

    /// Largest of the per-date minima.
    pub fn greatest_minimum(&self, field: Field) -> i32 {
        self.limits().greatest_minimum[field.index()]
    }

    /// Smallest of the per-date maxima.
    pub fn least_maximum(&self, field: Field) -> i32 {
        self.limits().least_maximum[field.index()]
    }

    /// Smallest value the field can take given the other fields of the
    /// current date.
    pub fn actual_minimum(&mut self, field: Field) -> Result<i32> {
        self.complete()?;
        let (fixed_date, time_of_day) = self.local_date_time();
        Ok(self.actual_minimum_at(field, fixed_date, time_of_day))
    }

    /// Largest value the field can take given the other fields of the
    /// current date.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::prelude::*;
    ///
    /// let mut cal = Calendar::gregorian();
    /// cal.set_date(2024, FEBRUARY, 10);
    /// assert_eq!(cal.actual_maximum(Field::DayOfMonth).unwrap(), 29);
    /// ```
    pub fn actual_maximum(&mut self, field: Field) -> Result<i32> {
        self.complete()?;
        let (fixed_date, time_of_day) = self.local_date_time();
        Ok(self.actual_maximum_at(field, fixed_date, time_of_day))
    }

    fn limits(&self) -> &ProbedLimits {
        self.limits.get_or_init(|| self.probe_limits())
    }

    fn probe_limits(&self) -> ProbedLimits {
        let mut limits = ProbedLimits::default();
        match &self.system {
            CalendarSystem::Gregorian => {}
            CalendarSystem::Hybrid(cutover) => {
                let boundary = cutover.fixed_date();
                for field in PROBED {
                    let i = field.index();
                    let at = self.actual_maximum_at(field, boundary, 0);
                    let before = self.actual_maximum_at(field, boundary - 1, ONE_DAY - 1);
                    limits.least_maximum[i] = limits.least_maximum[i].min(at).min(before);
                    if cutover.year() <= 200 {
                        limits.maximum[i] = limits.maximum[i].max(at).max(before);
                    }
                }
                let (_, month1) = self.system.date_from_fixed(self.system.month_start(boundary));
                limits.greatest_minimum[Field::DayOfMonth.index()] =
                    (month1.day as i32).max(MIN_VALUES[Field::DayOfMonth.index()]);
            }
            CalendarSystem::Era(table) => {
                let g = DateSystem::Gregorian;
                limits.minimum[Field::Era.index()] = 0;
                limits.greatest_minimum[Field::Era.index()] = 0;
                limits.least_maximum[Field::Era.index()] = table.newest();
                limits.maximum[Field::Era.index()] = table.newest();

                limits.minimum[Field::Year.index()] = ERA_MIN_YEAR;
                limits.greatest_minimum[Field::Year.index()] = 1;
                let (max_fixed_date, _) = split_millis(i64::MAX);
                limits.maximum[Field::Year.index()] = table.era_year_of(max_fixed_date).1;

                let mut year = i32::MAX;
                let mut day_of_year = i64::MAX;
                let mut week_of_year = LEAST_MAX_VALUES[Field::WeekOfYear.index()];
                for era in table.eras().iter().skip(1) {
                    let since = era.since;
                    let since_year = i64::from(g.date_from_fixed(since).year);
                    let jan1 = g.fixed_date(since_year, 1, 1);
                    let dec31 = g.fixed_date(since_year, 12, 31);
                    if since != jan1 {
                        day_of_year = day_of_year.min(since - jan1 + 1);
                    }
                    if since != dec31 {
                        day_of_year = day_of_year.min(dec31 - since + 1);
                    }

                    let last = since - 1;
                    let (_, mut last_year) = table.era_year_of(last);
                    let last_date = g.date_from_fixed(last);
                    // An era year not ending on a January 1 boundary may be
                    // one short of a full year.
                    if !(last_date.month == 1 && last_date.day == 1) {
                        last_year -= 1;
                    }
                    year = year.min(last_year);

                    let start = self.system.year_start(last);
                    week_of_year = week_of_year.min(self.week.week_number(start, last).max(1));
                }
                limits.least_maximum[Field::Year.index()] = year;
                limits.least_maximum[Field::Month.index()] = JANUARY;
                limits.least_maximum[Field::DayOfYear.index()] = day_of_year as i32;
                limits.least_maximum[Field::WeekOfYear.index()] = week_of_year;
            }
        }
        limits
    }

    pub(crate) fn actual_minimum_at(&self, field: Field, fixed_date: i64, time_of_day: i64) -> i32 {
        match (field, &self.system) {
            (Field::DayOfMonth, _) => {
                let (_, date) = self.system.date_from_fixed(self.system.month_start(fixed_date));
                date.day as i32
            }
            (Field::Month, CalendarSystem::Era(_)) => {
                let (_, date) = self.system.date_from_fixed(self.system.year_start(fixed_date));
                date.month as i32 - 1 + JANUARY
            }
            (Field::Year, CalendarSystem::Era(table)) => {
                let era = table.era_index_of(fixed_date);
                if era == 0 {
                    let (start_date, start_time) = self.range_end(false);
                    let (_, year) = table.era_year_of(start_date);
                    let before = month_day_time(fixed_date, time_of_day)
                        < month_day_time(start_date, start_time);
                    return if before { year + 1 } else { year };
                }
                let Some(since) = table.era(era).map(|e| e.since_date()) else {
                    return self.minimum(field);
                };
                // Year 1 has no dates before the since-date.
                let date = DateSystem::Gregorian.date_from_fixed(fixed_date);
                if (date.month, date.day) < (since.month, since.day) {
                    2
                } else {
                    1
                }
            }
            _ => self.minimum(field),
        }
    }

    /// Actual maximum at a local date and time of day. Fields in [`PROBED`]
    /// never consult the cached limits.
    pub(crate) fn actual_maximum_at(&self, field: Field, fixed_date: i64, time_of_day: i64) -> i32 {
        let system = &self.system;
        match field {
            Field::Month => {
                let (_, date) = system.date_from_fixed(system.next_year_start(fixed_date) - 1);
                date.month as i32 - 1 + JANUARY
            }
            Field::DayOfMonth => {
                let (_, date) = system.date_from_fixed(system.next_month_start(fixed_date) - 1);
                date.day as i32
            }
            Field::DayOfYear => {
                (system.next_year_start(fixed_date) - system.year_start(fixed_date)) as i32
            }
            Field::WeekOfYear => {
                let last = system.next_year_start(fixed_date) - 1;
                match self.week_of_year_at(last) {
                    1 => self.week_of_year_at(last - 7),
                    week => week,
                }
            }
            Field::WeekOfMonth => {
                let last = system.next_month_start(fixed_date) - 1;
                self.week.week_number(system.month_start(fixed_date), last)
            }
            Field::DayOfWeekInMonth => {
                // Era months are counted from the Gregorian 1st, even in an
                // era's first month.
                let (month1, days) = match system {
                    CalendarSystem::Era(_) => {
                        let g = DateSystem::Gregorian;
                        let date = g.date_from_fixed(fixed_date);
                        let year = i64::from(date.year);
                        (g.fixed_date(year, date.month, 1), g.month_length(year, date.month))
                    }
                    _ => {
                        let month1 = system.month_start(fixed_date);
                        (month1, system.next_month_start(fixed_date) - month1)
                    }
                };
                let offset = i64::from(day_of_week(fixed_date) - day_of_week(month1)).rem_euclid(7);
                ((days - offset + 6) / 7) as i32
            }
            Field::Year => self.actual_maximum_year(fixed_date, time_of_day),
            Field::Era => match system {
                CalendarSystem::Era(table) => table.newest(),
                _ => CE,
            },
            _ => self.maximum(field),
        }
    }

    fn actual_maximum_year(&self, fixed_date: i64, time_of_day: i64) -> i32 {
        if let CalendarSystem::Era(table) = &self.system {
            let era = table.era_index_of(fixed_date);
            if let Some(next) = table.era(era + 1) {
                let last = next.since - 1;
                let (_, last_year) = table.era_year_of(last);
                let g = DateSystem::Gregorian;
                let date = g.date_from_fixed(fixed_date);
                let last_date = g.date_from_fixed(last);
                return if (date.month, date.day) > (last_date.month, last_date.day) {
                    last_year - 1
                } else {
                    last_year
                };
            }
            let (end_date, end_time) = self.range_end(true);
            let (_, year) = table.era_year_of(end_date);
            let beyond =
                month_day_time(fixed_date, time_of_day) > month_day_time(end_date, end_time);
            return if beyond { year - 1 } else { year };
        }
        let (_, date) = self.system.date_from_fixed(fixed_date);
        self.year_at_range_end(fixed_date, time_of_day, date.year > 0)
    }

    /// YEAR value at the end of the representable range, reduced by one if
    /// the current position within its year lies beyond that end.
    fn year_at_range_end(&self, fixed_date: i64, time_of_day: i64, toward_max: bool) -> i32 {
        let (end_date, end_time) = self.range_end(toward_max);
        let (_, date) = self.system.date_from_fixed(end_date);
        let (_, year) = self.system.era_and_year(end_date, &date);

        let position = |fd: i64, tod: i64| (fd - self.system.year_start(fd)) * ONE_DAY + tod;
        let current = position(fixed_date, time_of_day);
        let end = position(end_date, end_time);
        let beyond = if toward_max { current > end } else { current < end };
        if beyond { year - 1 } else { year }
    }

    /// Local date and time of day at the last (or first) representable
    /// instant.
    fn range_end(&self, toward_max: bool) -> (i64, i64) {
        let extreme = if toward_max { i64::MAX } else { i64::MIN };
        let offset = self.zone.offsets_at_utc(extreme).total();
        split_local(extreme, offset)
    }
}

/// Gregorian month, day and time of day, ordered for comparing positions
/// within a year regardless of leap days.
fn month_day_time(fixed_date: i64, time_of_day: i64) -> (u32, u32, i64) {
    let date = DateSystem::Gregorian.date_from_fixed(fixed_date);
    (date.month, date.day, time_of_day)
}
