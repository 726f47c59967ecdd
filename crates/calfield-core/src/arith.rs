//! Field arithmetic.
//!
//! `add` changes a field and carries into larger fields, so it moves the
//! date. `roll` changes a field within its current range without touching
//! larger fields, wrapping at the ends. Both resolve pending field writes
//! first.

use tracing::trace;

use crate::calendar::{Calendar, CalendarSystem};
use crate::compute::split_local;
use crate::error::{CalendarError, Result};
use crate::fixed_date::{DateSystem, day_of_week_on_or_before, millis_of};
use crate::models::{
    BCE, CE, Field, JANUARY, ONE_DAY, ONE_HOUR, ONE_MINUTE, ONE_SECOND, SATURDAY, SUNDAY,
};
use crate::tz::ZoneRules;

/// `value + amount` wrapped into `[min, max]`.
///
/// # Examples
///
/// ```
/// use calfield_core::arith::rolled_value;
///
/// assert_eq!(rolled_value(11, 1, 0, 11), 0);
/// assert_eq!(rolled_value(0, -1, 0, 11), 11);
/// assert_eq!(rolled_value(5, 24, 0, 11), 5);
/// ```
pub fn rolled_value(value: i32, amount: i32, min: i32, max: i32) -> i32 {
    let range = i64::from(max) - i64::from(min) + 1;
    let mut n = i64::from(value) + i64::from(amount) % range;
    if n > i64::from(max) {
        n -= range;
    } else if n < i64::from(min) {
        n += range;
    }
    n as i32
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl Calendar {
    /// Add a signed amount to a field, carrying into larger fields.
    ///
    /// YEAR and MONTH pin DAY_OF_MONTH to the last day of the resulting
    /// month. Day-based fields keep the wall-clock time across zone
    /// transitions where that time exists.
    ///
    /// # Arguments
    ///
    /// * `field` - Any field except ZONE_OFFSET and DST_OFFSET
    /// * `amount` - Signed amount in units of the field
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::prelude::*;
    ///
    /// let mut cal = Calendar::gregorian();
    /// cal.set_date(2024, JANUARY, 31);
    /// cal.add(Field::Month, 1).unwrap();
    /// assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 29);
    /// ```
    pub fn add(&mut self, field: Field, amount: i32) -> Result<()> {
        if matches!(field, Field::ZoneOffset | Field::DstOffset) {
            return Err(CalendarError::UnsupportedOperation {
                operation: "add",
                calendar: self.system.name().to_string(),
            });
        }
        if amount == 0 {
            return Ok(());
        }
        self.complete()?;

        match field {
            Field::Year | Field::Month => {
                if matches!(self.system, CalendarSystem::Era(_)) {
                    self.add_era_months(field, amount);
                } else {
                    self.add_months(field, amount);
                }
            }
            Field::Era => {
                let era = self.store.get(Field::Era);
                let newest = match &self.system {
                    CalendarSystem::Era(table) => table.newest(),
                    _ => CE,
                };
                let era = (i64::from(era) + i64::from(amount)).clamp(0, i64::from(newest));
                self.set(Field::Era, era as i32);
            }
            _ => self.add_duration(field, amount),
        }
        self.complete()
    }

    /// YEAR or MONTH addition for BCE/CE calendars.
    fn add_months(&mut self, field: Field, amount: i32) {
        if field == Field::Year {
            self.add_years_across_eras(i64::from(amount));
        } else {
            let month = i64::from(self.store.get(Field::Month)) + i64::from(amount);
            let years = month.div_euclid(12);
            if years != 0 {
                self.add_years_across_eras(years);
            }
            self.set(Field::Month, month.rem_euclid(12) as i32);
        }
        self.pin_day_of_month();
    }

    fn add_years_across_eras(&mut self, delta: i64) {
        let year = i64::from(self.store.get(Field::Year));
        let ce = !self.store.is_set(Field::Era) || self.store.get(Field::Era) == CE;
        let year = if ce { year + delta } else { year - delta };
        if year > 0 {
            self.set(Field::Year, saturate(year));
        } else {
            self.set(Field::Year, saturate(1 - year));
            self.set(Field::Era, if ce { BCE } else { CE });
        }
    }

    /// Clamp DAY_OF_MONTH to the last day of the month named by the
    /// YEAR, ERA and MONTH fields.
    fn pin_day_of_month(&mut self) {
        let year = i64::from(self.store.get(Field::Year));
        let year = if self.store.get(Field::Era) == BCE {
            1 - year
        } else {
            year
        };
        let month = self.store.get(Field::Month);
        let last = match &self.system {
            CalendarSystem::Hybrid(cutover) => {
                let first = cutover.first_day_of_month(year, (month + 1) as u32);
                let (_, date) = cutover.date_from_fixed(cutover.next_month_start(first) - 1);
                date.day as i32
            }
            _ => DateSystem::Gregorian.month_length(year, (month + 1) as u32) as i32,
        };
        if self.store.get(Field::DayOfMonth) > last {
            self.set(Field::DayOfMonth, last);
        }
    }

    /// YEAR or MONTH addition for era calendars: move the Gregorian date,
    /// then re-derive the era.
    fn add_era_months(&mut self, field: Field, amount: i32) {
        let g = DateSystem::Gregorian;
        let date = g.date_from_fixed(self.local_fixed_date());
        let mut year = i64::from(date.year);
        let mut month = i64::from(date.month) - 1;
        if field == Field::Year {
            year += i64::from(amount);
        } else {
            let total = month + i64::from(amount);
            year += total.div_euclid(12);
            month = total.rem_euclid(12);
        }
        let day = i64::from(date.day).min(g.month_length(year, (month + 1) as u32));
        self.set_date_fields(g.fixed_date(year, (month + 1) as u32, day));
    }

    /// Addition of time-of-day and day-based fields as an offset on the
    /// time value.
    fn add_duration(&mut self, field: Field, amount: i32) {
        let mut delta = i64::from(amount);
        let mut half_days = 0;
        match field {
            Field::Hour | Field::HourOfDay => delta *= ONE_HOUR,
            Field::Minute => delta *= ONE_MINUTE,
            Field::Second => delta *= ONE_SECOND,
            Field::WeekOfYear | Field::WeekOfMonth | Field::DayOfWeekInMonth => delta *= 7,
            Field::AmPm => {
                delta = i64::from(amount / 2);
                half_days = i64::from(amount % 2);
            }
            _ => {}
        }

        if matches!(
            field,
            Field::Hour | Field::HourOfDay | Field::Minute | Field::Second | Field::Millisecond
        ) {
            let time = self.time.wrapping_add(delta);
            self.set_time_and_compute(time);
            return;
        }

        // Keep the wall-clock time: rebuild it on the new date.
        let get = |f| i64::from(self.store.get(f));
        let mut time_of_day = 12 * half_days + get(Field::HourOfDay);
        time_of_day = time_of_day * 60 + get(Field::Minute);
        time_of_day = time_of_day * 60 + get(Field::Second);
        time_of_day = time_of_day * 1000 + get(Field::Millisecond);
        let mut fixed_date = self.local_fixed_date() + delta;
        if time_of_day >= ONE_DAY {
            fixed_date += 1;
            time_of_day -= ONE_DAY;
        } else if time_of_day < 0 {
            fixed_date -= 1;
            time_of_day += ONE_DAY;
        }

        let zone_offset = self.offset_fields();
        self.set_time_and_compute(millis_of(fixed_date, time_of_day).wrapping_sub(zone_offset));
        let shift = zone_offset - self.offset_fields();
        if shift != 0 {
            trace!(%field, amount, shift, "offset changed across addition");
            self.set_time_and_compute(self.time.wrapping_add(shift));
            if self.local_fixed_date() != fixed_date {
                self.set_time_and_compute(self.time.wrapping_sub(shift));
            }
        }
    }

    fn offset_fields(&self) -> i64 {
        i64::from(self.store.get(Field::ZoneOffset)) + i64::from(self.store.get(Field::DstOffset))
    }

    /// Change a field by `amount` within its current range, leaving larger
    /// fields alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::prelude::*;
    ///
    /// let mut cal = Calendar::gregorian();
    /// cal.set_date(2024, JANUARY, 31);
    /// cal.roll(Field::DayOfMonth, 1).unwrap();
    /// assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 1);
    /// assert_eq!(cal.get(Field::Month).unwrap(), JANUARY);
    /// ```
    pub fn roll(&mut self, field: Field, amount: i32) -> Result<()> {
        if matches!(field, Field::ZoneOffset | Field::DstOffset) {
            return Err(CalendarError::UnsupportedOperation {
                operation: "roll",
                calendar: self.system.name().to_string(),
            });
        }
        if amount == 0 {
            return Ok(());
        }
        self.complete()?;

        let min = self.minimum(field);
        let max = self.maximum(field);
        match field {
            Field::Year if matches!(self.system, CalendarSystem::Era(_)) => {
                self.roll_era_year(amount)?
            }
            Field::Hour | Field::HourOfDay => self.roll_hour(field, amount, max),
            Field::Month => self.roll_month(amount)?,
            Field::WeekOfYear => self.roll_week_of_year(amount)?,
            Field::WeekOfMonth => self.roll_week_of_month(amount)?,
            Field::DayOfMonth => {
                let fixed_date = self.local_fixed_date();
                let month1 = self.system.month_start(fixed_date);
                let days = (self.system.next_month_start(fixed_date) - month1) as i32;
                let value = rolled_value((fixed_date - month1) as i32, amount, 0, days - 1);
                let (_, date) = self.system.date_from_fixed(month1 + i64::from(value));
                self.set(Field::DayOfMonth, date.day as i32);
            }
            Field::DayOfYear => self.roll_day_of_year(amount)?,
            Field::DayOfWeek => self.roll_day_of_week(amount),
            Field::DayOfWeekInMonth => self.roll_day_of_week_in_month(amount),
            _ => {
                let value = rolled_value(self.store.get(field), amount, min, max);
                self.set(field, value);
            }
        }
        self.complete()
    }

    /// Roll by one unit up or down.
    pub fn roll_up(&mut self, field: Field, up: bool) -> Result<()> {
        self.roll(field, if up { 1 } else { -1 })
    }

    fn roll_hour(&mut self, field: Field, amount: i32, max: i32) {
        let unit = i64::from(max) + 1;
        let hour = i64::from(self.store.get(field));
        let rolled = (hour + i64::from(amount)).rem_euclid(unit);
        let old_date = self.local_fixed_date();
        let mut time = self.time.wrapping_add(ONE_HOUR * (rolled - hour));

        // A zone transition can push the result onto another day; rebuild
        // the wall time on the original date instead.
        let offsets = self.zone.offsets_at_utc(time);
        let (new_date, time_of_day) = split_local(time, offsets.total());
        if new_date != old_date {
            let mut wall_time = time_of_day;
            if field == Field::Hour {
                wall_time += 12 * ONE_HOUR;
            }
            let wall = millis_of(old_date, wall_time);
            time = wall.wrapping_sub(self.zone.offsets_at_wall(wall).total());
        }
        self.set_time_and_compute(time);
    }

    fn roll_month(&mut self, amount: i32) -> Result<()> {
        let fixed_date = self.local_fixed_date();
        let min = self.actual_minimum_at(Field::Month, fixed_date, 0);
        let max = self.actual_maximum_at(Field::Month, fixed_date, 0);
        let month = rolled_value(self.store.get(Field::Month), amount, min, max);
        self.set(Field::Month, month);

        let (first, last) = self.month_range(fixed_date, month);
        let day = self.store.get(Field::DayOfMonth);
        if day > last {
            self.set(Field::DayOfMonth, last);
        } else if day < first {
            self.set(Field::DayOfMonth, first);
        }
        Ok(())
    }

    /// First and last DAY_OF_MONTH of `month` in the calendar year holding
    /// `fixed_date`.
    fn month_range(&self, fixed_date: i64, month: i32) -> (i32, i32) {
        let (system, date) = self.system.date_from_fixed(fixed_date);
        let year = i64::from(date.year);
        let month1 = (month - JANUARY + 1) as u32;
        let (first, last) = match &self.system {
            CalendarSystem::Gregorian => {
                let first = system.fixed_date(year, month1, 1);
                (first, first + system.month_length(year, month1) - 1)
            }
            CalendarSystem::Hybrid(cutover) => {
                let first = cutover.first_day_of_month(year, month1);
                (first, cutover.next_month_start(first) - 1)
            }
            CalendarSystem::Era(_) => {
                let g = DateSystem::Gregorian;
                let first = g.fixed_date(year, month1, 1);
                let next = first + g.month_length(year, month1);
                (
                    first.max(self.system.year_start(fixed_date)),
                    next.min(self.system.next_year_start(fixed_date)) - 1,
                )
            }
        };
        let day = |fd| self.system.date_from_fixed(fd).1.day as i32;
        (day(first), day(last))
    }

    fn same_year(&self, a: i64, b: i64) -> bool {
        self.system.year_start(a) == self.system.year_start(b)
    }

    fn roll_week_of_year(&mut self, amount: i32) -> Result<()> {
        let fixed_date = self.local_fixed_date();
        let mut week = self.store.get(Field::WeekOfYear);
        let mut amount = amount;
        let mut min = self.minimum(Field::WeekOfYear);
        let mut max = self.actual_maximum_at(Field::WeekOfYear, fixed_date, 0);
        let day_of_week = self.store.get(Field::DayOfWeek);

        if self.system.is_regular_year(fixed_date) {
            let (_, date) = self.system.date_from_fixed(fixed_date);
            let year = i64::from(date.year);
            let week_year = self.week_year_at(fixed_date);
            if week_year == year {
                let value = i64::from(week) + i64::from(amount);
                if value > i64::from(min) && value < i64::from(max) {
                    self.set(Field::WeekOfYear, value as i32);
                    self.set(Field::DayOfWeek, day_of_week);
                    return Ok(());
                }
                let first = fixed_date - 7 * i64::from(week - min);
                if !self.same_year(first, fixed_date) {
                    min += 1;
                }
                let last = fixed_date + 7 * i64::from(max - week);
                if !self.same_year(last, fixed_date) {
                    max -= 1;
                }
            } else if week_year > year {
                if amount < 0 {
                    amount += 1;
                }
                week = max;
            } else {
                if amount > 0 {
                    amount -= week - max;
                }
                week = min;
            }
            self.set(Field::WeekOfYear, rolled_value(week, amount, min, max));
            self.set(Field::DayOfWeek, day_of_week);
            return Ok(());
        }

        let first = fixed_date - 7 * i64::from(week - min);
        if !self.same_year(first, fixed_date) {
            min += 1;
        }
        let last = fixed_date + 7 * i64::from(max - week);
        if !self.same_year(last, fixed_date) {
            max -= 1;
        }
        let value = i64::from(rolled_value(week, amount, min, max) - week);
        let target = fixed_date + 7 * value;
        self.set_month_day(target);
        Ok(())
    }

    fn roll_week_of_month(&mut self, amount: i32) -> Result<()> {
        let fixed_date = self.local_fixed_date();
        let month1 = self.system.month_start(fixed_date);
        let days = self.system.next_month_start(fixed_date) - month1;
        let max = self.actual_maximum_at(Field::WeekOfMonth, fixed_date, 0);
        let week = self.store.get(Field::WeekOfMonth);
        let weekday =
            i64::from((self.store.get(Field::DayOfWeek) - self.week.first_day_of_week).rem_euclid(7));

        let value = i64::from(rolled_value(week, amount, 1, max)) - 1;
        let start = self.week.first_week_start(month1);
        let target = (start + 7 * value + weekday).clamp(month1, month1 + days - 1);
        self.set_month_day(target);
        Ok(())
    }

    fn roll_day_of_year(&mut self, amount: i32) -> Result<()> {
        let fixed_date = self.local_fixed_date();
        let start = self.system.year_start(fixed_date);
        let max = self.actual_maximum_at(Field::DayOfYear, fixed_date, 0);
        let value = rolled_value((fixed_date - start + 1) as i32, amount, 1, max);
        if self.system.is_regular_year(fixed_date) {
            self.set(Field::DayOfYear, value);
        } else {
            self.set_month_day(start + i64::from(value) - 1);
        }
        Ok(())
    }

    fn roll_day_of_week(&mut self, amount: i32) {
        let fixed_date = self.local_fixed_date();
        let week = self.store.get(Field::WeekOfYear);
        if self.system.is_regular_year(fixed_date) && week > 1 && week < 52 {
            self.set(Field::WeekOfYear, week);
            let value = rolled_value(self.store.get(Field::DayOfWeek), amount, SUNDAY, SATURDAY);
            self.set(Field::DayOfWeek, value);
            return;
        }

        let amount = i64::from(amount % 7);
        if amount == 0 {
            return;
        }
        let week_start = day_of_week_on_or_before(fixed_date, self.week.first_day_of_week);
        let mut target = fixed_date + amount;
        if target < week_start {
            target += 7;
        } else if target >= week_start + 7 {
            target -= 7;
        }
        self.set_date_fields(target);
    }

    fn roll_day_of_week_in_month(&mut self, amount: i32) {
        let fixed_date = self.local_fixed_date();
        let month1 = self.system.month_start(fixed_date);
        let days = self.system.next_month_start(fixed_date) - month1;
        let offset = (fixed_date - month1) % 7;
        let mut max = (days / 7) as i32;
        if offset < days % 7 {
            max += 1;
        }

        if self.system.is_regular_month(fixed_date) {
            let day_of_week = self.store.get(Field::DayOfWeek);
            self.set(Field::DayOfWeek, day_of_week);
            let value = rolled_value(self.store.get(Field::DayOfWeekInMonth), amount, 1, max);
            self.set(Field::DayOfWeekInMonth, value);
            return;
        }
        let current = ((fixed_date - month1) / 7 + 1) as i32;
        let value = i64::from(rolled_value(current, amount, 1, max)) - 1;
        self.set_month_day(month1 + 7 * value + offset);
    }

    /// YEAR roll for era calendars, within the years the current era
    /// actually has. The date is pinned into the era if the rolled year
    /// would fall outside it.
    fn roll_era_year(&mut self, amount: i32) -> Result<()> {
        let CalendarSystem::Era(table) = &self.system else {
            return Ok(());
        };
        let table = table.clone();
        let (fixed_date, time_of_day) = self.local_date_time();
        let era = self.store.get(Field::Era);
        // The actual range only holds years containing this month and day.
        let min = self.actual_minimum_at(Field::Year, fixed_date, time_of_day);
        let max = self
            .actual_maximum_at(Field::Year, fixed_date, time_of_day)
            .max(min);
        let year = rolled_value(self.store.get(Field::Year), amount, min, max);

        let g = DateSystem::Gregorian;
        let date = g.date_from_fixed(fixed_date);
        let normalized = table.normalized_year(era, year);
        let day = i64::from(date.day).min(g.month_length(normalized, date.month));
        self.set_date_fields(g.fixed_date(normalized, date.month, day));
        Ok(())
    }

    /// Write MONTH and DAY_OF_MONTH for a date in the current year.
    fn set_month_day(&mut self, fixed_date: i64) {
        let (_, date) = self.system.date_from_fixed(fixed_date);
        self.set(Field::Month, date.month as i32 - 1 + JANUARY);
        self.set(Field::DayOfMonth, date.day as i32);
    }
}
