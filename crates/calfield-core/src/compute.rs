//! Conversion between the time value and calendar fields.
//!
//! Fields are computed from the time value by:
//! 1. Looking up the zone offsets at the UTC instant (unless the caller
//!    supplied them)
//! 2. Splitting the local time into a fixed date and a time of day
//! 3. Converting the fixed date through the calendar system and deriving
//!    the week-based fields from its year and month boundaries
//!
//! The time value is computed from fields by selecting the winning field
//! combination, resolving it to a local fixed date and time of day, and
//! converting the wall time back to UTC through the zone.

use tracing::debug;

use crate::calendar::{Calendar, CalendarSystem};
use crate::cutover::Cutover;
use crate::error::{CalendarError, Result};
use crate::fixed_date::{
    DateSystem, day_of_week, day_of_week_on_or_before, millis_of, split_millis,
};
use crate::models::{
    BCE, CE, Field, FieldMask, JANUARY, ONE_DAY, ONE_HOUR, ONE_MINUTE, ONE_SECOND,
};
use crate::resolver::select_fields;
use crate::tz::{ZoneOffsets, ZoneRules};

/// Split a UTC instant shifted by `offset` milliseconds into a local fixed
/// date and time of day without overflowing near the ends of the range.
pub(crate) fn split_local(utc_millis: i64, offset: i64) -> (i64, i64) {
    let (fixed_date, time_of_day) = split_millis(utc_millis);
    let mut fixed_date = fixed_date + offset.div_euclid(ONE_DAY);
    let mut time_of_day = time_of_day + offset.rem_euclid(ONE_DAY);
    if time_of_day >= ONE_DAY {
        time_of_day -= ONE_DAY;
        fixed_date += 1;
    }
    (fixed_date, time_of_day)
}

impl Calendar {
    /// Fill in every field from the time value. Fields left by a
    /// partial normalization keep their values.
    pub(crate) fn compute_all_fields(&mut self) {
        let mask = if self.store.is_partially_normalized() {
            let set = self.store.set_state_fields();
            let missing = !set;
            if missing.is_empty() {
                set
            } else {
                set | self.compute_fields(missing, set & FieldMask::ZONE)
            }
        } else {
            self.compute_fields(FieldMask::ALL, FieldMask::EMPTY);
            FieldMask::ALL
        };
        self.store.set_fields_computed(mask);
    }

    /// Compute the fields in `mask` from the time value.
    ///
    /// ERA and YEAR are always written. The other fields are written in
    /// groups, so the returned mask can be wider than `mask`. Zone fields
    /// named in `tz_mask` are taken from the store instead of the zone.
    pub(crate) fn compute_fields(&mut self, mask: FieldMask, tz_mask: FieldMask) -> FieldMask {
        let mut offsets = ZoneOffsets::default();
        if tz_mask != FieldMask::ZONE {
            offsets = self.zone.offsets_at_utc(self.time);
        }
        if tz_mask.contains(Field::ZoneOffset) {
            offsets.raw = self.store.get(Field::ZoneOffset);
        }
        if tz_mask.contains(Field::DstOffset) {
            offsets.dst = self.store.get(Field::DstOffset);
        }

        let (fixed_date, time_of_day) = split_local(self.time, offsets.total());
        let (system, date) = self.system.date_from_fixed(fixed_date);
        self.last_system = Some(system);

        let (era, year) = self.system.era_and_year(fixed_date, &date);
        self.store.set_internal(Field::Era, era);
        self.store.set_internal(Field::Year, year);
        let mut computed = mask | Field::Era.mask() | Field::Year.mask();

        if mask.intersects(FieldMask::MONTH_DAY) {
            self.store
                .set_internal(Field::Month, date.month as i32 - 1 + JANUARY);
            self.store.set_internal(Field::DayOfMonth, date.day as i32);
            self.store
                .set_internal(Field::DayOfWeek, day_of_week(fixed_date));
            computed |= FieldMask::MONTH_DAY;
        }

        if mask.intersects(FieldMask::TIME_OF_DAY) {
            let hour_of_day = (time_of_day / ONE_HOUR) as i32;
            self.store.set_internal(Field::HourOfDay, hour_of_day);
            self.store.set_internal(Field::AmPm, hour_of_day / 12);
            self.store.set_internal(Field::Hour, hour_of_day % 12);
            self.store
                .set_internal(Field::Minute, (time_of_day / ONE_MINUTE % 60) as i32);
            self.store
                .set_internal(Field::Second, (time_of_day / ONE_SECOND % 60) as i32);
            self.store
                .set_internal(Field::Millisecond, (time_of_day % ONE_SECOND) as i32);
            computed |= FieldMask::TIME_OF_DAY;
        }

        if mask.intersects(FieldMask::ZONE) {
            self.store.set_internal(Field::ZoneOffset, offsets.raw);
            self.store.set_internal(Field::DstOffset, offsets.dst);
            computed |= FieldMask::ZONE;
        }

        if mask.intersects(FieldMask::WEEKS) {
            let year_start = self.system.year_start(fixed_date);
            let month_start = self.system.month_start(fixed_date);
            let day_of_week_in_month = match self.system {
                CalendarSystem::Era(_) => (date.day as i32 - 1) / 7 + 1,
                _ => ((fixed_date - month_start) / 7 + 1) as i32,
            };
            let week_of_year = self.week_of_year_at(fixed_date);
            let week_of_month = self.week.week_number(month_start, fixed_date);
            self.store
                .set_internal(Field::DayOfYear, (fixed_date - year_start + 1) as i32);
            self.store.set_internal(Field::WeekOfYear, week_of_year);
            self.store.set_internal(Field::WeekOfMonth, week_of_month);
            self.store
                .set_internal(Field::DayOfWeekInMonth, day_of_week_in_month);
            computed |= FieldMask::WEEKS;
        }

        computed
    }

    /// Week of year of a fixed date.
    ///
    /// Dates before week 1 belong to the last week of the previous year;
    /// dates on or after the start of next year's week 1 are week 1.
    pub(crate) fn week_of_year_at(&self, fixed_date: i64) -> i32 {
        let start = self.system.year_start(fixed_date);
        let week = self.week.week_number(start, fixed_date);
        if week <= 0 {
            let last = start - 1;
            return self.week.week_number(self.system.year_start(last), last);
        }
        let next = self.system.next_year_start(fixed_date);
        if fixed_date >= self.week.first_week_start(next) {
            1
        } else {
            week
        }
    }

    /// Normalized year that the week containing `fixed_date` is counted in.
    pub(crate) fn week_year_at(&self, fixed_date: i64) -> i64 {
        let (_, date) = self.system.date_from_fixed(fixed_date);
        let year = i64::from(date.year);
        let week = self.week_of_year_at(fixed_date);
        if date.month == 1 && week >= 52 {
            year - 1
        } else if date.month != 1 && week == 1 {
            year + 1
        } else {
            year
        }
    }

    /// Local fixed date of the time value, using the zone fields.
    pub(crate) fn local_fixed_date(&self) -> i64 {
        self.local_date_time().0
    }

    /// Local fixed date and time of day of the time value.
    pub(crate) fn local_date_time(&self) -> (i64, i64) {
        let offset = i64::from(self.store.get(Field::ZoneOffset))
            + i64::from(self.store.get(Field::DstOffset));
        split_local(self.time, offset)
    }

    /// Compute the time value from the fields.
    ///
    /// In strict mode every caller-set field must lie within its absolute
    /// range and must survive recomputation unchanged; on a mismatch the
    /// field values are restored and the time is left stale.
    pub(crate) fn compute_time(&mut self) -> Result<()> {
        let originals = if self.lenient {
            None
        } else {
            for field in Field::ALL {
                if !self.store.is_externally_set(field) {
                    continue;
                }
                let value = self.store.get(field);
                if value < self.minimum(field) || value > self.maximum(field) {
                    return Err(CalendarError::InvalidFieldValue { field, value });
                }
            }
            Some(*self.store.values())
        };

        let mut mask = select_fields(self.store.stamps());
        let (year, era) = self.resolve_year(&mut mask)?;

        let time_of_day = self.time_of_day_from_fields(mask);
        let days = time_of_day.div_euclid(ONE_DAY);
        let time_of_day = time_of_day.rem_euclid(ONE_DAY);

        let fixed_date = match &self.system {
            CalendarSystem::Hybrid(cutover) => {
                let cutover = *cutover;
                self.hybrid_fixed_date(cutover, year, mask, days)?
            }
            _ => days + self.fixed_date_from_fields(DateSystem::Gregorian, year, mask, era),
        };

        let wall = millis_of(fixed_date, time_of_day);
        let tz_mask = mask & FieldMask::ZONE;
        let mut offsets = ZoneOffsets::default();
        if tz_mask != FieldMask::ZONE {
            offsets = if tz_mask.contains(Field::ZoneOffset) {
                let raw = i64::from(self.store.get(Field::ZoneOffset));
                self.zone.offsets_at_utc(wall.wrapping_sub(raw))
            } else {
                self.zone.offsets_at_wall(wall)
            };
        }
        if tz_mask.contains(Field::ZoneOffset) {
            offsets.raw = self.store.get(Field::ZoneOffset);
        }
        if tz_mask.contains(Field::DstOffset) {
            offsets.dst = self.store.get(Field::DstOffset);
        }
        self.time = wall.wrapping_sub(offsets.total());

        let set_state = self.store.set_state_fields();
        let computed = self.compute_fields(mask | set_state, tz_mask);

        if let Some(originals) = originals {
            for field in Field::ALL {
                if !self.store.is_externally_set(field) {
                    continue;
                }
                let expected = originals[field.index()];
                let actual = self.store.get(field);
                if expected != actual {
                    self.store.restore_values(originals);
                    debug!(%field, expected, actual, "strict recomputation changed a field");
                    return Err(CalendarError::NonLenientFieldMismatch {
                        field,
                        expected,
                        actual,
                    });
                }
            }
        }

        self.store.set_fields_normalized(computed);
        Ok(())
    }

    /// Normalized year from ERA and YEAR, plus the era-relative pair for
    /// era systems.
    fn resolve_year(&mut self, mask: &mut FieldMask) -> Result<(i64, Option<(i32, i32)>)> {
        let era_set = self.store.is_set(Field::Era);
        let year_set = self.store.is_set(Field::Year);

        if let CalendarSystem::Era(table) = &self.system {
            let (era, year) = match (era_set, year_set) {
                (true, true) => (self.store.get(Field::Era), self.store.get(Field::Year)),
                (true, false) => (self.store.get(Field::Era), 1),
                (false, true) => (table.newest(), self.store.get(Field::Year)),
                (false, false) => {
                    table.era_year_of(DateSystem::Gregorian.fixed_date(1970, 1, 1))
                }
            };
            if era < 0 || era > table.newest() {
                return Err(CalendarError::InvalidFieldValue {
                    field: Field::Era,
                    value: era,
                });
            }
            return Ok((table.normalized_year(era, year), Some((era, year))));
        }

        let year = if year_set {
            self.store.get(Field::Year)
        } else {
            1970
        };
        let era = if era_set {
            self.store.get(Field::Era)
        } else {
            CE
        };
        let normalized = match era {
            BCE => 1 - i64::from(year),
            CE => i64::from(year),
            value => {
                return Err(CalendarError::InvalidFieldValue {
                    field: Field::Era,
                    value,
                });
            }
        };
        if normalized <= 0 && !era_set {
            *mask |= Field::Era.mask();
            self.store.mark_computed(Field::Era);
        }
        Ok((normalized, None))
    }

    /// Milliseconds into the day from the selected hour fields and the
    /// minute, second and millisecond fields. May exceed one day or be
    /// negative in lenient mode.
    fn time_of_day_from_fields(&self, mask: FieldMask) -> i64 {
        let get = |field| i64::from(self.store.get(field));
        let hours = if mask.contains(Field::HourOfDay) {
            get(Field::HourOfDay)
        } else if mask.contains(Field::AmPm) {
            get(Field::Hour) + 12 * get(Field::AmPm)
        } else {
            get(Field::Hour)
        };
        ((hours * 60 + get(Field::Minute)) * 60 + get(Field::Second)) * 1000
            + get(Field::Millisecond)
    }

    /// Pick the Julian or Gregorian reading of the fields around a cutover.
    fn hybrid_fixed_date(
        &self,
        cutover: Cutover,
        year: i64,
        mask: FieldMask,
        days: i64,
    ) -> Result<i64> {
        let boundary = cutover.fixed_date();
        let cutover_year = i64::from(cutover.year());
        let julian_cutover_year = i64::from(cutover.julian_year());
        let gregorian =
            || days + self.fixed_date_from_fields(DateSystem::Gregorian, year, mask, None);
        let julian = || days + self.fixed_date_from_fields(DateSystem::Julian, year, mask, None);

        let (gfd, jfd) = if year > cutover_year && year > julian_cutover_year {
            let gfd = gregorian();
            if gfd >= boundary {
                return Ok(gfd);
            }
            (gfd, julian())
        } else if year < cutover_year && year < julian_cutover_year {
            let jfd = julian();
            if jfd < boundary {
                return Ok(jfd);
            }
            (jfd, jfd)
        } else {
            (gregorian(), julian())
        };

        if mask.contains(Field::DayOfYear) || mask.contains(Field::WeekOfYear) {
            if cutover_year == julian_cutover_year {
                return Ok(jfd);
            }
            if year == cutover_year {
                return Ok(gfd);
            }
        }

        if gfd >= boundary {
            if jfd >= boundary {
                return Ok(gfd);
            }
            // Both readings exist; stay in the system of the last computation.
            debug!(year, gfd, jfd, "wall date exists in both Julian and Gregorian");
            return Ok(if self.last_system == Some(DateSystem::Julian) {
                jfd
            } else {
                gfd
            });
        }
        if jfd < boundary {
            return Ok(jfd);
        }

        if !self.lenient {
            return Err(CalendarError::NonexistentDate(format!(
                "year {year} date falls in the cutover gap"
            )));
        }
        debug!(year, jfd, "wall date falls in the cutover gap; using Julian reading");
        Ok(jfd)
    }

    /// Fixed date of the selected date fields in one date system, before
    /// adding any whole days carried over from the time of day.
    fn fixed_date_from_fields(
        &self,
        system: DateSystem,
        year: i64,
        mask: FieldMask,
        era: Option<(i32, i32)>,
    ) -> i64 {
        let get = |field| i64::from(self.store.get(field));
        let mut year = year;
        let mut month = i64::from(JANUARY);
        if mask.contains(Field::Month) {
            month = get(Field::Month);
            year += month.div_euclid(12);
            month = month.rem_euclid(12);
        }

        // The first year of an era begins on its since-date.
        let mut first_day = 1;
        if let (Some((index, 1)), CalendarSystem::Era(table)) = (era, &self.system) {
            if let Some(since) = table.era(index).filter(|_| index > 0).map(|e| e.since_date()) {
                let since_month = i64::from(since.month) - 1;
                if !mask.contains(Field::Month) || !self.store.is_set(Field::Month) {
                    month = since_month;
                }
                if month == since_month && year == i64::from(since.year) {
                    first_day = i64::from(since.day);
                }
            }
        }

        let mut fixed_date = system.fixed_date(year, (month + 1) as u32, first_day);

        if mask.contains(Field::Month) {
            // Weeks of the month holding the cutover gap count from its
            // hybrid first day.
            let gap = match (&self.system, system) {
                (CalendarSystem::Hybrid(cutover), DateSystem::Gregorian) => {
                    cutover.gap_month(year, (month + 1) as u32)
                }
                _ => None,
            };
            if mask.contains(Field::DayOfMonth) {
                if self.store.is_set(Field::DayOfMonth) {
                    fixed_date += get(Field::DayOfMonth) - first_day;
                }
            } else if mask.contains(Field::WeekOfMonth) {
                let day1 = gap.map_or(fixed_date, |(start, _)| start);
                let mut first = self.week.first_week_start(day1);
                if mask.contains(Field::DayOfWeek) {
                    first = day_of_week_on_or_before(first + 6, self.store.get(Field::DayOfWeek));
                }
                fixed_date = first + 7 * (get(Field::WeekOfMonth) - 1);
            } else {
                let dow = if mask.contains(Field::DayOfWeek) {
                    self.store.get(Field::DayOfWeek)
                } else {
                    self.week.first_day_of_week
                };
                let dowim = if mask.contains(Field::DayOfWeekInMonth) {
                    get(Field::DayOfWeekInMonth)
                } else {
                    1
                };
                // Counted from the 1st, even when an era begins mid-month.
                let (month1, length) = gap.unwrap_or_else(|| {
                    let length = system.month_length(year, (month + 1) as u32);
                    (fixed_date - (first_day - 1), length)
                });
                if dowim >= 0 {
                    fixed_date = day_of_week_on_or_before(month1 + 7 * dowim - 1, dow);
                } else {
                    // Counted back from the last day of the month.
                    let last = length + 7 * (dowim + 1);
                    fixed_date = day_of_week_on_or_before(month1 + last - 1, dow);
                }
            }
            return fixed_date;
        }

        if let CalendarSystem::Hybrid(cutover) = &self.system {
            if system == DateSystem::Gregorian
                && year == i64::from(cutover.year())
                && fixed_date < cutover.fixed_date()
                && cutover.year() != cutover.julian_year()
            {
                fixed_date = cutover.fixed_date();
            }
        }

        if mask.contains(Field::DayOfYear) {
            return fixed_date + get(Field::DayOfYear) - 1;
        }

        let mut first = self.week.first_week_start(fixed_date);
        if mask.contains(Field::DayOfWeek) {
            let dow = self.store.get(Field::DayOfWeek);
            if dow != self.week.first_day_of_week {
                first = day_of_week_on_or_before(first + 6, dow);
            }
        }
        first + 7 * (get(Field::WeekOfYear) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_date::EPOCH_OFFSET;
    use crate::models::*;
    use crate::tz::parse_tz;
    use crate::week::WeekRules;

    const HEISEI: i32 = 4;
    const SHOWA: i32 = 3;

    fn utc_millis(y: i64, m: u32, d: i64) -> i64 {
        (DateSystem::Gregorian.fixed_date(y, m, d) - EPOCH_OFFSET) * ONE_DAY
    }

    #[test]
    fn split_local_carries_across_midnight() {
        assert_eq!(split_local(ONE_DAY - 1, 1), (EPOCH_OFFSET + 1, 0));
        assert_eq!(split_local(0, -1), (EPOCH_OFFSET - 1, ONE_DAY - 1));
        let (fd, _) = split_local(i64::MAX, 14 * ONE_HOUR);
        assert!(fd > EPOCH_OFFSET);
    }

    #[test]
    fn fields_from_time() {
        let mut cal = Calendar::gregorian().at(utc_millis(2024, 2, 29) + 13 * ONE_HOUR + 5);
        let f = cal.fields().unwrap();
        assert_eq!((f.era, f.year, f.month, f.day_of_month), (CE, 2024, FEBRUARY, 29));
        assert_eq!(f.day_of_week, THURSDAY);
        assert_eq!(f.day_of_year, 60);
        assert_eq!(f.day_of_week_in_month, 5);
        assert_eq!((f.am_pm, f.hour, f.hour_of_day), (PM, 1, 13));
        assert_eq!(f.millisecond, 5);
    }

    #[test]
    fn negative_time_values() {
        let mut cal = Calendar::gregorian().at(-1);
        let f = cal.fields().unwrap();
        assert_eq!((f.year, f.month, f.day_of_month), (1969, DECEMBER, 31));
        assert_eq!((f.hour_of_day, f.minute, f.second, f.millisecond), (23, 59, 59, 999));
    }

    #[test]
    fn iso_week_of_year_at_year_end() {
        let mut cal = Calendar::gregorian().with_week_rules(WeekRules::ISO);
        cal.set_time_in_millis(utc_millis(2024, 12, 31));
        assert_eq!(cal.get(Field::WeekOfYear).unwrap(), 1);
        cal.set_time_in_millis(utc_millis(2021, 12, 31));
        assert_eq!(cal.get(Field::WeekOfYear).unwrap(), 52);
        cal.set_time_in_millis(utc_millis(2021, 1, 1));
        assert_eq!(cal.get(Field::WeekOfYear).unwrap(), 53);
    }

    #[test]
    fn month_overflow_carries_into_year() {
        let mut cal = Calendar::gregorian();
        cal.set_date(2023, 13, 1);
        assert_eq!(cal.get(Field::Year).unwrap(), 2024);
        assert_eq!(cal.get(Field::Month).unwrap(), FEBRUARY);

        cal.set_date(2023, -1, 1);
        assert_eq!(cal.get(Field::Year).unwrap(), 2022);
        assert_eq!(cal.get(Field::Month).unwrap(), DECEMBER);
    }

    #[test]
    fn week_of_month_with_day_of_week() {
        let mut cal = Calendar::gregorian();
        cal.set(Field::Year, 2024);
        cal.set(Field::Month, MARCH);
        cal.set(Field::WeekOfMonth, 2);
        cal.set(Field::DayOfWeek, MONDAY);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 4);
    }

    #[test]
    fn last_weekday_of_month() {
        let mut cal = Calendar::gregorian();
        cal.set(Field::Year, 2024);
        cal.set(Field::Month, MAY);
        cal.set(Field::DayOfWeek, FRIDAY);
        cal.set(Field::DayOfWeekInMonth, -1);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 31);

        cal.set(Field::DayOfWeekInMonth, 2);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 10);
    }

    #[test]
    fn iso_week_date_fields() {
        let mut cal = Calendar::gregorian().with_week_rules(WeekRules::ISO);
        cal.set(Field::Year, 2024);
        cal.set(Field::WeekOfYear, 10);
        cal.set(Field::DayOfWeek, WEDNESDAY);
        assert_eq!(cal.get(Field::Month).unwrap(), MARCH);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 6);
    }

    #[test]
    fn julian_side_of_cutover() {
        let mut cal = Calendar::hybrid();
        cal.set_date(1582, OCTOBER, 4);
        assert_eq!(cal.get(Field::DayOfWeek).unwrap(), THURSDAY);
        cal.set_date(1582, OCTOBER, 15);
        assert_eq!(cal.get(Field::DayOfWeek).unwrap(), FRIDAY);
        assert_eq!(cal.get(Field::DayOfYear).unwrap(), 278);

        let mut cal = Calendar::hybrid();
        cal.set_date(1500, FEBRUARY, 29);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 29);
    }

    #[test]
    fn cutover_gap_lenient_uses_julian_reading() {
        let mut cal = Calendar::hybrid();
        cal.set_date(1582, OCTOBER, 10);
        assert_eq!(cal.get(Field::Month).unwrap(), OCTOBER);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 20);
    }

    #[test]
    fn cutover_gap_strict_is_nonexistent() {
        let mut cal = Calendar::hybrid().with_lenient(false);
        cal.set_date(1582, OCTOBER, 10);
        assert!(matches!(
            cal.get(Field::DayOfMonth),
            Err(CalendarError::NonexistentDate(_))
        ));
    }

    #[test]
    fn day_of_year_in_cutover_year() {
        let mut cal = Calendar::hybrid();
        cal.set(Field::Year, 1582);
        cal.set(Field::DayOfYear, 278);
        assert_eq!(cal.get(Field::Month).unwrap(), OCTOBER);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 15);
    }

    #[test]
    fn cutover_year_crossing_new_year() {
        // Gregorian 1800-01-10 follows Julian 1799-12-28.
        let mut cal = Calendar::hybrid();
        cal.set_cutover(utc_millis(1800, 1, 10)).unwrap();
        cal.clear_all();
        cal.set(Field::Year, 1800);
        cal.set(Field::DayOfYear, 1);
        assert_eq!(cal.get(Field::Month).unwrap(), JANUARY);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 10);
    }

    #[test]
    fn era_first_year_starts_on_since_date() {
        let mut cal = Calendar::japanese();
        cal.set(Field::Era, HEISEI);
        cal.set(Field::Year, 1);
        assert_eq!(cal.get(Field::Month).unwrap(), JANUARY);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 8);
        assert_eq!(cal.get(Field::DayOfYear).unwrap(), 1);

        cal.set(Field::DayOfYear, 3);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 10);
    }

    #[test]
    fn era_day_of_week_in_month_counts_from_first() {
        // Heisei began on January 8, 1989; January 28 is still the fourth
        // Saturday of the month.
        let mut source = Calendar::japanese().at(utc_millis(1989, 1, 28));
        let f = source.fields().unwrap();
        assert_eq!((f.era, f.year, f.month), (HEISEI, 1, JANUARY));
        assert_eq!((f.day_of_week, f.day_of_week_in_month), (SATURDAY, 4));

        for lenient in [true, false] {
            let mut cal = Calendar::japanese().with_lenient(lenient);
            cal.set(Field::Era, HEISEI);
            cal.set(Field::Year, 1);
            cal.set(Field::Month, JANUARY);
            cal.set(Field::DayOfWeek, SATURDAY);
            cal.set(Field::DayOfWeekInMonth, 4);
            assert_eq!(cal.time_in_millis().unwrap(), utc_millis(1989, 1, 28));
            assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 28);
        }
    }

    /// Rebuild every day of `year` from each date field group on an empty
    /// calendar and check it resolves to the same instant.
    fn assert_date_groups_resolve(make: fn() -> Calendar, year: i64) {
        const GROUPS: [&[Field]; 4] = [
            &[Field::Month, Field::DayOfMonth],
            &[Field::DayOfYear],
            &[Field::Month, Field::DayOfWeek, Field::WeekOfMonth],
            &[Field::Month, Field::DayOfWeek, Field::DayOfWeekInMonth],
        ];
        let start = utc_millis(year, 1, 1);
        let end = utc_millis(year + 1, 1, 1);
        for millis in (start..end).step_by(ONE_DAY as usize) {
            let mut source = make().at(millis);
            for group in GROUPS {
                let mut cal = make();
                for &field in [Field::Era, Field::Year].iter().chain(group.iter()) {
                    cal.set(field, source.get(field).unwrap());
                }
                assert_eq!(
                    cal.time_in_millis().unwrap(),
                    millis,
                    "{group:?} from {:?}",
                    source.fields().unwrap()
                );
            }
        }
    }

    #[test]
    fn era_first_years_resolve_from_every_group() {
        // Taisho, Showa, Heisei and Reiwa each began mid-year.
        for year in [1912, 1926, 1989, 2019] {
            assert_date_groups_resolve(Calendar::japanese, year);
        }
    }

    #[test]
    fn cutover_year_resolves_from_every_group() {
        assert_date_groups_resolve(Calendar::hybrid, 1582);
    }

    #[test]
    fn cutover_month_weeks_count_from_julian_first() {
        // October 1582 runs Julian 1-4 then Gregorian 15-31; the 31st is
        // its third Sunday.
        let mut cal = Calendar::hybrid();
        cal.set(Field::Year, 1582);
        cal.set(Field::Month, OCTOBER);
        cal.set(Field::DayOfWeek, SUNDAY);
        cal.set(Field::DayOfWeekInMonth, 3);
        assert_eq!(cal.time_in_millis().unwrap(), utc_millis(1582, 10, 31));

        cal.set(Field::DayOfWeekInMonth, -1);
        assert_eq!(cal.time_in_millis().unwrap(), utc_millis(1582, 10, 31));
        assert_eq!(cal.actual_maximum(Field::DayOfWeekInMonth).unwrap(), 3);
    }

    #[test]
    fn era_fields_around_transition() {
        let mut cal = Calendar::japanese().at(utc_millis(1989, 1, 7));
        assert_eq!(cal.get(Field::Era).unwrap(), SHOWA);
        assert_eq!(cal.get(Field::Year).unwrap(), 64);
        cal.set_time_in_millis(utc_millis(1989, 1, 8));
        assert_eq!(cal.get(Field::Era).unwrap(), HEISEI);
        assert_eq!(cal.get(Field::Year).unwrap(), 1);

        let mut cal = Calendar::japanese();
        cal.set(Field::Era, HEISEI);
        cal.set_date(1, JANUARY, 10);
        assert_eq!(cal.time_in_millis().unwrap(), utc_millis(1989, 1, 10));
    }

    #[test]
    fn empty_era_calendar_is_epoch() {
        let mut cal = Calendar::japanese();
        assert_eq!(cal.time_in_millis().unwrap(), 0);
        assert_eq!(cal.get(Field::Era).unwrap(), SHOWA);
        assert_eq!(cal.get(Field::Year).unwrap(), 45);
    }

    #[test]
    fn year_without_era_uses_newest() {
        let mut cal = Calendar::japanese();
        cal.set_date(2, MAY, 1);
        assert_eq!(cal.time_in_millis().unwrap(), utc_millis(2020, 5, 1));
    }

    #[test]
    fn era_index_out_of_range() {
        let mut cal = Calendar::japanese();
        cal.set(Field::Era, 6);
        assert!(matches!(
            cal.get(Field::Year),
            Err(CalendarError::InvalidFieldValue { field: Field::Era, .. })
        ));
    }

    #[test]
    fn wall_time_in_dst_gap_moves_forward() {
        let mut cal = Calendar::gregorian().with_zone(parse_tz("Europe/Berlin").unwrap());
        cal.set_date_time(2026, MARCH, 29, 2, 30, 0);
        assert_eq!(
            cal.time_in_millis().unwrap(),
            utc_millis(2026, 3, 29) + ONE_HOUR + 30 * ONE_MINUTE
        );
        assert_eq!(cal.get(Field::HourOfDay).unwrap(), 3);
        assert_eq!(cal.get(Field::DstOffset).unwrap(), ONE_HOUR as i32);
    }

    #[test]
    fn ambiguous_wall_time_takes_first_occurrence() {
        let mut cal = Calendar::gregorian().with_zone(parse_tz("Europe/Berlin").unwrap());
        cal.set_date_time(2026, OCTOBER, 25, 2, 30, 0);
        assert_eq!(
            cal.time_in_millis().unwrap(),
            utc_millis(2026, 10, 25) + 30 * ONE_MINUTE
        );
        assert_eq!(cal.get(Field::DstOffset).unwrap(), ONE_HOUR as i32);
    }

    #[test]
    fn hours_overflow_into_next_day() {
        let mut cal = Calendar::gregorian();
        cal.set_date(2024, JANUARY, 31);
        cal.set(Field::HourOfDay, 25);
        assert_eq!(cal.get(Field::Month).unwrap(), FEBRUARY);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 1);
        assert_eq!(cal.get(Field::HourOfDay).unwrap(), 1);
    }
}
