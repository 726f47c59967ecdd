//! The calendar engine.
//!
//! A [`Calendar`] holds a millisecond time value and the 17 calendar fields,
//! and keeps the two consistent lazily: writing a field makes the time stale,
//! setting the time makes the fields stale, and any read goes through
//! [`Calendar::complete`] first.
//!
//! Conversion in both directions is in `compute`, bounds queries are in
//! `limits` and field arithmetic is in `arith`.

use std::cell::OnceCell;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CalendarConfig, SystemKind};
use crate::cutover::Cutover;
use crate::era::EraTable;
use crate::error::{CalendarError, Result};
use crate::fixed_date::{CalendarDate, DateSystem, is_gregorian_leap_year};
use crate::limits::ProbedLimits;
use crate::models::{
    BCE, CE, CalendarState, Field, FieldMask, FieldValues, JANUARY, STATE_VERSION,
};
use crate::store::{COMPUTED, FieldStore};
use crate::tz::{Zone, ZoneRules, parse_tz};
use crate::week::WeekRules;

/// The calendar system a [`Calendar`] converts dates with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CalendarSystem {
    /// Proleptic Gregorian with BCE/CE eras.
    Gregorian,
    /// Julian before the cutover, Gregorian from it on.
    Hybrid(Cutover),
    /// Proleptic Gregorian with era-relative year numbering.
    Era(EraTable),
}

impl Default for CalendarSystem {
    fn default() -> Self {
        CalendarSystem::Hybrid(Cutover::default())
    }
}

impl CalendarSystem {
    pub fn name(&self) -> &'static str {
        match self {
            CalendarSystem::Gregorian => "gregorian",
            CalendarSystem::Hybrid(_) => "hybrid",
            CalendarSystem::Era(_) => "era",
        }
    }

    pub fn date_from_fixed(&self, fixed_date: i64) -> (DateSystem, CalendarDate) {
        match self {
            CalendarSystem::Hybrid(c) => c.date_from_fixed(fixed_date),
            _ => (
                DateSystem::Gregorian,
                DateSystem::Gregorian.date_from_fixed(fixed_date),
            ),
        }
    }

    /// ERA and YEAR field values of a date.
    pub fn era_and_year(&self, fixed_date: i64, date: &CalendarDate) -> (i32, i32) {
        match self {
            CalendarSystem::Era(table) => table.era_year_of(fixed_date),
            _ if date.year <= 0 => (BCE, 1 - date.year),
            _ => (CE, date.year),
        }
    }

    pub fn year_start(&self, fixed_date: i64) -> i64 {
        match self {
            CalendarSystem::Gregorian => {
                let g = DateSystem::Gregorian;
                g.fixed_date(g.year_from_fixed(fixed_date), 1, 1)
            }
            CalendarSystem::Hybrid(c) => c.year_start(fixed_date),
            CalendarSystem::Era(t) => t.year_start(fixed_date),
        }
    }

    pub fn next_year_start(&self, fixed_date: i64) -> i64 {
        match self {
            CalendarSystem::Gregorian => {
                let g = DateSystem::Gregorian;
                g.fixed_date(g.year_from_fixed(fixed_date) + 1, 1, 1)
            }
            CalendarSystem::Hybrid(c) => c.next_year_start(fixed_date),
            CalendarSystem::Era(t) => t.next_year_start(fixed_date),
        }
    }

    pub fn month_start(&self, fixed_date: i64) -> i64 {
        match self {
            CalendarSystem::Gregorian => {
                let day = DateSystem::Gregorian.date_from_fixed(fixed_date).day;
                fixed_date - i64::from(day) + 1
            }
            CalendarSystem::Hybrid(c) => c.month_start(fixed_date),
            CalendarSystem::Era(t) => t.month_start(fixed_date),
        }
    }

    pub fn next_month_start(&self, fixed_date: i64) -> i64 {
        match self {
            CalendarSystem::Gregorian => {
                let g = DateSystem::Gregorian;
                let date = g.date_from_fixed(fixed_date);
                fixed_date - i64::from(date.day)
                    + 1
                    + g.month_length(i64::from(date.year), date.month)
            }
            CalendarSystem::Hybrid(c) => c.next_month_start(fixed_date),
            CalendarSystem::Era(t) => t.next_month_start(fixed_date),
        }
    }

    /// First day of normalized year `year`.
    pub fn first_day_of_year(&self, year: i64) -> i64 {
        match self {
            CalendarSystem::Hybrid(c) => c.first_day_of_year(year),
            _ => DateSystem::Gregorian.fixed_date(year, 1, 1),
        }
    }

    /// True when the year containing `fixed_date` starts and ends on the
    /// January 1 dates of its own date system.
    pub fn is_regular_year(&self, fixed_date: i64) -> bool {
        let (system, date) = self.date_from_fixed(fixed_date);
        let year = i64::from(date.year);
        self.year_start(fixed_date) == system.fixed_date(year, 1, 1)
            && self.next_year_start(fixed_date) == system.fixed_date(year + 1, 1, 1)
    }

    /// True when the month containing `fixed_date` has its full length.
    pub fn is_regular_month(&self, fixed_date: i64) -> bool {
        let (system, date) = self.date_from_fixed(fixed_date);
        let month1 = fixed_date - i64::from(date.day) + 1;
        self.month_start(fixed_date) == month1
            && self.next_month_start(fixed_date)
                == month1 + system.month_length(i64::from(date.year), date.month)
    }

    pub fn is_week_date_supported(&self) -> bool {
        !matches!(self, CalendarSystem::Era(_))
    }
}

/// A calendar instance: a time value, its 17 fields and the rules that
/// connect them.
///
/// Not synchronized; confine an instance to one owner or guard it
/// externally. Cloning produces an independent copy.
#[derive(Debug, Clone)]
pub struct Calendar {
    pub(crate) store: FieldStore,
    pub(crate) time: i64,
    pub(crate) is_time_set: bool,
    pub(crate) lenient: bool,
    pub(crate) week: WeekRules,
    pub(crate) zone: Zone,
    pub(crate) system: CalendarSystem,
    /// Date system of the last field computation; used to disambiguate
    /// wall dates that exist on both sides of a cutover.
    pub(crate) last_system: Option<DateSystem>,
    pub(crate) limits: OnceCell<ProbedLimits>,
}

impl Default for Calendar {
    fn default() -> Self {
        Calendar::new(CalendarSystem::default())
    }
}

impl Calendar {
    /// An empty, lenient calendar in UTC with Sunday-first weeks.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::prelude::*;
    ///
    /// let mut cal = Calendar::new(CalendarSystem::Gregorian);
    /// cal.set_date(2024, FEBRUARY, 29);
    /// assert_eq!(cal.get(Field::DayOfWeek).unwrap(), THURSDAY);
    /// ```
    pub fn new(system: CalendarSystem) -> Calendar {
        Calendar {
            store: FieldStore::new(),
            time: 0,
            is_time_set: false,
            lenient: true,
            week: WeekRules::default(),
            zone: Zone::utc(),
            system,
            last_system: None,
            limits: OnceCell::new(),
        }
    }

    pub fn gregorian() -> Calendar {
        Calendar::new(CalendarSystem::Gregorian)
    }

    pub fn hybrid() -> Calendar {
        Calendar::new(CalendarSystem::Hybrid(Cutover::default()))
    }

    pub fn japanese() -> Calendar {
        Calendar::new(CalendarSystem::Era(EraTable::japanese()))
    }

    pub fn with_zone(mut self, zone: Zone) -> Calendar {
        self.set_zone(zone);
        self
    }

    pub fn with_week_rules(mut self, rules: WeekRules) -> Calendar {
        self.set_week_rules(rules);
        self
    }

    pub fn with_lenient(mut self, lenient: bool) -> Calendar {
        self.lenient = lenient;
        self
    }

    /// A calendar set to `millis`.
    pub fn at(mut self, millis: i64) -> Calendar {
        self.set_time_in_millis(millis);
        self
    }

    /// Build a calendar from configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - System, zone, week and leniency settings
    ///
    /// # Returns
    ///
    /// An empty calendar, or an error if the zone, week rules or cutover
    /// setting are invalid.
    pub fn from_config(config: &CalendarConfig) -> Result<Calendar> {
        let system = match config.system {
            SystemKind::Gregorian => CalendarSystem::Gregorian,
            SystemKind::Hybrid => CalendarSystem::Hybrid(
                config.cutover.map(Cutover::new).unwrap_or_default(),
            ),
            SystemKind::Japanese => CalendarSystem::Era(EraTable::japanese()),
        };
        if config.cutover.is_some() && config.system != SystemKind::Hybrid {
            return Err(CalendarError::UnsupportedOperation {
                operation: "cutover",
                calendar: system.name().to_string(),
            });
        }

        let mut week = config
            .locale
            .as_deref()
            .map(WeekRules::for_locale)
            .unwrap_or_default();
        if config.first_day_of_week.is_some() || config.minimal_days_in_first_week.is_some() {
            week = WeekRules::new(
                config.first_day_of_week.unwrap_or(week.first_day_of_week),
                config
                    .minimal_days_in_first_week
                    .unwrap_or(week.minimal_days_in_first_week),
            )?;
        }

        Ok(Calendar::new(system)
            .with_zone(parse_tz(&config.zone)?)
            .with_week_rules(week)
            .with_lenient(config.lenient))
    }

    pub fn system(&self) -> &CalendarSystem {
        &self.system
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Replace the zone. The time value is kept; fields are recomputed.
    pub fn set_zone(&mut self, zone: Zone) {
        self.zone = zone;
        self.store.set_unnormalized();
    }

    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    pub fn set_lenient(&mut self, lenient: bool) {
        self.lenient = lenient;
    }

    pub fn week_rules(&self) -> WeekRules {
        self.week
    }

    pub fn set_week_rules(&mut self, rules: WeekRules) {
        if self.week == rules {
            return;
        }
        self.week = rules;
        self.limits = OnceCell::new();
        self.invalidate_week_fields();
    }

    pub fn first_day_of_week(&self) -> i32 {
        self.week.first_day_of_week
    }

    pub fn set_first_day_of_week(&mut self, value: i32) -> Result<()> {
        let rules = WeekRules::new(value, self.week.minimal_days_in_first_week)?;
        self.set_week_rules(rules);
        Ok(())
    }

    pub fn minimal_days_in_first_week(&self) -> i32 {
        self.week.minimal_days_in_first_week
    }

    pub fn set_minimal_days_in_first_week(&mut self, value: i32) -> Result<()> {
        let rules = WeekRules::new(self.week.first_day_of_week, value)?;
        self.set_week_rules(rules);
        Ok(())
    }

    /// Recompute computed week fields under new week rules, leaving
    /// caller-set values alone.
    fn invalidate_week_fields(&mut self) {
        let wom_computed = self.store.stamp(Field::WeekOfMonth) == COMPUTED;
        let woy_computed = self.store.stamp(Field::WeekOfYear) == COMPUTED;
        if !wom_computed && !woy_computed {
            return;
        }
        let mut probe = self.clone();
        probe.lenient = true;
        probe.clear(Field::WeekOfMonth);
        probe.clear(Field::WeekOfYear);
        if wom_computed {
            if let Ok(value) = probe.get(Field::WeekOfMonth) {
                self.store.set_internal(Field::WeekOfMonth, value);
            }
        }
        if woy_computed {
            if let Ok(value) = probe.get(Field::WeekOfYear) {
                self.store.set_internal(Field::WeekOfYear, value);
            }
        }
    }

    /// The cutover instant of a hybrid calendar.
    pub fn cutover(&self) -> Option<i64> {
        match &self.system {
            CalendarSystem::Hybrid(c) => Some(c.instant()),
            _ => None,
        }
    }

    /// Move the Julian/Gregorian cutover.
    ///
    /// The current time is resolved first and kept; fields are recomputed
    /// under the new cutover on the next read.
    pub fn set_cutover(&mut self, instant: i64) -> Result<()> {
        if !matches!(self.system, CalendarSystem::Hybrid(_)) {
            return Err(CalendarError::UnsupportedOperation {
                operation: "set_cutover",
                calendar: self.system.name().to_string(),
            });
        }
        if self.cutover() == Some(instant) {
            return Ok(());
        }
        self.complete()?;
        let cutover = Cutover::new(instant);
        debug!(
            instant,
            fixed_date = cutover.fixed_date(),
            year = cutover.year(),
            julian_year = cutover.julian_year(),
            "cutover changed"
        );
        self.system = CalendarSystem::Hybrid(cutover);
        self.limits = OnceCell::new();
        self.last_system = None;
        self.store.set_unnormalized();
        Ok(())
    }

    /// Leap year test for a normalized year under this calendar's rules.
    pub fn is_leap_year(&self, year: i32) -> bool {
        match &self.system {
            CalendarSystem::Hybrid(c) => c.is_leap_year(year),
            _ => is_gregorian_leap_year(i64::from(year)),
        }
    }

    /// Read a field, resolving time and fields first.
    pub fn get(&mut self, field: Field) -> Result<i32> {
        self.complete()?;
        Ok(self.store.get(field))
    }

    /// Write a field. Nothing is validated until the next read.
    pub fn set(&mut self, field: Field, value: i32) {
        if self.is_time_set
            && (self.store.is_partially_normalized() || !self.store.are_fields_set())
        {
            self.compute_all_fields();
        }
        self.store.set(field, value);
        self.is_time_set = false;
    }

    /// Set YEAR, MONTH (0-based) and DAY_OF_MONTH.
    pub fn set_date(&mut self, year: i32, month: i32, day_of_month: i32) {
        self.set(Field::Year, year);
        self.set(Field::Month, month);
        self.set(Field::DayOfMonth, day_of_month);
    }

    /// Set the date plus HOUR_OF_DAY, MINUTE and SECOND.
    pub fn set_date_time(
        &mut self,
        year: i32,
        month: i32,
        day_of_month: i32,
        hour_of_day: i32,
        minute: i32,
        second: i32,
    ) {
        self.set_date(year, month, day_of_month);
        self.set(Field::HourOfDay, hour_of_day);
        self.set(Field::Minute, minute);
        self.set(Field::Second, second);
    }

    pub fn clear(&mut self, field: Field) {
        if self.is_time_set && !self.store.are_fields_set() {
            self.compute_all_fields();
        }
        self.store.clear(field);
        self.is_time_set = false;
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.is_time_set = false;
    }

    pub fn is_set(&self, field: Field) -> bool {
        self.store.is_set(field)
    }

    pub fn is_externally_set(&self, field: Field) -> bool {
        self.store.is_externally_set(field)
    }

    /// Bring time and all fields into a consistent state.
    pub fn complete(&mut self) -> Result<()> {
        if !self.is_time_set {
            if let Err(err) = self.compute_time() {
                self.store.set_unnormalized();
                return Err(err);
            }
            self.is_time_set = true;
        }
        if !self.store.is_fully_normalized() {
            self.compute_all_fields();
            self.store.set_fully_normalized();
        }
        Ok(())
    }

    /// The time value, computed from the fields if they were written last.
    pub fn time_in_millis(&mut self) -> Result<i64> {
        if !self.is_time_set {
            if let Err(err) = self.compute_time() {
                self.store.set_unnormalized();
                return Err(err);
            }
            self.is_time_set = true;
        }
        Ok(self.time)
    }

    /// Set the time value. Fields are recomputed on the next read.
    pub fn set_time_in_millis(&mut self, millis: i64) {
        if self.time == millis && self.is_time_set && self.store.is_fully_normalized() {
            return;
        }
        self.time = millis;
        self.is_time_set = true;
        self.store.set_unnormalized();
    }

    /// Set the time value and recompute every field immediately.
    pub(crate) fn set_time_and_compute(&mut self, millis: i64) {
        self.time = millis;
        self.is_time_set = true;
        self.compute_fields(FieldMask::ALL, FieldMask::EMPTY);
        self.store.set_fields_computed(FieldMask::ALL);
    }

    pub fn instant(&mut self) -> Result<DateTime<Utc>> {
        let millis = self.time_in_millis()?;
        DateTime::from_timestamp_millis(millis).ok_or(CalendarError::InstantOutOfRange(millis))
    }

    pub fn set_instant(&mut self, instant: DateTime<Utc>) {
        self.set_time_in_millis(instant.timestamp_millis());
    }

    /// A consistent snapshot of all 17 fields.
    pub fn fields(&mut self) -> Result<FieldValues> {
        self.complete()?;
        Ok(FieldValues::from_array(self.store.values()))
    }

    /// Normalized year of the current week date.
    pub fn week_year(&mut self) -> Result<i32> {
        self.require_week_dates("week_year")?;
        self.complete()?;
        Ok(self.week_year_at(self.local_fixed_date()) as i32)
    }

    pub fn is_week_date_supported(&self) -> bool {
        self.system.is_week_date_supported()
    }

    /// Set the date from a week year, week of year and day of week.
    ///
    /// The time of day is kept. In strict mode a week date that does not
    /// exist in `week_year` is rejected.
    pub fn set_week_date(&mut self, week_year: i32, week_of_year: i32, day_of_week: i32) -> Result<()> {
        self.require_week_dates("set_week_date")?;
        if !(crate::models::SUNDAY..=crate::models::SATURDAY).contains(&day_of_week) {
            return Err(CalendarError::InvalidFieldValue {
                field: Field::DayOfWeek,
                value: day_of_week,
            });
        }
        self.complete()?;

        let start = self.week.first_week_start(self.system.first_day_of_year(i64::from(week_year)));
        let days = i64::from((day_of_week - self.week.first_day_of_week).rem_euclid(7))
            + 7 * (i64::from(week_of_year) - 1);
        let fixed_date = start + days;

        if !self.lenient {
            let actual_year = self.week_year_at(fixed_date);
            let actual_week = self.week_of_year_at(fixed_date);
            if actual_year != i64::from(week_year) {
                return Err(CalendarError::NonLenientFieldMismatch {
                    field: Field::Year,
                    expected: week_year,
                    actual: actual_year as i32,
                });
            }
            if actual_week != week_of_year {
                return Err(CalendarError::NonLenientFieldMismatch {
                    field: Field::WeekOfYear,
                    expected: week_of_year,
                    actual: actual_week,
                });
            }
        }

        self.set_date_fields(fixed_date);
        self.complete()
    }

    /// Number of weeks in the current week year.
    pub fn weeks_in_week_year(&mut self) -> Result<i32> {
        self.require_week_dates("weeks_in_week_year")?;
        self.complete()?;
        let fixed_date = self.local_fixed_date();
        let week_year = self.week_year_at(fixed_date);
        let (_, date) = self.system.date_from_fixed(fixed_date);
        if week_year == i64::from(date.year) {
            return Ok(self.actual_maximum_at(Field::WeekOfYear, fixed_date, 0));
        }
        // Measure from a date inside week 2 of the week year.
        let week2 = self.week.first_week_start(self.system.first_day_of_year(week_year)) + 7;
        Ok(self.actual_maximum_at(Field::WeekOfYear, week2, 0))
    }

    fn require_week_dates(&self, operation: &str) -> Result<()> {
        if self.system.is_week_date_supported() {
            Ok(())
        } else {
            Err(CalendarError::UnsupportedWeekDate(format!(
                "{} ({operation})",
                self.system.name()
            )))
        }
    }

    /// Write ERA, YEAR, MONTH and DAY_OF_MONTH for a fixed date.
    pub(crate) fn set_date_fields(&mut self, fixed_date: i64) {
        let (_, date) = self.system.date_from_fixed(fixed_date);
        let (era, year) = self.system.era_and_year(fixed_date, &date);
        self.set(Field::Era, era);
        self.set(Field::Year, year);
        self.set(Field::Month, date.month as i32 - 1 + JANUARY);
        self.set(Field::DayOfMonth, date.day as i32);
    }

    /// The persisted form of this calendar.
    pub fn to_state(&self) -> CalendarState {
        CalendarState {
            version: STATE_VERSION,
            fields: *self.store.values(),
            is_set: Some(self.store.set_flags()),
            time: self.time,
            is_time_set: self.is_time_set,
            are_fields_set: self.store.are_fields_set(),
            lenient: self.lenient,
            first_day_of_week: self.week.first_day_of_week,
            minimal_days_in_first_week: self.week.minimal_days_in_first_week,
            zone: self.zone.id().to_string(),
            system: self.system.clone(),
        }
    }

    /// Rebuild a calendar from its persisted form.
    ///
    /// Stamps are not persisted: every set field comes back as computed.
    pub fn from_state(state: CalendarState) -> Result<Calendar> {
        let is_set = state
            .is_set
            .unwrap_or([state.are_fields_set; Field::COUNT]);
        let week = WeekRules::new(state.first_day_of_week, state.minimal_days_in_first_week)?;
        Ok(Calendar {
            store: FieldStore::restore(state.fields, is_set),
            time: state.time,
            is_time_set: state.is_time_set,
            lenient: state.lenient,
            week,
            zone: parse_tz(&state.zone)?,
            system: state.system,
            last_system: None,
            limits: OnceCell::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;

    fn utc_millis(y: i64, m: u32, d: i64) -> i64 {
        (DateSystem::Gregorian.fixed_date(y, m, d) - crate::fixed_date::EPOCH_OFFSET) * ONE_DAY
    }

    #[test]
    fn empty_calendar_resolves_to_epoch() {
        let mut cal = Calendar::gregorian();
        assert_eq!(cal.time_in_millis().unwrap(), 0);
        assert_eq!(cal.get(Field::Year).unwrap(), 1970);
        assert_eq!(cal.get(Field::DayOfWeek).unwrap(), THURSDAY);
    }

    #[test]
    fn lazy_time_setting() {
        let mut cal = Calendar::gregorian();
        cal.set_time_in_millis(utc_millis(2024, 3, 15));
        assert!(!cal.store.are_fields_set());
        assert_eq!(cal.get(Field::Month).unwrap(), MARCH);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 15);
        assert!(cal.store.is_fully_normalized());
    }

    #[test]
    fn set_after_lazy_time_keeps_other_fields() {
        let mut cal = Calendar::gregorian().at(utc_millis(2024, 3, 15));
        cal.set(Field::DayOfMonth, 20);
        assert_eq!(cal.get(Field::Month).unwrap(), MARCH);
        assert_eq!(cal.get(Field::Year).unwrap(), 2024);
        assert_eq!(cal.time_in_millis().unwrap(), utc_millis(2024, 3, 20));
    }

    #[test]
    fn precedence_follows_write_order() {
        let mut cal = Calendar::gregorian();
        cal.set(Field::Year, 2023);
        cal.set(Field::Month, JANUARY);
        cal.set(Field::DayOfMonth, 10);
        cal.set(Field::DayOfYear, 100);
        assert_eq!(cal.get(Field::Month).unwrap(), APRIL);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 10);
        assert_eq!(cal.get(Field::DayOfYear).unwrap(), 100);

        let mut cal = Calendar::gregorian();
        cal.set(Field::Year, 2023);
        cal.set(Field::DayOfYear, 100);
        cal.set(Field::Month, JANUARY);
        cal.set(Field::DayOfMonth, 10);
        assert_eq!(cal.get(Field::Month).unwrap(), JANUARY);
        assert_eq!(cal.get(Field::DayOfYear).unwrap(), 10);
    }

    #[test]
    fn strict_rejects_february_30() {
        let mut cal = Calendar::gregorian().with_lenient(false);
        cal.set_date(2023, FEBRUARY, 30);
        let err = cal.get(Field::DayOfMonth).unwrap_err();
        assert_eq!(
            err,
            CalendarError::NonLenientFieldMismatch {
                field: Field::Month,
                expected: FEBRUARY,
                actual: MARCH,
            }
        );
        // The caller's values survive the failed computation.
        assert_eq!(cal.store.get(Field::DayOfMonth), 30);
        assert_eq!(cal.store.get(Field::Month), FEBRUARY);
    }

    #[test]
    fn lenient_rolls_february_30_forward() {
        let mut cal = Calendar::gregorian();
        cal.set_date(2023, FEBRUARY, 30);
        assert_eq!(cal.get(Field::Month).unwrap(), MARCH);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 2);

        cal.set_date(2024, FEBRUARY, 30);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 1);
    }

    #[test]
    fn strict_rejects_out_of_range_value() {
        let mut cal = Calendar::gregorian().with_lenient(false);
        cal.set_date(2023, 12, 1);
        assert_eq!(
            cal.get(Field::Month),
            Err(CalendarError::InvalidFieldValue {
                field: Field::Month,
                value: 12,
            })
        );
    }

    #[test]
    fn bce_years() {
        let mut cal = Calendar::gregorian();
        cal.set(Field::Era, BCE);
        cal.set_date(1, JANUARY, 1);
        assert_eq!(
            cal.time_in_millis().unwrap(),
            (DateSystem::Gregorian.fixed_date(0, 1, 1) - crate::fixed_date::EPOCH_OFFSET) * ONE_DAY
        );
        assert_eq!(cal.get(Field::Era).unwrap(), BCE);
        assert_eq!(cal.get(Field::Year).unwrap(), 1);

        let mut cal = Calendar::gregorian();
        cal.set_date(0, JANUARY, 1);
        assert_eq!(cal.get(Field::Era).unwrap(), BCE);
        assert_eq!(cal.get(Field::Year).unwrap(), 1);
    }

    #[test]
    fn invalid_era_is_rejected() {
        let mut cal = Calendar::gregorian();
        cal.set(Field::Era, 2);
        assert_eq!(
            cal.get(Field::Year),
            Err(CalendarError::InvalidFieldValue {
                field: Field::Era,
                value: 2,
            })
        );
    }

    #[test]
    fn round_trip_keeps_selected_fields() {
        let mut cal = Calendar::hybrid().with_zone(parse_tz("America/New_York").unwrap());
        cal.set_date_time(2021, JUNE, 13, 17, 45, 12);
        cal.set(Field::Millisecond, 250);
        let first = cal.fields().unwrap();
        let millis = cal.time_in_millis().unwrap();

        let mut again = Calendar::hybrid()
            .with_zone(parse_tz("America/New_York").unwrap())
            .at(millis);
        assert_eq!(again.fields().unwrap(), first);
        assert_eq!(first.hour_of_day, 17);
        assert_eq!(first.dst_offset, 3_600_000);
    }

    #[test]
    fn zone_change_keeps_instant() {
        let mut cal = Calendar::gregorian().at(utc_millis(2024, 1, 1));
        assert_eq!(cal.get(Field::HourOfDay).unwrap(), 0);
        cal.set_zone(parse_tz("Asia/Tokyo").unwrap());
        assert_eq!(cal.get(Field::HourOfDay).unwrap(), 9);
        assert_eq!(cal.time_in_millis().unwrap(), utc_millis(2024, 1, 1));
    }

    #[test]
    fn user_zone_offset_overrides_zone() {
        let mut cal = Calendar::gregorian().with_zone(parse_tz("Europe/Berlin").unwrap());
        cal.set_date_time(2024, JULY, 1, 12, 0, 0);
        cal.set(Field::ZoneOffset, 0);
        cal.set(Field::DstOffset, 0);
        assert_eq!(
            cal.time_in_millis().unwrap(),
            utc_millis(2024, 7, 1) + 12 * ONE_HOUR
        );
    }

    #[test]
    fn hour_and_am_pm() {
        let mut cal = Calendar::gregorian();
        cal.set_date(2024, MAY, 5);
        cal.set(Field::Hour, 3);
        cal.set(Field::AmPm, PM);
        assert_eq!(cal.get(Field::HourOfDay).unwrap(), 15);
    }

    #[test]
    fn week_rules_change_recomputes_week_fields() {
        let mut cal = Calendar::gregorian().at(utc_millis(2021, 1, 3));
        assert_eq!(cal.get(Field::WeekOfYear).unwrap(), 2);
        cal.set_week_rules(WeekRules::ISO);
        assert_eq!(cal.get(Field::WeekOfYear).unwrap(), 53);
    }

    #[test]
    fn week_dates() {
        let mut cal = Calendar::gregorian().with_week_rules(WeekRules::ISO);
        cal.set_time_in_millis(utc_millis(2024, 12, 31));
        assert_eq!(cal.week_year().unwrap(), 2025);
        assert_eq!(cal.weeks_in_week_year().unwrap(), 52);

        cal.set_week_date(2020, 53, FRIDAY).unwrap();
        assert_eq!(cal.time_in_millis().unwrap(), utc_millis(2021, 1, 1));
        assert_eq!(cal.week_year().unwrap(), 2020);
        assert_eq!(cal.weeks_in_week_year().unwrap(), 53);
    }

    #[test]
    fn strict_week_date_rejects_missing_week() {
        let mut cal = Calendar::gregorian()
            .with_week_rules(WeekRules::ISO)
            .with_lenient(false);
        cal.set_time_in_millis(0);
        assert!(matches!(
            cal.set_week_date(2021, 53, MONDAY),
            Err(CalendarError::NonLenientFieldMismatch { .. })
        ));
        assert!(cal.set_week_date(2021, 52, MONDAY).is_ok());
    }

    #[test]
    fn era_calendar_has_no_week_dates() {
        let mut cal = Calendar::japanese();
        assert!(!cal.is_week_date_supported());
        assert!(matches!(
            cal.week_year(),
            Err(CalendarError::UnsupportedWeekDate(_))
        ));
        assert!(matches!(
            cal.set_week_date(2020, 1, MONDAY),
            Err(CalendarError::UnsupportedWeekDate(_))
        ));
    }

    #[test]
    fn set_cutover_only_for_hybrid() {
        let mut cal = Calendar::gregorian();
        assert!(matches!(
            cal.set_cutover(0),
            Err(CalendarError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn set_cutover_recomputes_fields() {
        let millis = utc_millis(1700, 1, 1);
        let mut cal = Calendar::hybrid().at(millis);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 1);

        // Pure Julian: Gregorian 1700-01-01 is Julian 1699-12-21.
        cal.set_cutover(i64::MAX).unwrap();
        assert_eq!(cal.time_in_millis().unwrap(), millis);
        assert_eq!(cal.get(Field::Year).unwrap(), 1699);
        assert_eq!(cal.get(Field::DayOfMonth).unwrap(), 21);
    }

    #[test]
    fn leap_years_follow_system() {
        assert!(Calendar::hybrid().is_leap_year(1500));
        assert!(!Calendar::gregorian().is_leap_year(1500));
        assert!(!Calendar::japanese().is_leap_year(1900));
    }

    #[test]
    fn persisted_state_round_trip() {
        let mut cal = Calendar::hybrid()
            .with_zone(parse_tz("Europe/Paris").unwrap())
            .with_week_rules(WeekRules::ISO);
        cal.set_date_time(1999, DECEMBER, 31, 23, 59, 59);
        cal.complete().unwrap();

        let json = serde_json::to_string(&cal.to_state()).unwrap();
        let state: CalendarState = serde_json::from_str(&json).unwrap();
        let mut back = Calendar::from_state(state).unwrap();

        assert_eq!(back.fields().unwrap(), cal.fields().unwrap());
        assert_eq!(back.time_in_millis().unwrap(), cal.time_in_millis().unwrap());
        assert_eq!(back.week_rules(), WeekRules::ISO);
        assert_eq!(back.zone().id(), "Europe/Paris");
        assert!(Field::ALL.iter().all(|f| !back.is_externally_set(*f)));
    }

    #[test]
    fn legacy_state_rebuilds_set_flags() {
        let mut cal = Calendar::gregorian().at(utc_millis(2020, 2, 2));
        cal.complete().unwrap();
        let mut state = cal.to_state();
        state.version = 0;
        state.is_set = None;
        state.is_time_set = false;

        let mut back = Calendar::from_state(state).unwrap();
        assert!(back.is_set(Field::DayOfMonth));
        assert_eq!(back.time_in_millis().unwrap(), utc_millis(2020, 2, 2));
    }

    #[test]
    fn from_config_applies_locale_and_overrides() {
        let config = CalendarConfig {
            system: SystemKind::Gregorian,
            zone: "Europe/Berlin".to_string(),
            locale: Some("en-US".to_string()),
            minimal_days_in_first_week: Some(4),
            lenient: false,
            ..CalendarConfig::default()
        };
        let cal = Calendar::from_config(&config).unwrap();
        assert_eq!(cal.first_day_of_week(), SUNDAY);
        assert_eq!(cal.minimal_days_in_first_week(), 4);
        assert!(!cal.is_lenient());
        assert_eq!(cal.zone().id(), "Europe/Berlin");
    }

    #[test]
    fn from_config_rejects_cutover_for_other_systems() {
        let config = CalendarConfig {
            system: SystemKind::Japanese,
            cutover: Some(0),
            ..CalendarConfig::default()
        };
        assert!(Calendar::from_config(&config).is_err());
    }

    #[test]
    fn clone_is_independent() {
        let mut cal = Calendar::gregorian().at(0);
        let mut copy = cal.clone();
        copy.set(Field::Year, 2000);
        assert_eq!(cal.get(Field::Year).unwrap(), 1970);
        assert_eq!(copy.get(Field::Year).unwrap(), 2000);
    }
}
