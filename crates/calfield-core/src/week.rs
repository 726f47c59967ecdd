//! Week numbering rules.
//!
//! A week definition is a first day of week and the minimal number of days
//! the first week of a year or month must contain. Locale defaults come from
//! a small region table behind a process-wide read-through cache.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};
use crate::fixed_date::day_of_week_on_or_before;
use crate::models::{Field, MONDAY, SATURDAY, SUNDAY};

/// First day of week and minimal days in the first week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekRules {
    pub first_day_of_week: i32,
    pub minimal_days_in_first_week: i32,
}

impl Default for WeekRules {
    /// Sunday-first weeks where any partial week counts as week 1.
    fn default() -> Self {
        WeekRules {
            first_day_of_week: SUNDAY,
            minimal_days_in_first_week: 1,
        }
    }
}

impl WeekRules {
    /// Validated constructor.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::week::WeekRules;
    /// use calfield_core::models::MONDAY;
    ///
    /// let iso = WeekRules::new(MONDAY, 4).unwrap();
    /// assert_eq!(iso, WeekRules::ISO);
    /// assert!(WeekRules::new(8, 4).is_err());
    /// ```
    pub fn new(first_day_of_week: i32, minimal_days_in_first_week: i32) -> Result<Self> {
        if !(SUNDAY..=SATURDAY).contains(&first_day_of_week) {
            return Err(CalendarError::InvalidFieldValue {
                field: Field::DayOfWeek,
                value: first_day_of_week,
            });
        }
        if !(1..=7).contains(&minimal_days_in_first_week) {
            return Err(CalendarError::InvalidFieldValue {
                field: Field::WeekOfYear,
                value: minimal_days_in_first_week,
            });
        }
        Ok(WeekRules {
            first_day_of_week,
            minimal_days_in_first_week,
        })
    }

    pub const ISO: WeekRules = WeekRules {
        first_day_of_week: MONDAY,
        minimal_days_in_first_week: 4,
    };

    /// Week rules for a BCP 47 style locale tag such as `en-US` or `de_DE`.
    ///
    /// Results are cached per tag for the life of the process.
    pub fn for_locale(tag: &str) -> WeekRules {
        static CACHE: OnceLock<RwLock<HashMap<String, WeekRules>>> = OnceLock::new();
        let cache = CACHE.get_or_init(|| RwLock::new(HashMap::new()));

        let cached = cache.read().ok().and_then(|map| map.get(tag).copied());
        if let Some(rules) = cached {
            return rules;
        }

        let rules = rules_for_region(region_of(tag));
        // Concurrent fillers compute the same value; the last insert wins.
        if let Ok(mut map) = cache.write() {
            map.insert(tag.to_string(), rules);
        }
        rules
    }

    /// Fixed date on which week 1 of a period starting at `day1` begins.
    pub fn first_week_start(&self, day1: i64) -> i64 {
        let start = day_of_week_on_or_before(day1 + 6, self.first_day_of_week);
        if start - day1 >= i64::from(self.minimal_days_in_first_week) {
            start - 7
        } else {
            start
        }
    }

    /// Week number of `fixed_date` in the period starting at `day1`.
    ///
    /// Dates before week 1 get 0 or a negative number.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::fixed_date::DateSystem;
    /// use calfield_core::week::WeekRules;
    ///
    /// let jan1 = DateSystem::Gregorian.fixed_date(2021, 1, 1); // a Friday
    /// assert_eq!(WeekRules::ISO.week_number(jan1, jan1), 0);
    /// assert_eq!(WeekRules::ISO.week_number(jan1, jan1 + 3), 1);
    /// ```
    pub fn week_number(&self, day1: i64, fixed_date: i64) -> i32 {
        let first = self.first_week_start(day1);
        ((fixed_date - first).div_euclid(7) + 1) as i32
    }
}

fn region_of(tag: &str) -> Option<String> {
    tag.split(['-', '_'])
        .skip(1)
        .find(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|part| part.to_ascii_uppercase())
}

fn rules_for_region(region: Option<String>) -> WeekRules {
    const SUNDAY_FIRST: &[&str] = &[
        "AG", "AS", "BR", "BS", "BT", "BW", "BZ", "CA", "CN", "CO", "DM", "DO", "ET", "GT", "GU",
        "HK", "HN", "ID", "IL", "IN", "JM", "JP", "KE", "KH", "KR", "LA", "MH", "MM", "MO", "MT",
        "MX", "MZ", "NI", "NP", "PA", "PE", "PH", "PK", "PR", "PT", "PY", "SA", "SG", "SV", "TH",
        "TT", "TW", "UM", "US", "VE", "VI", "WS", "YE", "ZA", "ZW",
    ];
    const SATURDAY_FIRST: &[&str] = &[
        "AE", "AF", "BH", "DJ", "DZ", "EG", "IQ", "IR", "JO", "KW", "LY", "OM", "QA", "SD", "SY",
    ];
    const FOUR_DAY_FIRST_WEEK: &[&str] = &[
        "AD", "AN", "AT", "AX", "BE", "BG", "CH", "CZ", "DE", "DK", "EE", "ES", "FI", "FJ", "FO",
        "FR", "GB", "GF", "GG", "GI", "GP", "GR", "HU", "IE", "IM", "IS", "IT", "JE", "LI", "LT",
        "LU", "MC", "MQ", "NL", "NO", "PL", "RE", "RU", "SE", "SJ", "SK", "SM", "VA",
    ];

    let Some(region) = region else {
        return WeekRules {
            first_day_of_week: MONDAY,
            minimal_days_in_first_week: 1,
        };
    };
    let region = region.as_str();
    let first_day_of_week = if SUNDAY_FIRST.contains(&region) {
        SUNDAY
    } else if SATURDAY_FIRST.contains(&region) {
        SATURDAY
    } else {
        MONDAY
    };
    let minimal_days_in_first_week = if FOUR_DAY_FIRST_WEEK.contains(&region) {
        4
    } else {
        1
    };
    WeekRules {
        first_day_of_week,
        minimal_days_in_first_week,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_date::DateSystem;

    #[test]
    fn locale_defaults() {
        assert_eq!(WeekRules::for_locale("en-US"), WeekRules::default());
        assert_eq!(WeekRules::for_locale("de_DE"), WeekRules::ISO);
        assert_eq!(WeekRules::for_locale("ja-JP").first_day_of_week, SUNDAY);
        assert_eq!(WeekRules::for_locale("ar-EG").first_day_of_week, SATURDAY);
        assert_eq!(WeekRules::for_locale("zh-Hant-TW").first_day_of_week, SUNDAY);
    }

    #[test]
    fn locale_without_region() {
        let rules = WeekRules::for_locale("fr");
        assert_eq!(rules.first_day_of_week, MONDAY);
        assert_eq!(rules.minimal_days_in_first_week, 1);
    }

    #[test]
    fn locale_cache_is_stable() {
        let first = WeekRules::for_locale("sv-SE");
        let second = WeekRules::for_locale("sv-SE");
        assert_eq!(first, second);
        assert_eq!(first, WeekRules::ISO);
    }

    #[test]
    fn rejects_out_of_range_rules() {
        assert!(WeekRules::new(0, 1).is_err());
        assert!(WeekRules::new(SUNDAY, 0).is_err());
        assert!(WeekRules::new(SUNDAY, 8).is_err());
    }

    #[test]
    fn iso_week_numbers() {
        let g = DateSystem::Gregorian;
        // 2024-01-01 is a Monday: week 1 starts on Jan 1.
        let jan1 = g.fixed_date(2024, 1, 1);
        assert_eq!(WeekRules::ISO.first_week_start(jan1), jan1);
        assert_eq!(WeekRules::ISO.week_number(jan1, g.fixed_date(2024, 12, 29)), 52);

        // 2021-01-01 is a Friday: Jan 1..3 belong to the previous year.
        let jan1 = g.fixed_date(2021, 1, 1);
        assert_eq!(WeekRules::ISO.week_number(jan1, jan1 + 2), 0);
        assert_eq!(WeekRules::ISO.week_number(jan1, jan1 + 3), 1);
    }

    #[test]
    fn sunday_one_day_weeks() {
        let g = DateSystem::Gregorian;
        let rules = WeekRules::default();
        // 2021-01-01 is a Friday, so Jan 1 and 2 form week 1.
        let jan1 = g.fixed_date(2021, 1, 1);
        assert_eq!(rules.week_number(jan1, jan1), 1);
        assert_eq!(rules.week_number(jan1, jan1 + 1), 1);
        assert_eq!(rules.week_number(jan1, jan1 + 2), 2);
    }

    #[test]
    fn earlier_dates_floor_divide() {
        let g = DateSystem::Gregorian;
        let jan1 = g.fixed_date(2024, 1, 1);
        assert_eq!(WeekRules::ISO.week_number(jan1, jan1 - 1), 0);
        assert_eq!(WeekRules::ISO.week_number(jan1, jan1 - 8), -1);
    }
}
