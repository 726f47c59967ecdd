//! Era-partitioned calendar system.
//!
//! Dates are proleptic Gregorian; the year number restarts at 1 on each
//! era's since-date. Index 0 is a synthetic era covering everything before
//! the first real era, and its years are plain normalized years.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};
use crate::fixed_date::{CalendarDate, DateSystem};

/// A named era starting at a fixed date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Era {
    pub name: String,
    pub abbreviation: String,
    /// First fixed date of the era. `i64::MIN` for the synthetic first era.
    pub since: i64,
}

impl Era {
    pub fn new(name: &str, abbreviation: &str, year: i64, month: u32, day: i64) -> Era {
        Era {
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
            since: DateSystem::Gregorian.fixed_date(year, month, day),
        }
    }

    /// Gregorian date of the since-date.
    pub fn since_date(&self) -> CalendarDate {
        DateSystem::Gregorian.date_from_fixed(self.since)
    }
}

/// An ordered, immutable era table shared between calendar clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Era>", into = "Vec<Era>")]
pub struct EraTable {
    eras: Arc<[Era]>,
}

impl EraTable {
    /// Build a table from eras in since-date order.
    ///
    /// The first entry is the synthetic leading era; its since-date is
    /// replaced with `i64::MIN`. Since-dates must be strictly increasing.
    pub fn new(mut eras: Vec<Era>) -> Result<EraTable> {
        let Some(first) = eras.first_mut() else {
            return Err(CalendarError::InvalidEraTable("no eras".to_string()));
        };
        first.since = i64::MIN;
        if let Some(pair) = eras.windows(2).find(|w| w[0].since >= w[1].since) {
            return Err(CalendarError::InvalidEraTable(format!(
                "{} does not start after {}",
                pair[1].name, pair[0].name
            )));
        }
        Ok(EraTable { eras: eras.into() })
    }

    /// The Japanese imperial eras from Meiji onwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::era::EraTable;
    ///
    /// let table = EraTable::japanese();
    /// assert_eq!(table.len(), 6);
    /// assert_eq!(table.era(4).unwrap().name, "Heisei");
    /// ```
    pub fn japanese() -> EraTable {
        EraTable {
            eras: Arc::from(vec![
                Era {
                    name: "BeforeMeiji".to_string(),
                    abbreviation: "BM".to_string(),
                    since: i64::MIN,
                },
                Era::new("Meiji", "M", 1868, 1, 1),
                Era::new("Taisho", "T", 1912, 7, 30),
                Era::new("Showa", "S", 1926, 12, 25),
                Era::new("Heisei", "H", 1989, 1, 8),
                Era::new("Reiwa", "R", 2019, 5, 1),
            ]),
        }
    }

    pub fn len(&self) -> usize {
        self.eras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eras.is_empty()
    }

    pub fn eras(&self) -> &[Era] {
        &self.eras
    }

    pub fn era(&self, index: i32) -> Option<&Era> {
        usize::try_from(index).ok().and_then(|i| self.eras.get(i))
    }

    pub fn newest(&self) -> i32 {
        self.eras.len() as i32 - 1
    }

    /// Index of the era containing a fixed date.
    pub fn era_index_of(&self, fixed_date: i64) -> i32 {
        let after = self.eras.partition_point(|e| e.since <= fixed_date);
        after.saturating_sub(1) as i32
    }

    /// Normalized year in which an era begins. The synthetic era reports 1.
    pub fn since_year(&self, index: i32) -> i32 {
        match self.era(index) {
            Some(era) if index > 0 => era.since_date().year,
            _ => 1,
        }
    }

    /// Normalized year of an era-relative year.
    pub fn normalized_year(&self, era: i32, year: i32) -> i64 {
        if era <= 0 {
            i64::from(year)
        } else {
            i64::from(self.since_year(era)) + i64::from(year) - 1
        }
    }

    /// Era index and era-relative year of a fixed date.
    pub fn era_year_of(&self, fixed_date: i64) -> (i32, i32) {
        let era = self.era_index_of(fixed_date);
        let year = DateSystem::Gregorian.year_from_fixed(fixed_date);
        if era == 0 {
            (0, year as i32)
        } else {
            (era, (year - i64::from(self.since_year(era)) + 1) as i32)
        }
    }

    /// Latest since-date in `[from, fixed_date]`, if any.
    fn since_within(&self, from: i64, fixed_date: i64) -> Option<i64> {
        let after = self.eras.partition_point(|e| e.since <= fixed_date);
        after
            .checked_sub(1)
            .map(|i| self.eras[i].since)
            .filter(|since| *since >= from)
    }

    /// Earliest since-date in `(fixed_date, until)`, if any.
    fn since_before(&self, fixed_date: i64, until: i64) -> Option<i64> {
        let after = self.eras.partition_point(|e| e.since <= fixed_date);
        self.eras
            .get(after)
            .map(|e| e.since)
            .filter(|since| *since < until)
    }

    pub fn year_start(&self, fixed_date: i64) -> i64 {
        let g = DateSystem::Gregorian;
        let jan1 = g.fixed_date(g.year_from_fixed(fixed_date), 1, 1);
        self.since_within(jan1, fixed_date).unwrap_or(jan1)
    }

    pub fn next_year_start(&self, fixed_date: i64) -> i64 {
        let g = DateSystem::Gregorian;
        let next = g.fixed_date(g.year_from_fixed(fixed_date) + 1, 1, 1);
        self.since_before(fixed_date, next).unwrap_or(next)
    }

    pub fn month_start(&self, fixed_date: i64) -> i64 {
        let date = DateSystem::Gregorian.date_from_fixed(fixed_date);
        let month1 = fixed_date - i64::from(date.day) + 1;
        self.since_within(month1, fixed_date).unwrap_or(month1)
    }

    pub fn next_month_start(&self, fixed_date: i64) -> i64 {
        let g = DateSystem::Gregorian;
        let date = g.date_from_fixed(fixed_date);
        let next = fixed_date - i64::from(date.day)
            + 1
            + g.month_length(i64::from(date.year), date.month);
        self.since_before(fixed_date, next).unwrap_or(next)
    }
}

impl TryFrom<Vec<Era>> for EraTable {
    type Error = CalendarError;

    fn try_from(eras: Vec<Era>) -> Result<Self> {
        EraTable::new(eras)
    }
}

impl From<EraTable> for Vec<Era> {
    fn from(table: EraTable) -> Vec<Era> {
        table.eras.to_vec()
    }
}
