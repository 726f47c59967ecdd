//! Field precedence resolution.
//!
//! When several overlapping date or hour fields are set, the most recently
//! written combination wins. The comparison runs over stamps only; field
//! values are never consulted.
//!
//! Competing date groups:
//!
//! | group                        | fields                              |
//! |------------------------------|-------------------------------------|
//! | day of month                 | DAY_OF_MONTH                        |
//! | week of month                | WEEK_OF_MONTH + DAY_OF_WEEK         |
//! | weekday in month             | DAY_OF_WEEK_IN_MONTH + DAY_OF_WEEK  |
//! | day of year                  | DAY_OF_YEAR                         |
//! | week of year                 | WEEK_OF_YEAR + DAY_OF_WEEK          |
//!
//! Equal stamps resolve in table order, top row first.

use crate::models::{Field, FieldMask};
use crate::store::{MINIMUM_USER_STAMP, UNSET};

/// Stamp of a two-field group: unset unless both members are set.
fn aggregate_stamp(a: i32, b: i32) -> i32 {
    if a == UNSET || b == UNSET {
        UNSET
    } else {
        a.max(b)
    }
}

/// Compute the mask of fields that drive time computation.
///
/// # Arguments
///
/// * `stamp` - The stamp array of a [`FieldStore`](crate::store::FieldStore)
///
/// # Returns
///
/// The selected fields. YEAR is always included, ERA whenever it has been
/// written, and ZONE_OFFSET/DST_OFFSET only when written by the caller.
///
/// # Examples
///
/// ```
/// use calfield_core::models::Field;
/// use calfield_core::resolver::select_fields;
/// use calfield_core::store::FieldStore;
///
/// let mut store = FieldStore::new();
/// store.set(Field::DayOfMonth, 10);
/// store.set(Field::DayOfYear, 40);
///
/// let mask = select_fields(store.stamps());
/// assert!(mask.contains(Field::DayOfYear));
/// assert!(!mask.contains(Field::DayOfMonth));
/// ```
pub fn select_fields(stamp: &[i32; Field::COUNT]) -> FieldMask {
    let s = |f: Field| stamp[f.index()];

    let mut mask = Field::Year.mask();
    if s(Field::Era) != UNSET {
        mask |= Field::Era.mask();
    }

    let dow_stamp = s(Field::DayOfWeek);
    let month_stamp = s(Field::Month);
    let mut dom_stamp = s(Field::DayOfMonth);
    let mut wom_stamp = aggregate_stamp(s(Field::WeekOfMonth), dow_stamp);
    let mut dowim_stamp = aggregate_stamp(s(Field::DayOfWeekInMonth), dow_stamp);
    let doy_stamp = s(Field::DayOfYear);
    let mut woy_stamp = aggregate_stamp(s(Field::WeekOfYear), dow_stamp);

    let mut best = dom_stamp
        .max(wom_stamp)
        .max(dowim_stamp)
        .max(doy_stamp)
        .max(woy_stamp);

    if best == UNSET {
        wom_stamp = s(Field::WeekOfMonth);
        dowim_stamp = s(Field::DayOfWeekInMonth).max(dow_stamp);
        woy_stamp = s(Field::WeekOfYear);
        best = wom_stamp.max(dowim_stamp).max(woy_stamp);
        if best == UNSET {
            dom_stamp = month_stamp;
            best = month_stamp;
        }
    }

    let woy_raw = s(Field::WeekOfYear);
    if best == dom_stamp
        || (best == wom_stamp && s(Field::WeekOfMonth) >= woy_raw)
        || (best == dowim_stamp && s(Field::DayOfWeekInMonth) >= woy_raw)
    {
        mask |= Field::Month.mask();
        if best == dom_stamp {
            mask |= Field::DayOfMonth.mask();
        } else {
            if dow_stamp != UNSET {
                mask |= Field::DayOfWeek.mask();
            }
            if wom_stamp == dowim_stamp {
                // Tie between the two month-relative week groups.
                if s(Field::WeekOfMonth) >= s(Field::DayOfWeekInMonth) {
                    mask |= Field::WeekOfMonth.mask();
                } else {
                    mask |= Field::DayOfWeekInMonth.mask();
                }
            } else if best == wom_stamp {
                mask |= Field::WeekOfMonth.mask();
            } else if s(Field::DayOfWeekInMonth) != UNSET {
                mask |= Field::DayOfWeekInMonth.mask();
            }
        }
    } else if best == doy_stamp {
        mask |= Field::DayOfYear.mask();
    } else {
        if dow_stamp != UNSET {
            mask |= Field::DayOfWeek.mask();
        }
        mask |= Field::WeekOfYear.mask();
    }

    let hour_of_day_stamp = s(Field::HourOfDay);
    let hour_stamp = aggregate_stamp(s(Field::Hour), s(Field::AmPm));
    let mut best = hour_stamp.max(hour_of_day_stamp);
    if best == UNSET {
        best = s(Field::Hour).max(s(Field::AmPm));
    }
    if best != UNSET {
        if best == hour_of_day_stamp {
            mask |= Field::HourOfDay.mask();
        } else {
            mask |= Field::Hour.mask();
            if s(Field::AmPm) != UNSET {
                mask |= Field::AmPm.mask();
            }
        }
    }

    for field in [Field::Minute, Field::Second, Field::Millisecond] {
        if s(field) != UNSET {
            mask |= field.mask();
        }
    }
    for field in [Field::ZoneOffset, Field::DstOffset] {
        if s(field) >= MINIMUM_USER_STAMP {
            mask |= field.mask();
        }
    }
    mask
}
