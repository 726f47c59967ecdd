use calfield_core::{
    Calendar, CalendarConfig, FieldValues, SystemKind, TimestampFormat, parse_timestamp_auto,
};
use chrono::{DateTime, SecondsFormat};
use tracing::debug;

use crate::cli::CalendarArgs;
use crate::error::{CliError, CliResult};

pub fn parse_format(s: &str) -> CliResult<TimestampFormat> {
    s.parse().map_err(|_| {
        CliError::input(format!(
            "Invalid format '{}'. Expected: epoch_ms, epoch_s, rfc3339",
            s
        ))
    })
}

pub fn parse_instant(s: &str) -> CliResult<i64> {
    parse_timestamp_auto(s).map_err(|e| CliError::input(e.to_string()))
}

/// Merge the config file (if any) with command-line overrides.
pub fn calendar_config(args: &CalendarArgs) -> CliResult<CalendarConfig> {
    let mut config = match &args.config {
        Some(path) => CalendarConfig::load(path).map_err(|e| CliError::input(e.to_string()))?,
        None => CalendarConfig::default(),
    };

    if let Some(calendar) = &args.calendar {
        config.system = calendar.parse::<SystemKind>().map_err(|_| {
            CliError::input(format!(
                "Invalid calendar '{}'. Expected: gregorian, hybrid, japanese",
                calendar
            ))
        })?;
    }
    if let Some(cutover) = &args.cutover {
        config.cutover = Some(parse_instant(cutover)?);
    }
    if let Some(tz) = &args.tz {
        config.zone = tz.clone();
    }
    if args.locale.is_some() {
        config.locale = args.locale.clone();
    }
    if args.first_day_of_week.is_some() {
        config.first_day_of_week = args.first_day_of_week;
    }
    if args.min_days.is_some() {
        config.minimal_days_in_first_week = args.min_days;
    }
    if args.strict {
        config.lenient = false;
    }

    Ok(config)
}

pub fn build_calendar(args: &CalendarArgs) -> CliResult<Calendar> {
    let config = calendar_config(args)?;
    debug!(?config, "Building calendar");
    Calendar::from_config(&config).map_err(|e| match e {
        calfield_core::CalendarError::InvalidTimezone(_) => {
            CliError::input(format!("Invalid timezone '{}': {}", config.zone, e))
        }
        other => CliError::from(other),
    })
}

/// RFC3339 rendering of an instant, or `None` outside chrono's range.
pub fn format_utc(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// One-line local rendering of a field snapshot.
pub fn format_fields(fields: &FieldValues) -> String {
    let offset_minutes = (fields.zone_offset + fields.dst_offset) / 60_000;
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}{}{:02}:{:02} era={} dow={} doy={} woy={}",
        fields.year,
        fields.month + 1,
        fields.day_of_month,
        fields.hour_of_day,
        fields.minute,
        fields.second,
        fields.millisecond,
        sign,
        offset_minutes.abs() / 60,
        offset_minutes.abs() % 60,
        fields.era,
        fields.day_of_week,
        fields.day_of_year,
        fields.week_of_year,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_overrides() {
        let args = CalendarArgs {
            tz: Some("Asia/Tokyo".to_string()),
            calendar: Some("japanese".to_string()),
            strict: true,
            ..CalendarArgs::default()
        };
        let config = calendar_config(&args).unwrap();
        assert_eq!(config.system, SystemKind::Japanese);
        assert_eq!(config.zone, "Asia/Tokyo");
        assert!(!config.lenient);
    }

    #[test]
    fn rejects_unknown_calendar() {
        let args = CalendarArgs {
            calendar: Some("lunar".to_string()),
            ..CalendarArgs::default()
        };
        assert!(calendar_config(&args).is_err());
    }

    #[test]
    fn utc_rendering() {
        assert_eq!(format_utc(0).as_deref(), Some("1970-01-01T00:00:00.000Z"));
        assert_eq!(format_utc(i64::MAX), None);
    }
}
