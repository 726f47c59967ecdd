//! Calendar construction settings.
//!
//! A [`CalendarConfig`] describes everything needed to build a
//! [`Calendar`](crate::calendar::Calendar): the calendar system, time zone,
//! week rules and leniency. It is plain serde data so it can be loaded from
//! a JSON file or assembled from command-line arguments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{CalendarError, Result};

/// Calendar system selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    /// Proleptic Gregorian.
    Gregorian,
    /// Julian before the cutover, Gregorian from it.
    #[default]
    Hybrid,
    /// Gregorian dates with Japanese imperial era years.
    Japanese,
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemKind::Gregorian => write!(f, "gregorian"),
            SystemKind::Hybrid => write!(f, "hybrid"),
            SystemKind::Japanese => write!(f, "japanese"),
        }
    }
}

impl FromStr for SystemKind {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gregorian" => Ok(SystemKind::Gregorian),
            "hybrid" | "julian-gregorian" => Ok(SystemKind::Hybrid),
            "japanese" => Ok(SystemKind::Japanese),
            _ => Err(CalendarError::ParseError(format!(
                "Unknown calendar: '{}'. Expected 'gregorian', 'hybrid', or 'japanese'",
                s
            ))),
        }
    }
}

/// Settings for building a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalendarConfig {
    pub system: SystemKind,
    /// Cutover instant in epoch milliseconds. Only valid for `hybrid`.
    pub cutover: Option<i64>,
    /// IANA zone id or fixed offset.
    pub zone: String,
    /// BCP 47 tag used to pick week rules, e.g. `en-US`.
    pub locale: Option<String>,
    pub first_day_of_week: Option<i32>,
    pub minimal_days_in_first_week: Option<i32>,
    pub lenient: bool,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            system: SystemKind::default(),
            cutover: None,
            zone: "UTC".to_string(),
            locale: None,
            first_day_of_week: None,
            minimal_days_in_first_week: None,
            lenient: true,
        }
    }
}

impl CalendarConfig {
    /// Parse a configuration from JSON text. Missing keys take defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use calfield_core::config::{CalendarConfig, SystemKind};
    ///
    /// let config = CalendarConfig::from_json(r#"{"system": "japanese", "zone": "Asia/Tokyo"}"#).unwrap();
    /// assert_eq!(config.system, SystemKind::Japanese);
    /// assert!(config.lenient);
    /// ```
    pub fn from_json(text: &str) -> Result<CalendarConfig> {
        serde_json::from_str(text)
            .map_err(|e| CalendarError::ParseError(format!("Invalid calendar config: {}", e)))
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: &Path) -> Result<CalendarConfig> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::ParseError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        CalendarConfig::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CalendarConfig::default();
        assert_eq!(config.system, SystemKind::Hybrid);
        assert_eq!(config.zone, "UTC");
        assert!(config.lenient);
        assert_eq!(CalendarConfig::from_json("{}").unwrap(), config);
    }

    #[test]
    fn parses_full_config() {
        let config = CalendarConfig::from_json(
            r#"{
                "system": "hybrid",
                "cutover": -12219292800000,
                "zone": "Europe/Berlin",
                "locale": "de-DE",
                "first_day_of_week": 2,
                "minimal_days_in_first_week": 4,
                "lenient": false
            }"#,
        )
        .unwrap();
        assert_eq!(config.cutover, Some(-12_219_292_800_000));
        assert_eq!(config.locale.as_deref(), Some("de-DE"));
        assert_eq!(config.minimal_days_in_first_week, Some(4));
        assert!(!config.lenient);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = CalendarConfig::from_json(r#"{"calendar": "gregorian"}"#).unwrap_err();
        assert!(matches!(err, CalendarError::ParseError(_)));
    }

    #[test]
    fn system_kind_from_str() {
        assert_eq!(
            SystemKind::from_str("Gregorian").unwrap(),
            SystemKind::Gregorian
        );
        assert_eq!(SystemKind::from_str("hybrid").unwrap(), SystemKind::Hybrid);
        assert!(SystemKind::from_str("lunar").is_err());
        assert_eq!(SystemKind::Japanese.to_string(), "japanese");
    }
}
