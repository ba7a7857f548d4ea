use chrono::format::{Item, StrftimeItems};
use figment::{Figment, providers::{Format, Toml, Env}};
use serde::Deserialize;
use tracing::warn;

use crate::timezone::detect_system_timezone;

const CONFIG_FILE: &str = "recur.toml";

#[derive(Deserialize, Debug)]
pub struct Config {
    /// Zone used when a command gets no `--tz` (IANA format)
    #[serde(default = "detect_system_timezone")]
    pub default_timezone: String,
    /// Cap on rows printed by `between`
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: usize,
    /// chrono format string for printed instants
    #[serde(default = "default_datetime_format")]
    pub datetime_format: String,
}

fn default_max_occurrences() -> usize {
    100
}

fn default_datetime_format() -> String {
    "%Y-%m-%d %H:%M:%S %Z".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timezone: detect_system_timezone(),
            max_occurrences: default_max_occurrences(),
            datetime_format: default_datetime_format(),
        }
    }
}

impl Config {
    /// `recur.toml` (or the file named by `RECUR_CONFIG`) overlaid with
    /// `RECUR_*` environment variables.
    pub fn new() -> Result<Self, figment::Error> {
        let path = std::env::var("RECUR_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
        let config: Config = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("RECUR_"))
            .extract()?;
        Ok(config.checked())
    }

    /// Replaces a `datetime_format` chrono cannot render with the default.
    fn checked(mut self) -> Self {
        if !is_valid_datetime_format(&self.datetime_format) {
            warn!(
                datetime_format = %self.datetime_format,
                "invalid datetime_format, using default"
            );
            self.datetime_format = default_datetime_format();
        }
        self
    }
}

pub fn is_valid_datetime_format(format: &str) -> bool {
    StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config: Config = Figment::new()
            .merge(Toml::string("max_occurrences = 5"))
            .extract()
            .unwrap();
        assert_eq!(config.max_occurrences, 5);
        assert_eq!(config.datetime_format, "%Y-%m-%d %H:%M:%S %Z");
        assert!(!config.default_timezone.is_empty());
    }

    #[test]
    fn test_toml_overrides() {
        let config: Config = Figment::new()
            .merge(Toml::string(
                "default_timezone = \"Europe/Paris\"\ndatetime_format = \"%H:%M\"",
            ))
            .extract()
            .unwrap();
        assert_eq!(config.default_timezone, "Europe/Paris");
        assert_eq!(config.datetime_format, "%H:%M");
        assert_eq!(config.max_occurrences, 100);
    }

    #[test]
    fn test_datetime_format_validation() {
        assert!(is_valid_datetime_format("%Y-%m-%d %H:%M:%S %Z"));
        assert!(is_valid_datetime_format("%d/%m %H:%M"));
        assert!(!is_valid_datetime_format("%Q"));
    }

    #[test]
    fn test_invalid_datetime_format_falls_back() {
        let config: Config = Figment::new()
            .merge(Toml::string("datetime_format = \"%H:%Q\"\nmax_occurrences = 7"))
            .extract()
            .unwrap();
        let config = config.checked();
        assert_eq!(config.datetime_format, "%Y-%m-%d %H:%M:%S %Z");
        assert_eq!(config.max_occurrences, 7);
    }
}
