use chrono_tz::Tz;
use recur_core::error::CoreError;
use recur_core::timezone::{parse_timezone, validate_timezone};

use crate::config::Config;

/// Detects the system timezone, falling back to UTC if detection fails
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if !tz.is_empty() && validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(tz) = std::fs::read_to_string("/etc/timezone") {
            let tz = tz.trim();
            if validate_timezone(tz).is_ok() {
                return tz.to_string();
            }
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    "UTC".to_string()
}

/// Gets a list of common timezones to offer when a name is rejected
pub fn get_common_timezones() -> Vec<&'static str> {
    vec![
        "UTC",
        "America/New_York",
        "America/Chicago",
        "America/Denver",
        "America/Los_Angeles",
        "America/Sao_Paulo",
        "Europe/London",
        "Europe/Paris",
        "Europe/Berlin",
        "Europe/Madrid",
        "Asia/Tokyo",
        "Asia/Shanghai",
        "Asia/Kolkata",
        "Asia/Dubai",
        "Australia/Sydney",
        "Pacific/Auckland",
    ]
}

/// Suggests similar timezone names when validation fails
pub fn suggest_timezone(invalid: &str) -> Vec<&'static str> {
    let invalid_lower = invalid.to_lowercase();
    let common = get_common_timezones();

    let matches: Vec<_> = common
        .iter()
        .copied()
        .filter(|tz| {
            let tz_lower = tz.to_lowercase();
            tz_lower.contains(&invalid_lower)
                || invalid_lower.contains(&tz_lower)
                || tz
                    .split('/')
                    .skip(1)
                    .any(|city| invalid_lower.contains(&city.to_lowercase()))
        })
        .collect();

    if matches.is_empty() {
        common.into_iter().take(5).collect()
    } else {
        matches
    }
}

/// The zone a command runs in: `--tz` when given, the configured default
/// otherwise.
pub fn resolve_timezone(requested: Option<&str>, config: &Config) -> Result<Tz, CoreError> {
    parse_timezone(requested.unwrap_or(&config.default_timezone))
}
