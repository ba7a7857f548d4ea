use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;
use recur_core::error::CoreError;

const LOCAL_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a command-line instant.
///
/// Accepts RFC 3339 (`2023-03-12T05:00:00Z`), a local wall-clock time in
/// `timezone` (`2023-03-12 09:30`, `2023-03-12`), or an English phrase such
/// as `tomorrow 9am`.
pub fn parse_datetime(input: &str, timezone: Tz) -> Result<DateTime<Utc>, CoreError> {
    let input = input.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        });
    if let Some(naive) = naive {
        return localize(naive, timezone, input);
    }

    parse_date_string(input, Utc::now().with_timezone(&timezone), Dialect::Us)
        .map(|local| local.with_timezone(&Utc))
        .map_err(|e| CoreError::InvalidInput(format!("failed to parse date '{}': {}", input, e)))
}

fn localize(naive: NaiveDateTime, timezone: Tz, input: &str) -> Result<DateTime<Utc>, CoreError> {
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
        // repeated hour: take the first pass through it
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(CoreError::InvalidInput(format!(
            "'{}' does not exist in {} (skipped by a daylight-saving change)",
            input,
            timezone
        ))),
    }
}
