//! Text form of a [`RecurrenceRule`]: the `FREQ=...;INTERVAL=...` subset of
//! an iCalendar RRULE.
//!
//! Encoding is canonical: components always appear in the order
//! `FREQ, INTERVAL, BYDAY, BYMONTHDAY, BYMINUTE, BYSETPOS` and absent values
//! are omitted. Decoding is lenient and never fails; anything it cannot use
//! is dropped and left for [`RecurrenceRule::validate`] to report.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::models::{coerce_integer, coerce_nth_day, Coded, Frequency, MonthlyOption, RecurrenceRule};

pub const FREQ: &str = "FREQ";
pub const INTERVAL: &str = "INTERVAL";
pub const BYDAY: &str = "BYDAY";
pub const BYMONTHDAY: &str = "BYMONTHDAY";
pub const BYMINUTE: &str = "BYMINUTE";
pub const BYSETPOS: &str = "BYSETPOS";

/// Keys in emission order.
pub const COMPONENT_KEYS: [&str; 6] = [FREQ, INTERVAL, BYDAY, BYMONTHDAY, BYMINUTE, BYSETPOS];

const SEPARATOR: &str = ";";

/// Encodes a rule. `BYDAY` carries `day_of_week` when set, otherwise
/// `day_of_month`.
pub fn encode(rule: &RecurrenceRule) -> String {
    let by_day = rule.day_of_week.as_ref().or(rule.day_of_month.as_ref());

    let components: [(&str, Option<String>); 6] = [
        (FREQ, Some(rule.frequency.to_string())),
        (INTERVAL, Some(rule.interval.to_string())),
        (BYDAY, by_day.map(ToString::to_string)),
        (BYMONTHDAY, rule.date_of_month.map(|d| d.to_string())),
        (BYMINUTE, rule.minute_of_hour.map(|m| m.to_string())),
        (BYSETPOS, rule.nth_day_of_month.map(|n| n.to_string())),
    ];

    components
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("{key}={v}"))
        })
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Splits text into its `KEY -> value` components. Blank segments and
/// segments without `=` are skipped; a repeated key keeps its last value.
pub fn components(text: &str) -> HashMap<String, String> {
    let mut components = HashMap::new();
    for segment in text.split(SEPARATOR) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.split_once('=') {
            Some((key, value)) => {
                components.insert(key.trim().to_uppercase(), value.trim().to_string());
            }
            None => tracing::debug!(segment, "dropping recurrence component without '='"),
        }
    }
    components
}

/// Decodes text into a rule. Never fails: a missing or unknown `FREQ` is
/// kept as an unrecognized frequency, unknown keys are ignored.
pub fn decode(text: &str) -> RecurrenceRule {
    let components = components(text);

    for key in components.keys() {
        if !COMPONENT_KEYS.contains(&key.as_str()) {
            tracing::warn!(key = %key, "ignoring unsupported recurrence component");
        }
    }

    let get = |key: &str| components.get(key).map(String::as_str);

    let frequency = Coded::<Frequency>::parse(get(FREQ).unwrap_or_default());
    let interval = get(INTERVAL).and_then(coerce_integer).unwrap_or(1);
    let by_day = get(BYDAY).map(Coded::parse);

    let mut rule = RecurrenceRule {
        frequency,
        interval,
        minute_of_hour: get(BYMINUTE).and_then(coerce_integer),
        nth_day_of_month: get(BYSETPOS).and_then(coerce_nth_day),
        ..RecurrenceRule::default()
    };

    match rule.known_frequency() {
        Some(Frequency::Monthly) => {
            rule.date_of_month = get(BYMONTHDAY).and_then(coerce_integer);
            rule.monthly_option = if get(BYSETPOS).is_some() && by_day.is_some() {
                Some(Coded::Known(MonthlyOption::NthDay))
            } else if get(BYMONTHDAY).is_some() {
                Some(Coded::Known(MonthlyOption::Date))
            } else {
                None
            };
            rule.day_of_month = by_day;
        }
        Some(Frequency::Weekly) => rule.day_of_week = by_day,
        _ => {}
    }

    tracing::trace!(text, ?rule, "decoded recurrence rule");
    rule
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

impl FromStr for RecurrenceRule {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(decode(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RuleField, ViolationKind, Weekday};
    use proptest::prelude::*;

    mod encode_tests {
        use super::*;

        #[test]
        fn test_monthly_last_friday() {
            let rule =
                RecurrenceRule::new(Frequency::Monthly, 1).with_monthly_nth_day(-1, Weekday::Fr);
            assert_eq!(encode(&rule), "FREQ=MONTHLY;INTERVAL=1;BYDAY=FR;BYSETPOS=-1");
        }

        #[test]
        fn test_monthly_by_date() {
            let rule = RecurrenceRule::new(Frequency::Monthly, 3).with_monthly_date(15);
            assert_eq!(encode(&rule), "FREQ=MONTHLY;INTERVAL=3;BYMONTHDAY=15");
        }

        #[test]
        fn test_hourly_with_minute() {
            let rule = RecurrenceRule::new(Frequency::Hourly, 2).with_minute_of_hour(0);
            assert_eq!(encode(&rule), "FREQ=HOURLY;INTERVAL=2;BYMINUTE=0");
        }

        #[test]
        fn test_plain_daily_has_no_trailing_separator() {
            assert_eq!(encode(&RecurrenceRule::default()), "FREQ=DAILY;INTERVAL=1");
        }

        #[test]
        fn test_day_of_week_takes_precedence_over_day_of_month() {
            let mut rule = RecurrenceRule::new(Frequency::Weekly, 1).with_day_of_week(Weekday::Tu);
            rule.day_of_month = Some(Coded::Known(Weekday::Th));
            assert_eq!(encode(&rule), "FREQ=WEEKLY;INTERVAL=1;BYDAY=TU");
        }

        #[test]
        fn test_blank_unrecognized_value_is_omitted() {
            let mut rule = RecurrenceRule::new(Frequency::Weekly, 1);
            rule.day_of_week = Some(Coded::Unrecognized(String::new()));
            assert_eq!(encode(&rule), "FREQ=WEEKLY;INTERVAL=1");
        }

        #[test]
        fn test_display_matches_encode() {
            let rule = RecurrenceRule::new(Frequency::Yearly, 3);
            assert_eq!(rule.to_string(), "FREQ=YEARLY;INTERVAL=3");
        }
    }

    mod decode_tests {
        use super::*;

        #[test]
        fn test_monthly_date_out_of_range_is_invalid() {
            let rule = decode("FREQ=MONTHLY;INTERVAL=10;BYMONTHDAY=29");
            assert_eq!(rule.monthly_option, Some(Coded::Known(MonthlyOption::Date)));
            assert_eq!(rule.date_of_month, Some(29));
            assert_eq!(rule.interval, 10);
            let violations = rule.validate();
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, RuleField::DateOfMonth);
            assert_eq!(violations[0].kind, ViolationKind::OutOfRange { min: 1, max: 28 });
        }

        #[test]
        fn test_monthly_nth_day() {
            let rule = decode("FREQ=MONTHLY;INTERVAL=1;BYDAY=FR;BYSETPOS=-1");
            assert_eq!(
                rule,
                RecurrenceRule::new(Frequency::Monthly, 1).with_monthly_nth_day(-1, Weekday::Fr)
            );
        }

        #[test]
        fn test_monthly_by_day_without_setpos_has_no_option() {
            let rule = decode("FREQ=MONTHLY;BYDAY=FR");
            assert_eq!(rule.monthly_option, None);
            assert_eq!(rule.day_of_month, Some(Coded::Known(Weekday::Fr)));
            assert!(!rule.is_valid());
        }

        #[test]
        fn test_weekly_by_day_goes_to_day_of_week() {
            let rule = decode("FREQ=WEEKLY;INTERVAL=2;BYDAY=MO");
            assert_eq!(rule.day_of_week, Some(Coded::Known(Weekday::Mo)));
            assert_eq!(rule.day_of_month, None);
        }

        #[test]
        fn test_missing_interval_defaults_to_one() {
            assert_eq!(decode("FREQ=DAILY").interval, 1);
            assert_eq!(decode("FREQ=DAILY;INTERVAL=often").interval, 1);
        }

        #[test]
        fn test_missing_freq_is_kept_and_flagged() {
            let rule = decode("INTERVAL=2");
            assert_eq!(rule.known_frequency(), None);
            assert_eq!(rule.validate()[0].field, RuleField::Frequency);
            assert_eq!(rule.validate()[0].kind, ViolationKind::Blank);
        }

        #[test]
        fn test_unknown_freq_is_kept_and_flagged() {
            let rule = decode("FREQ=SECONDLY;INTERVAL=2");
            assert_eq!(rule.frequency, Coded::Unrecognized("SECONDLY".to_string()));
            assert_eq!(rule.validate()[0].kind, ViolationKind::Inclusion);
            assert_eq!(encode(&rule), "FREQ=SECONDLY;INTERVAL=2");
        }

        #[test]
        fn test_lenient_parsing() {
            let rule = decode(";;FREQ=WEEKLY;;garbage;COUNT=3;UNTIL=20250101;INTERVAL=1;");
            assert_eq!(rule, RecurrenceRule::new(Frequency::Weekly, 1));
        }

        #[test]
        fn test_last_duplicate_wins() {
            let rule = decode("FREQ=DAILY;INTERVAL=2;INTERVAL=5");
            assert_eq!(rule.interval, 5);
        }

        #[test]
        fn test_value_split_on_first_equals_only() {
            let parts = components("FREQ=DAILY;X-NOTE=a=b");
            assert_eq!(parts.get("X-NOTE").map(String::as_str), Some("a=b"));
        }

        #[test]
        fn test_from_str() {
            let rule: RecurrenceRule = "FREQ=HOURLY;INTERVAL=6;BYMINUTE=45".parse().unwrap();
            assert_eq!(rule, RecurrenceRule::new(Frequency::Hourly, 6).with_minute_of_hour(45));
        }
    }

    mod property_tests {
        use super::*;

        fn weekday() -> impl Strategy<Value = Weekday> {
            prop::sample::select(Weekday::ALL.to_vec())
        }

        /// Valid rules, with only the fields their frequency uses populated.
        fn valid_rule() -> impl Strategy<Value = RecurrenceRule> {
            let interval = 1..=12i32;
            prop_oneof![
                interval.clone().prop_map(|i| RecurrenceRule::new(Frequency::Yearly, i)),
                (interval.clone(), 1..=28i32).prop_map(|(i, d)| {
                    RecurrenceRule::new(Frequency::Monthly, i).with_monthly_date(d)
                }),
                (interval.clone(), prop::sample::select(vec![1, 2, 3, 4, -1, -2]), weekday())
                    .prop_map(|(i, n, w)| {
                        RecurrenceRule::new(Frequency::Monthly, i).with_monthly_nth_day(n, w)
                    }),
                (interval.clone(), prop::option::of(weekday())).prop_map(|(i, w)| {
                    let rule = RecurrenceRule::new(Frequency::Weekly, i);
                    match w {
                        Some(w) => rule.with_day_of_week(w),
                        None => rule,
                    }
                }),
                interval.clone().prop_map(|i| RecurrenceRule::new(Frequency::Daily, i)),
                (interval.clone(), prop::option::of(0..=59i32)).prop_map(|(i, m)| {
                    let mut rule = RecurrenceRule::new(Frequency::Hourly, i);
                    rule.minute_of_hour = m;
                    rule
                }),
                interval.prop_map(|i| RecurrenceRule::new(Frequency::Minutely, i)),
            ]
        }

        proptest! {
            #[test]
            fn decode_encode_round_trips(rule in valid_rule()) {
                prop_assert!(rule.is_valid());
                prop_assert_eq!(decode(&encode(&rule)), rule);
            }

            #[test]
            fn encode_is_idempotent(rule in valid_rule()) {
                let text = encode(&rule);
                prop_assert_eq!(encode(&decode(&text)), text);
            }

            #[test]
            fn decode_never_panics(text in ".{0,64}") {
                let _ = decode(&text).validate();
            }
        }
    }
}
