use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Allowed values for `nth_day_of_month`: first..fourth, last, second-to-last.
pub const NTH_DAY_VALUES: [i32; 6] = [1, 2, 3, 4, -1, -2];

pub const INTERVAL_RANGE: (i32, i32) = (1, 12);
pub const DATE_OF_MONTH_RANGE: (i32, i32) = (1, 28);
pub const MINUTE_OF_HOUR_RANGE: (i32, i32) = (0, 59);

/// Recurrence frequency, declared coarsest to finest. The derived `Ord`
/// follows declaration order and is what strategy selection relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    Minutely,
}

impl Frequency {
    pub const ALL: [Frequency; 6] = [
        Frequency::Yearly,
        Frequency::Monthly,
        Frequency::Weekly,
        Frequency::Daily,
        Frequency::Hourly,
        Frequency::Minutely,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Yearly => "YEARLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Daily => "DAILY",
            Frequency::Hourly => "HOURLY",
            Frequency::Minutely => "MINUTELY",
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid frequency: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "YEARLY" => Ok(Frequency::Yearly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "WEEKLY" => Ok(Frequency::Weekly),
            "DAILY" => Ok(Frequency::Daily),
            "HOURLY" => Ok(Frequency::Hourly),
            "MINUTELY" => Ok(Frequency::Minutely),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-letter weekday codes as used by `BYDAY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Weekday {
    Su,
    Mo,
    Tu,
    We,
    Th,
    Fr,
    Sa,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Su,
        Weekday::Mo,
        Weekday::Tu,
        Weekday::We,
        Weekday::Th,
        Weekday::Fr,
        Weekday::Sa,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Su => "SU",
            Weekday::Mo => "MO",
            Weekday::Tu => "TU",
            Weekday::We => "WE",
            Weekday::Th => "TH",
            Weekday::Fr => "FR",
            Weekday::Sa => "SA",
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid weekday: {0}")]
pub struct ParseWeekdayError(String);

impl FromStr for Weekday {
    type Err = ParseWeekdayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SU" => Ok(Weekday::Su),
            "MO" => Ok(Weekday::Mo),
            "TU" => Ok(Weekday::Tu),
            "WE" => Ok(Weekday::We),
            "TH" => Ok(Weekday::Th),
            "FR" => Ok(Weekday::Fr),
            "SA" => Ok(Weekday::Sa),
            _ => Err(ParseWeekdayError(s.to_string())),
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which monthly sub-model is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonthlyOption {
    /// Calendar day of month (`BYMONTHDAY`).
    Date,
    /// Nth weekday of month (`BYDAY` + `BYSETPOS`).
    NthDay,
}

impl MonthlyOption {
    pub fn as_str(self) -> &'static str {
        match self {
            MonthlyOption::Date => "DATE",
            MonthlyOption::NthDay => "NTH_DAY",
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid monthly option: {0}")]
pub struct ParseMonthlyOptionError(String);

impl FromStr for MonthlyOption {
    type Err = ParseMonthlyOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "DATE" => Ok(MonthlyOption::Date),
            "NTH_DAY" => Ok(MonthlyOption::NthDay),
            _ => Err(ParseMonthlyOptionError(s.to_string())),
        }
    }
}

impl fmt::Display for MonthlyOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A code-valued field that may hold a value outside its closed set.
///
/// Decoded text and form input can carry codes the model does not know.
/// Those are kept verbatim as `Unrecognized` so the rule stays representable
/// and `validate` reports them, instead of the value silently vanishing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coded<T> {
    Known(T),
    Unrecognized(String),
}

impl<T: FromStr> Coded<T> {
    pub fn parse(raw: &str) -> Self {
        raw.parse()
            .map(Coded::Known)
            .unwrap_or_else(|_| Coded::Unrecognized(raw.to_string()))
    }
}

impl<T> Coded<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Coded::Known(value) => Some(value),
            Coded::Unrecognized(_) => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Coded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coded::Known(value) => value.fmt(f),
            Coded::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl<T> From<T> for Coded<T> {
    fn from(value: T) -> Self {
        Coded::Known(value)
    }
}

/// Field names, used to key validation violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    Frequency,
    Interval,
    MonthlyOption,
    DateOfMonth,
    DayOfMonth,
    NthDayOfMonth,
    DayOfWeek,
    MinuteOfHour,
}

impl RuleField {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleField::Frequency => "frequency",
            RuleField::Interval => "interval",
            RuleField::MonthlyOption => "monthly_option",
            RuleField::DateOfMonth => "date_of_month",
            RuleField::DayOfMonth => "day_of_month",
            RuleField::NthDayOfMonth => "nth_day_of_month",
            RuleField::DayOfWeek => "day_of_week",
            RuleField::MinuteOfHour => "minute_of_hour",
        }
    }
}

impl fmt::Display for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ViolationKind {
    /// Required for the current frequency but unset.
    Blank,
    /// Not one of the allowed values.
    Inclusion,
    OutOfRange { min: i32, max: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: RuleField,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn new(field: RuleField, kind: ViolationKind) -> Self {
        Self { field, kind }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::Blank => write!(f, "{} can't be blank", self.field),
            ViolationKind::Inclusion => write!(f, "{} is not included in the list", self.field),
            ViolationKind::OutOfRange { min, max } => {
                write!(f, "{} must be between {} and {}", self.field, min, max)
            }
        }
    }
}

/// A recurrence rule: frequency, interval and the frequency-specific fields.
///
/// This is a plain value. Invalid rules are representable so that callers can
/// surface every problem at once through [`RecurrenceRule::validate`]; the
/// projector refuses to work with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceRule {
    pub frequency: Coded<Frequency>,
    pub interval: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_option: Option<Coded<MonthlyOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_month: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<Coded<Weekday>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nth_day_of_month: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<Coded<Weekday>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute_of_hour: Option<i32>,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self {
            frequency: Coded::Known(Frequency::Daily),
            interval: 1,
            monthly_option: None,
            date_of_month: None,
            day_of_month: None,
            nth_day_of_month: None,
            day_of_week: None,
            minute_of_hour: None,
        }
    }
}

/// Coerces textual integer input. Blank input is unset; signed numerals
/// (`"-1"`, `"+2"`) parse; anything else is dropped.
pub fn coerce_integer(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Coerces `nth_day_of_month` form or text input to an integer.
pub fn coerce_nth_day(raw: &str) -> Option<i32> {
    coerce_integer(raw)
}

type FieldValidator = fn(&RecurrenceRule) -> Option<Violation>;

/// One check per field, each gated on the frequency (and monthly option) it
/// applies to. Order is the order violations are reported in.
const FIELD_VALIDATORS: [FieldValidator; 8] = [
    validate_frequency,
    validate_interval,
    validate_monthly_option,
    validate_date_of_month,
    validate_day_of_month,
    validate_nth_day_of_month,
    validate_day_of_week,
    validate_minute_of_hour,
];

impl RecurrenceRule {
    pub fn new(frequency: Frequency, interval: i32) -> Self {
        Self {
            frequency: Coded::Known(frequency),
            interval,
            ..Default::default()
        }
    }

    /// Builds a rule from a string attribute set, as a form layer would hand
    /// it over. Keys are field names; blank values count as omitted.
    ///
    /// Omitted `frequency` defaults to DAILY and omitted or non-numeric
    /// `interval` defaults to 1. Unknown keys are ignored. When a key repeats,
    /// the last value wins.
    pub fn from_attributes<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let attributes: HashMap<String, String> = attributes
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_string(), v.as_ref().trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        for key in attributes.keys() {
            if !ATTRIBUTE_KEYS.contains(&key.as_str()) {
                tracing::trace!(key = %key, "ignoring unknown rule attribute");
            }
        }

        let get = |key: &str| attributes.get(key).map(String::as_str);

        Self {
            frequency: get("frequency").map_or(Coded::Known(Frequency::Daily), Coded::parse),
            interval: get("interval").and_then(coerce_integer).unwrap_or(1),
            monthly_option: get("monthly_option").map(Coded::parse),
            date_of_month: get("date_of_month").and_then(coerce_integer),
            day_of_month: get("day_of_month").map(Coded::parse),
            nth_day_of_month: get("nth_day_of_month").and_then(coerce_nth_day),
            day_of_week: get("day_of_week").map(Coded::parse),
            minute_of_hour: get("minute_of_hour").and_then(coerce_integer),
        }
    }

    /// Exports the rule as the attribute set `from_attributes` accepts.
    pub fn to_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![
            ("frequency", self.frequency.to_string()),
            ("interval", self.interval.to_string()),
        ];
        if let Some(option) = &self.monthly_option {
            attributes.push(("monthly_option", option.to_string()));
        }
        if let Some(date) = self.date_of_month {
            attributes.push(("date_of_month", date.to_string()));
        }
        if let Some(day) = &self.day_of_month {
            attributes.push(("day_of_month", day.to_string()));
        }
        if let Some(nth) = self.nth_day_of_month {
            attributes.push(("nth_day_of_month", nth.to_string()));
        }
        if let Some(day) = &self.day_of_week {
            attributes.push(("day_of_week", day.to_string()));
        }
        if let Some(minute) = self.minute_of_hour {
            attributes.push(("minute_of_hour", minute.to_string()));
        }
        attributes
    }

    #[must_use]
    pub fn with_monthly_date(mut self, date_of_month: i32) -> Self {
        self.monthly_option = Some(Coded::Known(MonthlyOption::Date));
        self.date_of_month = Some(date_of_month);
        self
    }

    #[must_use]
    pub fn with_monthly_nth_day(mut self, nth_day_of_month: i32, day_of_month: Weekday) -> Self {
        self.monthly_option = Some(Coded::Known(MonthlyOption::NthDay));
        self.nth_day_of_month = Some(nth_day_of_month);
        self.day_of_month = Some(Coded::Known(day_of_month));
        self
    }

    #[must_use]
    pub fn with_day_of_week(mut self, day_of_week: Weekday) -> Self {
        self.day_of_week = Some(Coded::Known(day_of_week));
        self
    }

    #[must_use]
    pub fn with_minute_of_hour(mut self, minute_of_hour: i32) -> Self {
        self.minute_of_hour = Some(minute_of_hour);
        self
    }

    /// Sets `nth_day_of_month` from raw text, running it through the same
    /// coercion as attribute input.
    pub fn set_nth_day_of_month(&mut self, raw: &str) {
        self.nth_day_of_month = coerce_nth_day(raw);
    }

    pub fn known_frequency(&self) -> Option<Frequency> {
        self.frequency.known().copied()
    }

    pub fn known_monthly_option(&self) -> Option<MonthlyOption> {
        self.monthly_option
            .as_ref()
            .and_then(Coded::known)
            .copied()
    }

    fn is(&self, frequency: Frequency) -> bool {
        self.known_frequency() == Some(frequency)
    }

    fn is_monthly_with(&self, option: MonthlyOption) -> bool {
        self.is(Frequency::Monthly) && self.known_monthly_option() == Some(option)
    }

    /// Runs every field validation and collects all violations.
    pub fn validate(&self) -> Vec<Violation> {
        FIELD_VALIDATORS
            .iter()
            .filter_map(|validator| validator(self))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Ranks the two rules by frequency coarseness only. Interval and every
    /// other field are ignored. `None` when either frequency is unrecognized.
    pub fn compare_frequency(&self, other: &Self) -> Option<Ordering> {
        match (self.known_frequency(), other.known_frequency()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }

    /// Copy of the rule with every field that the current frequency (and
    /// monthly option) does not use cleared.
    pub fn applicable(&self) -> Self {
        let mut rule = self.clone();
        if self.is(Frequency::Monthly) {
            match self.known_monthly_option() {
                Some(MonthlyOption::Date) => {
                    rule.day_of_month = None;
                    rule.nth_day_of_month = None;
                }
                Some(MonthlyOption::NthDay) => rule.date_of_month = None,
                None => {}
            }
        } else {
            rule.monthly_option = None;
            rule.date_of_month = None;
            rule.day_of_month = None;
            rule.nth_day_of_month = None;
        }
        if !self.is(Frequency::Weekly) {
            rule.day_of_week = None;
        }
        if !self.is(Frequency::Hourly) {
            rule.minute_of_hour = None;
        }
        rule
    }
}

const ATTRIBUTE_KEYS: [&str; 8] = [
    "frequency",
    "interval",
    "monthly_option",
    "date_of_month",
    "day_of_month",
    "nth_day_of_month",
    "day_of_week",
    "minute_of_hour",
];

fn check_range(field: RuleField, value: i32, (min, max): (i32, i32)) -> Option<Violation> {
    (!(min..=max).contains(&value))
        .then(|| Violation::new(field, ViolationKind::OutOfRange { min, max }))
}

fn check_code<T>(field: RuleField, value: Option<&Coded<T>>) -> Option<Violation> {
    match value {
        None => Some(Violation::new(field, ViolationKind::Blank)),
        Some(Coded::Unrecognized(raw)) if raw.trim().is_empty() => {
            Some(Violation::new(field, ViolationKind::Blank))
        }
        Some(Coded::Unrecognized(_)) => Some(Violation::new(field, ViolationKind::Inclusion)),
        Some(Coded::Known(_)) => None,
    }
}

fn validate_frequency(rule: &RecurrenceRule) -> Option<Violation> {
    check_code(RuleField::Frequency, Some(&rule.frequency))
}

fn validate_interval(rule: &RecurrenceRule) -> Option<Violation> {
    check_range(RuleField::Interval, rule.interval, INTERVAL_RANGE)
}

fn validate_monthly_option(rule: &RecurrenceRule) -> Option<Violation> {
    if !rule.is(Frequency::Monthly) {
        return None;
    }
    check_code(RuleField::MonthlyOption, rule.monthly_option.as_ref())
}

fn validate_date_of_month(rule: &RecurrenceRule) -> Option<Violation> {
    if !rule.is_monthly_with(MonthlyOption::Date) {
        return None;
    }
    match rule.date_of_month {
        None => Some(Violation::new(RuleField::DateOfMonth, ViolationKind::Blank)),
        Some(date) => check_range(RuleField::DateOfMonth, date, DATE_OF_MONTH_RANGE),
    }
}

fn validate_day_of_month(rule: &RecurrenceRule) -> Option<Violation> {
    if !rule.is_monthly_with(MonthlyOption::NthDay) {
        return None;
    }
    check_code(RuleField::DayOfMonth, rule.day_of_month.as_ref())
}

fn validate_nth_day_of_month(rule: &RecurrenceRule) -> Option<Violation> {
    if !rule.is_monthly_with(MonthlyOption::NthDay) {
        return None;
    }
    match rule.nth_day_of_month {
        None => Some(Violation::new(RuleField::NthDayOfMonth, ViolationKind::Blank)),
        Some(nth) if !NTH_DAY_VALUES.contains(&nth) => {
            Some(Violation::new(RuleField::NthDayOfMonth, ViolationKind::Inclusion))
        }
        Some(_) => None,
    }
}

fn validate_day_of_week(rule: &RecurrenceRule) -> Option<Violation> {
    if !rule.is(Frequency::Weekly) {
        return None;
    }
    // Optional: a weekly rule without a day repeats on the anchor's weekday.
    rule.day_of_week
        .as_ref()
        .and_then(|day| check_code(RuleField::DayOfWeek, Some(day)))
}

fn validate_minute_of_hour(rule: &RecurrenceRule) -> Option<Violation> {
    if !rule.is(Frequency::Hourly) {
        return None;
    }
    rule.minute_of_hour
        .and_then(|minute| check_range(RuleField::MinuteOfHour, minute, MINUTE_OF_HOUR_RANGE))
}
