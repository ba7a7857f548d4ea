use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::codec;
use crate::error::CoreError;
use crate::models::{Frequency, RecurrenceRule};
use crate::timezone::{parse_timezone, DstReconciler};

/// Rough length of one period of `frequency`, used to size the
/// `last_occurrence_before` search window.
pub fn period_estimate(frequency: Frequency) -> Duration {
    match frequency {
        Frequency::Yearly => Duration::days(365),
        Frequency::Monthly => Duration::days(31),
        Frequency::Weekly => Duration::days(7),
        Frequency::Daily => Duration::days(1),
        Frequency::Hourly => Duration::hours(1),
        Frequency::Minutely => Duration::minutes(1),
    }
}

/// Largest single UTC offset change a zone makes (historic double summer
/// time moved clocks by two hours).
const MAX_OFFSET_CHANGE_HOURS: i64 = 2;

/// Width of the `last_occurrence_before` search window.
///
/// One period more than `interval` periods, plus an offset change. Covers
/// the longest real gap between consecutive occurrences: 366-day years,
/// 35-day stretches between "last Friday" months, 25-hour fall-back days
/// and the skipped hour on sub-day grids.
pub fn search_window_width(frequency: Frequency, interval: i32) -> Duration {
    period_estimate(frequency) * (interval + 1) + Duration::hours(MAX_OFFSET_CHANGE_HOURS)
}

/// Zone-naive grid of instants `base + k * step` for `k >= 0`.
#[derive(Debug, Clone, Copy)]
pub struct FixedIntervalSchedule {
    base: DateTime<Utc>,
    step: Duration,
}

impl FixedIntervalSchedule {
    pub fn new(base: DateTime<Utc>, step: Duration) -> Self {
        debug_assert!(step > Duration::zero());
        Self { base, step }
    }

    /// Grid points in `[from, to]`.
    pub fn between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Iterator<Item = DateTime<Utc>> {
        let Self { base, step } = *self;
        let step_seconds = step.num_seconds();

        let mut first = 0i64;
        if from > base {
            first = (from - base).num_seconds() / step_seconds;
            while base + Duration::seconds(step_seconds * first) < from {
                first += 1;
            }
        }

        (first..)
            .map(move |k| base + Duration::seconds(step_seconds * k))
            .take_while(move |tick| *tick <= to)
    }
}

/// Projects recurrence rules onto concrete instants in one time zone.
///
/// Day-or-coarser frequencies are evaluated by the `rrule` crate in local
/// dates, which keeps the anchor's local time of day on every occurrence no
/// matter how long the day in between was. Hourly and minutely frequencies
/// tick in elapsed time from the anchor and are pulled back onto the wall
/// clock by [`DstReconciler`].
///
/// The projector holds nothing but the zone and can be shared freely
/// between threads.
#[derive(Debug, Clone, Copy)]
pub struct OccurrenceProjector {
    timezone: Tz,
}

impl OccurrenceProjector {
    /// Creates a projector for an IANA time zone name.
    ///
    /// # Errors
    /// `CoreError::InvalidTimezone` when the name is unknown.
    pub fn new(timezone: &str) -> Result<Self, CoreError> {
        Ok(Self::with_timezone(parse_timezone(timezone)?))
    }

    pub fn with_timezone(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Occurrences of `rule`, anchored at `anchor`, inside `[from, to]`.
    ///
    /// # Returns
    /// Strictly increasing, duplicate-free instants in the projector's zone.
    ///
    /// # Errors
    /// - `CoreError::InvalidRule` if the rule does not validate
    /// - `CoreError::InvalidWindow` if `from > to`
    /// - `CoreError::InvalidRRule` if the day-granularity evaluator rejects
    ///   the rendered rule
    pub fn occurrences_between(
        &self,
        rule: &RecurrenceRule,
        anchor: DateTime<Utc>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Tz>>, CoreError> {
        let frequency = ensure_projectable(rule)?;
        if from > to {
            return Err(CoreError::InvalidWindow { from, to });
        }

        let occurrences = if frequency <= Frequency::Daily {
            tracing::debug!(rule = %rule, %anchor, %from, %to, "projecting on local calendar days");
            self.day_granularity(rule, anchor, from, to)?
        } else {
            tracing::debug!(rule = %rule, %anchor, %from, %to, "projecting on elapsed-time ticks");
            self.sub_day(rule, frequency, anchor, from, to)
        };

        debug_assert!(occurrences.windows(2).all(|pair| pair[0] < pair[1]));
        tracing::trace!(count = occurrences.len(), "projected occurrences");

        Ok(occurrences
            .into_iter()
            .map(|instant| instant.with_timezone(&self.timezone))
            .collect())
    }

    /// The latest occurrence at or before `boundary`, or `None`.
    ///
    /// Searches `[boundary - search_window_width(..), boundary]`, which is
    /// wider than any gap between two consecutive occurrences.
    pub fn last_occurrence_before(
        &self,
        rule: &RecurrenceRule,
        anchor: DateTime<Utc>,
        boundary: DateTime<Utc>,
    ) -> Result<Option<DateTime<Tz>>, CoreError> {
        let frequency = ensure_projectable(rule)?;
        let width = search_window_width(frequency, rule.interval);
        let occurrences = self.occurrences_between(rule, anchor, boundary - width, boundary)?;
        Ok(occurrences.last().cloned())
    }

    fn day_granularity(
        &self,
        rule: &RecurrenceRule,
        anchor: DateTime<Utc>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, CoreError> {
        let rrule_set = self.rrule_set(rule, anchor)?;

        Ok(rrule_set
            .into_iter()
            .map(|dt| dt.with_timezone(&Utc))
            .skip_while(|dt| *dt < from)
            .take_while(|dt| *dt <= to)
            .collect())
    }

    /// Renders the rule with a zoned DTSTART so the evaluator works in
    /// local time.
    fn rrule_set(&self, rule: &RecurrenceRule, anchor: DateTime<Utc>) -> Result<RRuleSet, CoreError> {
        let anchor_local = anchor.with_timezone(&self.timezone);
        let rrule_string = format!(
            "DTSTART;TZID={}:{}\nRRULE:{}",
            self.timezone.name(),
            anchor_local.format("%Y%m%dT%H%M%S"),
            codec::encode(&rule.applicable())
        );

        rrule_string
            .parse::<RRuleSet>()
            .map_err(|e| CoreError::InvalidRRule(format!("Failed to parse RRULE '{}': {}", rrule_string, e)))
    }

    fn sub_day(
        &self,
        rule: &RecurrenceRule,
        frequency: Frequency,
        anchor: DateTime<Utc>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        let step = match frequency {
            Frequency::Hourly => Duration::hours(i64::from(rule.interval)),
            _ => Duration::minutes(i64::from(rule.interval)),
        };
        let schedule = FixedIntervalSchedule::new(self.grid_base(rule, frequency, anchor), step);
        let reconciler = DstReconciler::new(self.timezone, anchor);

        let (shifted_from, shifted_to) = reconciler.shift_window(from, to);
        if (shifted_from, shifted_to) != (from, to) {
            tracing::debug!(%shifted_from, %shifted_to, "shifted window for offset change");
        }

        let candidates = schedule
            .between(shifted_from, shifted_to)
            .filter(|candidate| *candidate >= anchor);

        let mut occurrences = reconciler.reconcile(candidates);
        occurrences.retain(|instant| *instant >= from && *instant <= to);
        occurrences
    }

    /// Start of the tick grid. Hourly rules with a `minute_of_hour` tick on
    /// that minute of the anchor's local hour; ticks before the anchor are
    /// filtered out by the caller.
    fn grid_base(&self, rule: &RecurrenceRule, frequency: Frequency, anchor: DateTime<Utc>) -> DateTime<Utc> {
        match (frequency, rule.minute_of_hour) {
            (Frequency::Hourly, Some(minute)) => {
                let local_minute = anchor.with_timezone(&self.timezone).minute();
                anchor + Duration::minutes(i64::from(minute) - i64::from(local_minute))
            }
            _ => anchor,
        }
    }
}

/// Precondition shared by both projection operations.
fn ensure_projectable(rule: &RecurrenceRule) -> Result<Frequency, CoreError> {
    let violations = rule.validate();
    match rule.known_frequency() {
        Some(frequency) if violations.is_empty() => Ok(frequency),
        _ => Err(CoreError::InvalidRule(violations)),
    }
}

/// Occurrences of `rule` in `[from, to]`, in the zone named by `timezone_id`.
pub fn occurrences_between(
    rule: &RecurrenceRule,
    anchor: DateTime<Utc>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    timezone_id: &str,
) -> Result<Vec<DateTime<Tz>>, CoreError> {
    OccurrenceProjector::new(timezone_id)?.occurrences_between(rule, anchor, from, to)
}

/// Last occurrence at or before `boundary`, projected in the anchor's zone.
pub fn last_occurrence_before(
    rule: &RecurrenceRule,
    anchor: DateTime<Tz>,
    boundary: DateTime<Utc>,
) -> Result<Option<DateTime<Tz>>, CoreError> {
    OccurrenceProjector::with_timezone(anchor.timezone()).last_occurrence_before(
        rule,
        anchor.with_timezone(&Utc),
        boundary,
    )
}
