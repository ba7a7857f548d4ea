use crate::error::CoreError;
use chrono::{DateTime, Duration, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;
use std::str::FromStr;

/// Parse an IANA timezone name
pub fn parse_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone.trim())
        .map_err(|_| CoreError::InvalidTimezone(timezone.to_string()))
}

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<(), CoreError> {
    parse_timezone(timezone).map(|_| ())
}

/// UTC offset of `timezone` at the given instant (local minus UTC).
pub fn utc_offset(timezone: &Tz, at_time: DateTime<Utc>) -> Duration {
    let seconds = timezone
        .offset_from_utc_datetime(&at_time.naive_utc())
        .fix()
        .local_minus_utc();
    Duration::seconds(i64::from(seconds))
}

/// Get timezone offset string for display (e.g., "-05:00")
pub fn get_timezone_offset(timezone: &str, at_time: DateTime<Utc>) -> Result<String, CoreError> {
    let tz = parse_timezone(timezone)?;
    let local_dt = at_time.with_timezone(&tz);
    Ok(format!("{}", local_dt.format("%:z")))
}

/// Keeps sub-day recurrences on the wall clock across offset changes.
///
/// Sub-day candidates are generated on a fixed elapsed-time grid anchored at
/// the anchor instant. Left alone, that grid drifts by the size of every
/// offset change it crosses ("every hour at :00" would become ":00 minus one
/// hour" after spring forward). The reconciler measures that drift as
///
/// ```text
/// offset_delta(t) = utc_offset(anchor) - utc_offset(t)
/// ```
///
/// and applies it in two places: the query window is shifted back by it
/// before generation, and each generated candidate is shifted forward by it
/// afterwards. Candidates that collapse onto the same instant (the local
/// hour skipped by a spring-forward gap) are then deduplicated.
///
/// With a constant offset across the window every delta is zero and the
/// reconciler is the identity.
#[derive(Debug, Clone, Copy)]
pub struct DstReconciler {
    timezone: Tz,
    anchor_offset: Duration,
}

impl DstReconciler {
    pub fn new(timezone: Tz, anchor: DateTime<Utc>) -> Self {
        Self {
            timezone,
            anchor_offset: utc_offset(&timezone, anchor),
        }
    }

    /// Signed drift between the anchor's offset and the offset at `at`.
    #[inline]
    pub fn offset_delta(&self, at: DateTime<Utc>) -> Duration {
        self.anchor_offset - utc_offset(&self.timezone, at)
    }

    /// Moves the query window onto the elapsed-time grid.
    pub fn shift_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        (from - self.offset_delta(from), to - self.offset_delta(to))
    }

    /// Maps a raw grid candidate back onto the wall clock.
    #[inline]
    pub fn map(&self, candidate: DateTime<Utc>) -> DateTime<Utc> {
        candidate + self.offset_delta(candidate)
    }

    /// Maps every candidate and drops repeats, keeping first-seen order.
    pub fn reconcile<I>(&self, candidates: I) -> Vec<DateTime<Utc>>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let mut seen = HashSet::new();
        let mut collapsed = 0usize;
        let reconciled: Vec<_> = candidates
            .into_iter()
            .map(|candidate| self.map(candidate))
            .filter(|mapped| {
                let fresh = seen.insert(*mapped);
                if !fresh {
                    collapsed += 1;
                }
                fresh
            })
            .collect();

        if collapsed > 0 {
            tracing::debug!(
                timezone = %self.timezone.name(),
                collapsed,
                "collapsed candidates landing in a DST gap"
            );
        }
        reconciled
    }
}
