use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Violation;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid recurrence rule: {}", format_violations(.0))]
    InvalidRule(Vec<Violation>),

    #[error("Invalid window: start {from} is after end {to}")]
    InvalidWindow {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("Invalid RRULE: {0}")]
    InvalidRRule(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
