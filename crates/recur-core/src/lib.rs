//! # Recur Core Library
//!
//! Recurrence rules, their compact RRULE text form, and projection of a rule
//! onto concrete occurrence instants that respect daylight-saving time.
//!
//! ## Features
//!
//! - **Rule Model**: Six frequencies with interval and the frequency-specific
//!   fields (monthly by date or by nth weekday, weekly on a weekday, hourly
//!   on a minute), with full field-level validation
//! - **RRULE Codec**: Canonical encoder and lenient decoder for the
//!   `FREQ/INTERVAL/BYDAY/BYMONTHDAY/BYMINUTE/BYSETPOS` subset
//! - **Timezone Awareness**: Full IANA timezone support; "every hour" stays on
//!   the hour across spring-forward and fall-back
//!
//! ## Core Modules
//!
//! - [`models`]: Recurrence rule, code enums and validation
//! - [`codec`]: Text encoding and decoding
//! - [`recurrence`]: Occurrence projection
//! - [`timezone`]: Timezone utilities and the DST reconciler
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::{TimeZone, Utc};
//! use recur_core::{codec, recurrence::OccurrenceProjector, CoreError};
//!
//! fn main() -> Result<(), CoreError> {
//!     let rule = codec::decode("FREQ=HOURLY;INTERVAL=1");
//!     assert!(rule.is_valid());
//!
//!     let projector = OccurrenceProjector::new("America/New_York")?;
//!     let anchor = Utc.with_ymd_and_hms(2023, 3, 1, 5, 0, 0).unwrap();
//!     let from = Utc.with_ymd_and_hms(2023, 3, 12, 5, 0, 0).unwrap();
//!     let to = Utc.with_ymd_and_hms(2023, 3, 13, 3, 59, 59).unwrap();
//!
//!     // 23 occurrences: 02:00 does not exist that day
//!     for occurrence in projector.occurrences_between(&rule, anchor, from, to)? {
//!         println!("{}", occurrence.format("%Y-%m-%d %H:%M %Z"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod timezone;

pub use codec::{decode, encode};
pub use error::CoreError;
pub use models::{Coded, Frequency, MonthlyOption, RecurrenceRule, RuleField, Violation, ViolationKind, Weekday};
pub use recurrence::{last_occurrence_before, occurrences_between, OccurrenceProjector};
pub use timezone::DstReconciler;
