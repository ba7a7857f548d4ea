use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use recur_core::codec::decode;
use recur_core::recurrence::OccurrenceProjector;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{BetweenCommand, LastCommand};
use crate::config::Config;
use crate::parser::parse_datetime;
use crate::timezone::resolve_timezone;
use crate::views::table::display_occurrences;

#[derive(Serialize)]
struct ProjectionOutput {
    timezone: String,
    occurrences: Vec<String>,
}

impl ProjectionOutput {
    fn new(timezone: Tz, occurrences: &[DateTime<Tz>]) -> Self {
        Self {
            timezone: timezone.name().to_string(),
            occurrences: occurrences.iter().map(|o| o.to_rfc3339()).collect(),
        }
    }
}

pub fn occurrences_between(command: BetweenCommand, config: &Config) -> Result<()> {
    let timezone = resolve_timezone(command.zone.tz.as_deref(), config)?;
    let rule = decode(&command.rule);
    let anchor = parse_datetime(&command.anchor, timezone)?;
    let from = parse_datetime(&command.from, timezone)?;
    let to = parse_datetime(&command.to, timezone)?;
    debug!(%anchor, %from, %to, %timezone, "projecting window");

    let projector = OccurrenceProjector::with_timezone(timezone);
    let mut occurrences = projector.occurrences_between(&rule, anchor, from, to)?;

    let limit = command.limit.unwrap_or(config.max_occurrences);
    if occurrences.len() > limit {
        info!(total = occurrences.len(), limit, "truncating occurrence list");
        occurrences.truncate(limit);
    }

    if command.zone.json {
        let output = ProjectionOutput::new(projector.timezone(), &occurrences);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        display_occurrences(&occurrences, &config.datetime_format);
    }
    Ok(())
}

pub fn last_occurrence(command: LastCommand, config: &Config) -> Result<()> {
    let timezone = resolve_timezone(command.zone.tz.as_deref(), config)?;
    let rule = decode(&command.rule);
    let anchor = parse_datetime(&command.anchor, timezone)?;
    let boundary = parse_datetime(&command.before, timezone)?;

    let projector = OccurrenceProjector::with_timezone(timezone);
    let last = projector.last_occurrence_before(&rule, anchor, boundary)?;

    if command.zone.json {
        let found: Vec<DateTime<Tz>> = last.into_iter().collect();
        let output = ProjectionOutput::new(projector.timezone(), &found);
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match last {
        Some(occurrence) => display_occurrences(&[occurrence], &config.datetime_format),
        None => println!(
            "No occurrence at or before {}.",
            boundary.with_timezone(&projector.timezone()).format(&config.datetime_format)
        ),
    }
    Ok(())
}
