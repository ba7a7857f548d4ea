use anyhow::Result;
use owo_colors::OwoColorize;
use recur_core::codec::{decode, encode};
use recur_core::error::CoreError;
use recur_core::models::{RecurrenceRule, Violation};
use serde::Serialize;

use crate::cli::{DecodeCommand, ValidateCommand};
use crate::views::table::{display_rule, display_violations};

#[derive(Serialize)]
struct DecodedRule<'a> {
    rule: &'a RecurrenceRule,
    canonical: String,
    valid: bool,
    violations: Vec<Violation>,
}

pub fn decode_rule(command: DecodeCommand) -> Result<()> {
    let rule = decode(&command.rule);
    let violations = rule.validate();
    let canonical = encode(&rule);

    if command.json {
        let output = DecodedRule {
            rule: &rule,
            canonical,
            valid: violations.is_empty(),
            violations,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    display_rule(&rule);
    println!("{} {}", "Canonical:".bold(), canonical);
    if !violations.is_empty() {
        println!("{}", "Problems:".yellow().bold());
        display_violations(&violations);
    }
    Ok(())
}

pub fn validate_rule(command: ValidateCommand) -> Result<()> {
    let rule = decode(&command.rule);
    let violations = rule.validate();
    if !violations.is_empty() {
        return Err(CoreError::InvalidRule(violations).into());
    }

    println!("{} {}", "Valid:".green().bold(), encode(&rule));
    Ok(())
}
