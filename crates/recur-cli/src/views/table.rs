use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use recur_core::models::{RecurrenceRule, Violation};
use recur_core::timezone::get_timezone_offset;

/// Attribute/value rows for a rule, with unrecognized codes highlighted.
pub fn display_rule(rule: &RecurrenceRule) {
    let violations = rule.validate();

    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);

    for (field, value) in rule.to_attributes() {
        let flagged = violations.iter().any(|v| v.field.as_str() == field);
        let mut value_cell = Cell::new(&value);
        if flagged {
            value_cell = value_cell.fg(Color::Red).add_attribute(Attribute::Bold);
        }
        let mut row = Row::new();
        row.add_cell(Cell::new(field));
        row.add_cell(value_cell);
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_violations(violations: &[Violation]) {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Problem"]);

    for violation in violations {
        let mut row = Row::new();
        row.add_cell(Cell::new(violation.field.as_str()).fg(Color::Yellow));
        row.add_cell(Cell::new(violation.to_string()));
        table.add_row(row);
    }

    println!("{table}");
}

/// One row per occurrence: local time, UTC offset and the UTC instant.
pub fn display_occurrences(occurrences: &[DateTime<Tz>], datetime_format: &str) {
    if occurrences.is_empty() {
        println!("No occurrences found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Local", "Offset", "UTC"]);

    for (index, occurrence) in occurrences.iter().enumerate() {
        let utc = occurrence.with_timezone(&Utc);
        let offset = get_timezone_offset(occurrence.timezone().name(), utc)
            .unwrap_or_else(|_| occurrence.format("%:z").to_string());

        let mut row = Row::new();
        row.add_cell(Cell::new(index + 1).fg(Color::DarkGrey));
        row.add_cell(Cell::new(occurrence.format(datetime_format)));
        row.add_cell(Cell::new(offset));
        row.add_cell(Cell::new(utc.to_rfc3339()));
        table.add_row(row);
    }

    println!("{table}");
}
