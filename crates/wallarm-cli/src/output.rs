use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use wallarm_core::{Condition, RuleRecord};
use wallarm_rules::RuleState;

use crate::cli::OutputFormat;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_rules(records: &[RuleRecord], format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        return print_json(records);
    }
    if records.is_empty() {
        println!("No rules found.");
        return Ok(());
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Action", "Type", "Conditions", "Updated"]);
    for record in records {
        builder.push_record([
            record.id.to_string(),
            record.action_id.to_string(),
            record.rule_type.clone(),
            describe_conditions(&record.action),
            format_timestamp(record.updated_at),
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
    println!("Total: {}", records.len());
    Ok(())
}

pub fn print_states(states: &[RuleState], format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        return print_json(states);
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Type", "Rules", "Conditions"]);
    for state in states {
        let id = state
            .id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let conditions = state
            .spec
            .conditions()
            .map(|c| describe_conditions(&c))
            .unwrap_or_else(|e| e.to_string());
        builder.push_record([
            id,
            state.spec.rule_type.to_string(),
            state.rule_ids.len().to_string(),
            conditions,
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub fn print_conditions(conditions: &[Condition], format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        return print_json(conditions);
    }
    if conditions.is_empty() {
        println!("No conditions (default branch).");
        return Ok(());
    }
    let mut builder = Builder::default();
    builder.push_record(["Type", "Point", "Value"]);
    for condition in conditions {
        builder.push_record([
            condition.match_type.to_string(),
            describe_point(condition),
            condition.value.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

fn describe_point(condition: &Condition) -> String {
    condition
        .point
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

/// `iequal header/HOST=example.com`, one condition per line.
pub fn describe_conditions(conditions: &[Condition]) -> String {
    if conditions.is_empty() {
        return "(default)".to_string();
    }
    conditions
        .iter()
        .map(|c| match &c.value {
            Some(value) => format!("{} {}={}", c.match_type, describe_point(c), value),
            None => format!("{} {}", c.match_type, describe_point(c)),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_timestamp(ts: Option<i64>) -> String {
    ts.and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string())
}
