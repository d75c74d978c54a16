use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use wallarm_api::RulesApi;
use wallarm_core::{ResourceId, RuleSpec, RuleType};
use wallarm_rules::{RuleManager, RuleState};

use crate::cli::OutputFormat;
use crate::output::{print_rules, print_states, print_success, print_warning};

pub async fn list<A: RulesApi>(
    manager: &RuleManager<A>,
    client_id: i64,
    rule_type: Option<RuleType>,
    format: OutputFormat,
) -> Result<()> {
    let records = manager.list(client_id, rule_type).await?;
    print_rules(&records, format)
}

/// Create every declared rule, appending the results to `state` when given.
/// Stops at the first failure; rules created before it are still recorded.
pub async fn apply<A: RulesApi>(
    manager: &RuleManager<A>,
    file: &Path,
    state: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let specs: Vec<RuleSpec> = super::read_list(Some(file))?;
    let mut created = Vec::with_capacity(specs.len());
    let mut failure = None;
    for (index, spec) in specs.iter().enumerate() {
        match manager.create(spec).await {
            Ok(rule) => created.push(rule),
            Err(e) => {
                failure = Some(anyhow::Error::new(e).context(format!(
                    "Rule #{index} ({}) could not be created",
                    spec.rule_type
                )));
                break;
            }
        }
    }

    if let Some(path) = state {
        let mut states = super::load_states(path)?;
        states.extend(created.iter().cloned());
        super::save_states(path, &states)?;
    }

    if let Some(err) = failure {
        return Err(err);
    }
    print_success(&format!("Applied {} rule(s)", created.len().to_string().cyan()));
    print_states(&created, format)
}

/// Reconcile every entry of a state file. Entries whose rules vanished are
/// dropped from the result.
pub async fn read<A: RulesApi>(
    manager: &RuleManager<A>,
    state: &Path,
    write: bool,
    format: OutputFormat,
) -> Result<()> {
    let states = super::load_states(state)?;
    let mut current = Vec::with_capacity(states.len());
    for entry in &states {
        match manager.read(entry).await? {
            Some(found) => current.push(found),
            None => print_warning(&format!(
                "{} rule(s) of action {} are gone and must be recreated",
                entry.spec.rule_type, entry.action_id
            )),
        }
    }

    if write {
        super::save_states(state, &current)?;
        print_success(&format!("Updated {}", state.display()));
    }
    print_states(&current, format)
}

pub async fn delete_id<A: RulesApi>(manager: &RuleManager<A>, id: &str) -> Result<()> {
    let id: ResourceId = id.parse()?;
    manager.delete_by_id(&id).await?;
    print_success(&format!("Deleted rule {}", id.to_string().cyan()));
    Ok(())
}

/// Delete every rule recorded in `state` and empty the file.
pub async fn delete_state<A: RulesApi>(manager: &RuleManager<A>, state: &Path) -> Result<()> {
    let states = super::load_states(state)?;
    for entry in &states {
        manager
            .delete(entry)
            .await
            .with_context(|| format!("Failed to delete rules of action {}", entry.action_id))?;
    }
    super::save_states(state, &[])?;
    print_success(&format!("Deleted {} rule set(s)", states.len()));
    Ok(())
}

pub async fn import<A: RulesApi>(
    manager: &RuleManager<A>,
    id: &str,
    rule_type: RuleType,
    state: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let id: ResourceId = id.parse()?;
    let imported = manager.import(&id, rule_type).await?;

    if let Some(path) = state {
        let mut states: Vec<RuleState> = super::load_states(path)?;
        states.retain(|s| !(s.action_id == imported.action_id && s.rule_ids == imported.rule_ids));
        states.push(imported.clone());
        super::save_states(path, &states)?;
    }
    print_success(&format!("Imported rule {}", id.to_string().cyan()));
    print_states(std::slice::from_ref(&imported), format)
}
