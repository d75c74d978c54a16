pub mod account;
pub mod conditions;
pub mod config;
pub mod rules;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use wallarm_rules::RuleState;

/// A single JSON document or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Parse `file` (or stdin) as one `T` or an array of them.
pub fn read_list<T: DeserializeOwned>(file: Option<&Path>) -> Result<Vec<T>> {
    let content = read_input(file)?;
    parse_list(&content)
}

fn parse_list<T: DeserializeOwned>(content: &str) -> Result<Vec<T>> {
    let parsed: OneOrMany<T> = serde_json::from_str(content).context("Invalid JSON")?;
    Ok(parsed.into())
}

/// States recorded in `path`; a missing file holds none.
pub fn load_states(path: &Path) -> Result<Vec<RuleState>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_list(Some(path))
}

pub fn save_states(path: &Path, states: &[RuleState]) -> Result<()> {
    let content = serde_json::to_string_pretty(states)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write state file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallarm_core::{RuleSpec, RuleType};

    fn state(rule_id: i64) -> RuleState {
        let mut spec = RuleSpec::new(RuleType::WallarmMode);
        spec.mode = Some("block".into());
        RuleState {
            client_id: 1,
            action_id: 2,
            rule_ids: vec![rule_id],
            spec,
        }
    }

    #[test]
    fn accepts_single_object_or_array() {
        let one: Vec<RuleSpec> =
            parse_list(r#"{"type": "wallarm_mode", "mode": "block"}"#).unwrap();
        assert_eq!(one.len(), 1);
        let many: Vec<RuleSpec> = parse_list(
            r#"[{"type": "wallarm_mode", "mode": "block"}, {"type": "vpatch", "attack_type": ["sqli"]}]"#,
        )
        .unwrap();
        assert_eq!(many[1].rule_type, RuleType::Vpatch);
    }

    #[test]
    fn state_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        assert!(load_states(&path).unwrap().is_empty());

        save_states(&path, &[state(3), state(4)]).unwrap();
        let loaded = load_states(&path).unwrap();
        assert_eq!(loaded, vec![state(3), state(4)]);
    }
}
