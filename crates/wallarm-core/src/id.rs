//! Composite resource identifiers, `{clientID}/{actionID}/{ruleID}`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

pub const RESOURCE_ID_FORMAT: &str = "{clientID}/{actionID}/{ruleID}";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub client_id: i64,
    pub action_id: i64,
    pub rule_id: i64,
    /// Optional fourth part, e.g. the rule type on import.
    pub qualifier: Option<String>,
}

impl ResourceId {
    pub fn new(client_id: i64, action_id: i64, rule_id: i64) -> Self {
        Self {
            client_id,
            action_id,
            rule_id,
            qualifier: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }
}

impl FromStr for ResourceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CoreError::invalid_resource_id(s, RESOURCE_ID_FORMAT);
        let parts: Vec<&str> = s.split('/').collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(invalid());
        }
        let number = |raw: &str| raw.trim().parse::<i64>().map_err(|_| invalid());
        let qualifier = match parts.get(3) {
            Some(q) if q.is_empty() => return Err(invalid()),
            Some(q) => Some(q.to_string()),
            None => None,
        };
        Ok(Self {
            client_id: number(parts[0])?,
            action_id: number(parts[1])?,
            rule_id: number(parts[2])?,
            qualifier,
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.client_id, self.action_id, self.rule_id)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "/{qualifier}")?;
        }
        Ok(())
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
