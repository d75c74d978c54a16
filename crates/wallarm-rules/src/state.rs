use serde::{Deserialize, Serialize};
use wallarm_core::{ResourceId, RuleSpec};

/// What is known locally about a managed rule after create, read or import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleState {
    pub client_id: i64,
    pub action_id: i64,
    /// Server rule ids, one per expanded rule body.
    pub rule_ids: Vec<i64>,
    pub spec: RuleSpec,
}

impl RuleState {
    /// Identifier of the first owned rule.
    pub fn id(&self) -> Option<ResourceId> {
        self.ids().into_iter().next()
    }

    pub fn ids(&self) -> Vec<ResourceId> {
        self.rule_ids
            .iter()
            .map(|rule_id| ResourceId::new(self.client_id, self.action_id, *rule_id))
            .collect()
    }
}
