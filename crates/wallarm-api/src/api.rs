use async_trait::async_trait;
use wallarm_core::RuleRecord;

use crate::error::Result;
use crate::models::{ActionRead, ActionSummary, HintCreate, HintRead, UserDetails};

/// The rule endpoints the lifecycle needs.
///
/// [`crate::WallarmClient`] talks to the real API; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait RulesApi: Send + Sync {
    /// One page of rules matching the query, newest first.
    async fn read_rules(&self, query: &HintRead) -> Result<Vec<RuleRecord>>;

    /// One page of actions matching the query.
    async fn read_actions(&self, query: &ActionRead) -> Result<Vec<ActionSummary>>;

    async fn create_rule(&self, body: &HintCreate) -> Result<RuleRecord>;

    /// Delete a single rule.
    async fn delete_rule(&self, client_id: i64, rule_id: i64) -> Result<()>;

    /// Delete an action together with every rule attached to it.
    async fn delete_action(&self, action_id: i64) -> Result<()>;

    async fn user_details(&self) -> Result<UserDetails>;
}
