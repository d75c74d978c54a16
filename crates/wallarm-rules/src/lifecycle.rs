//! Create, read, delete and import of rules, generic over [`RulesApi`].

use wallarm_api::{
    ActionRead, ApiError, HintCreate, HintRead, RulesApi, read_all_actions, read_all_rules,
};
use wallarm_core::{
    Condition, ConditionSpec, ResourceId, RuleRecord, RuleSpec, RuleType, align_point,
    conditions_equal, expand_points, flatten_points, wrap_point,
};

use crate::error::{Result, RuleError};
use crate::matcher::match_rules;
use crate::state::RuleState;

pub struct RuleManager<A> {
    api: A,
    client_id: Option<i64>,
    ignore_existing: bool,
}

impl<A: RulesApi> RuleManager<A> {
    /// `client_id` is the default used when a declaration does not set its own.
    pub fn new(api: A, client_id: Option<i64>) -> Self {
        Self {
            api,
            client_id,
            ignore_existing: false,
        }
    }

    /// Adopt matching remote rules on create instead of failing.
    pub fn ignore_existing(mut self, ignore: bool) -> Self {
        self.ignore_existing = ignore;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn client_id_for(&self, spec: &RuleSpec) -> Result<i64> {
        spec.client_id
            .or(self.client_id)
            .ok_or(RuleError::MissingClientId)
    }

    /// All rules of the client, optionally of one type, newest first.
    pub async fn list(&self, client_id: i64, rule_type: Option<RuleType>) -> Result<Vec<RuleRecord>> {
        let mut query = HintRead::for_client(client_id);
        if let Some(rule_type) = rule_type {
            query = query.rule_type(rule_type);
        }
        read_all_rules(&self.api, &query)
            .await
            .map_err(RuleError::api("hint read"))
    }

    /// Find a remote rule equivalent to `spec`: an action with set-equal
    /// conditions holding a rule with the same identifying fields.
    pub async fn exists(&self, spec: &RuleSpec) -> Result<Option<ResourceId>> {
        let client_id = self.client_id_for(spec)?;
        let conditions = spec.conditions()?;

        let actions = read_all_actions(
            &self.api,
            &ActionRead::for_client(client_id).hint_type(spec.rule_type),
        )
        .await
        .map_err(RuleError::api("action read"))?;

        let Some(action) = actions
            .iter()
            .find(|action| conditions_equal(&conditions, &action.conditions))
        else {
            tracing::debug!(client_id, rule_type = %spec.rule_type, "no action with matching conditions");
            return Ok(None);
        };

        let expected = spec.expected_fingerprints(Some(action.id))?;
        let rules = self
            .candidates(client_id, action.id, spec.rule_type)
            .await?;

        Ok(rules
            .iter()
            .find(|record| expected.iter().any(|fp| fp.matches(record)))
            .map(|record| ResourceId::new(client_id, action.id, record.id)))
    }

    /// Create the rule(s) a declaration expands into.
    ///
    /// With `ignore_existing`, rules already present on the matching action
    /// are adopted and only the missing ones are created.
    pub async fn create(&self, spec: &RuleSpec) -> Result<RuleState> {
        spec.validate()?;
        let client_id = self.client_id_for(spec)?;
        let bodies = HintCreate::for_spec(spec, client_id)?;

        let mut action_id = None;
        let mut rule_ids = Vec::with_capacity(bodies.len());
        let mut pending: Vec<&HintCreate> = bodies.iter().collect();

        if let Some(existing) = self.exists(spec).await? {
            if !self.ignore_existing {
                return Err(RuleError::ImportRequired {
                    id: existing,
                    rule_type: spec.rule_type.to_string(),
                });
            }
            let candidates = self
                .candidates(client_id, existing.action_id, spec.rule_type)
                .await?;
            let expected = spec.expected_fingerprints(Some(existing.action_id))?;
            let outcome = match_rules(&expected, &spec.conditions()?, &[], &candidates);
            tracing::info!(
                id = %existing,
                adopted = outcome.matched.len(),
                missing = outcome.missing.len(),
                "adopting existing rule"
            );
            action_id = Some(existing.action_id);
            rule_ids = outcome.rule_ids();
            pending = outcome
                .missing
                .iter()
                .filter_map(|index| bodies.get(*index))
                .collect();
        }

        for body in pending {
            let record = match self.api.create_rule(body).await {
                Ok(record) => record,
                Err(err) if err.is_already_exists() => {
                    return Err(self.already_exists(spec, err).await);
                }
                Err(err) => return Err(RuleError::api("hint create")(err)),
            };
            action_id.get_or_insert(record.action_id);
            rule_ids.push(record.id);
        }
        let action_id = action_id.unwrap_or_default();

        tracing::info!(client_id, action_id, ?rule_ids, rule_type = %spec.rule_type, "rule created");
        Ok(RuleState {
            client_id,
            action_id,
            rule_ids,
            spec: spec.clone(),
        })
    }

    /// The server refused a create as a duplicate: point at the rule to import.
    async fn already_exists(&self, spec: &RuleSpec, err: ApiError) -> RuleError {
        match self.exists(spec).await {
            Ok(Some(id)) => RuleError::ImportRequired {
                id,
                rule_type: spec.rule_type.to_string(),
            },
            _ => RuleError::api("hint create")(err),
        }
    }

    /// Reconcile local state with the server. `None` means no remote rule
    /// matches any more and the rule has to be recreated.
    pub async fn read(&self, state: &RuleState) -> Result<Option<RuleState>> {
        let conditions = state.spec.conditions()?;
        let expected = state.spec.expected_fingerprints(Some(state.action_id))?;

        let candidates = self
            .candidates(state.client_id, state.action_id, state.spec.rule_type)
            .await?;

        let outcome = match_rules(&expected, &conditions, &state.rule_ids, &candidates);
        for orphan in &outcome.orphaned {
            tracing::warn!(
                client_id = state.client_id,
                action_id = orphan.action_id,
                rule_id = orphan.id,
                rule_type = %orphan.rule_type,
                "remote rule does not match the local declaration"
            );
        }

        if outcome.is_empty() {
            tracing::info!(
                client_id = state.client_id,
                action_id = state.action_id,
                rule_ids = ?state.rule_ids,
                candidates = candidates.len(),
                "rule not found, clearing id"
            );
            return Ok(None);
        }

        Ok(Some(RuleState {
            rule_ids: outcome.rule_ids(),
            spec: refresh_spec(&state.spec, &conditions, &outcome.matched)?,
            ..state.clone()
        }))
    }

    /// Rules of one type attached to an action, newest first.
    async fn candidates(
        &self,
        client_id: i64,
        action_id: i64,
        rule_type: RuleType,
    ) -> Result<Vec<RuleRecord>> {
        read_all_rules(
            &self.api,
            &HintRead::for_client(client_id)
                .action(action_id)
                .rule_type(rule_type),
        )
        .await
        .map_err(RuleError::api("hint read"))
    }

    /// Delete owned rules. When the action holds only this rule the whole
    /// action goes. Already-deleted rules are not an error.
    pub async fn delete(&self, state: &RuleState) -> Result<()> {
        self.delete_rules(state.client_id, state.action_id, &state.rule_ids)
            .await
    }

    /// Delete the rule a resource id points at.
    pub async fn delete_by_id(&self, id: &ResourceId) -> Result<()> {
        self.delete_rules(id.client_id, id.action_id, &[id.rule_id])
            .await
    }

    async fn delete_rules(&self, client_id: i64, action_id: i64, rule_ids: &[i64]) -> Result<()> {
        let actions = read_all_actions(
            &self.api,
            &ActionRead::for_client(client_id).action(action_id),
        )
        .await
        .map_err(RuleError::api("action read"))?;

        let single = rule_ids.len() == 1
            && actions
                .iter()
                .find(|action| action.id == action_id)
                .is_some_and(|action| action.holds_single_rule());

        if single {
            let result = self.api.delete_action(action_id).await;
            return ignore_not_found(result, "action delete", action_id);
        }

        for rule_id in rule_ids {
            let result = self.api.delete_rule(client_id, *rule_id).await;
            ignore_not_found(result, "hint delete", *rule_id)?;
        }
        Ok(())
    }

    /// Rebuild local state from an existing remote rule.
    pub async fn import(&self, id: &ResourceId, rule_type: RuleType) -> Result<RuleState> {
        let records = read_all_rules(&self.api, &HintRead::for_client(id.client_id).rule(id.rule_id))
            .await
            .map_err(RuleError::api("hint read"))?;

        let record = records
            .into_iter()
            .find(|r| r.id == id.rule_id && r.action_id == id.action_id)
            .ok_or_else(|| RuleError::NotFound(id.clone()))?;

        if record.rule_type != rule_type.as_str() {
            return Err(RuleError::TypeMismatch {
                id: id.clone(),
                expected: rule_type.to_string(),
                actual: record.rule_type,
            });
        }

        let spec = spec_from_record(&record, rule_type)?;
        tracing::info!(id = %id, rule_type = %rule_type, "rule imported");
        Ok(RuleState {
            client_id: record.client_id,
            action_id: record.action_id,
            rule_ids: vec![record.id],
            spec,
        })
    }
}

fn ignore_not_found(
    result: wallarm_api::Result<()>,
    operation: &'static str,
    id: i64,
) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.is_not_found() => {
            tracing::info!(operation, id, "already deleted");
            Ok(())
        }
        Err(err) => Err(RuleError::api(operation)(err)),
    }
}

/// The local declaration with every field the server holds for the matched
/// rules. Conditions and point keep their local spelling while they are
/// equivalent to the server's; the client override and comment stay local.
fn refresh_spec(
    local: &RuleSpec,
    conditions: &[Condition],
    matched: &[&RuleRecord],
) -> Result<RuleSpec> {
    let Some(first) = matched.first() else {
        return Ok(local.clone());
    };
    let mut spec = spec_from_record(first, local.rule_type)?;
    spec.client_id = local.client_id;
    spec.comment = local.comment.clone();
    if conditions_equal(conditions, &first.action) {
        spec.action = local.action.clone();
    }
    if align_point(&flatten_points(&expand_points(&local.point)?)) == align_point(&first.point) {
        spec.point = local.point.clone();
    }
    if local.rule_type.expands_per_attack_type() {
        spec.attack_type = matched
            .iter()
            .filter_map(|record| record.attack_type.clone())
            .collect();
    }
    Ok(spec)
}

/// Map a server record back to the declaration that would produce it.
pub fn spec_from_record(record: &RuleRecord, rule_type: RuleType) -> Result<RuleSpec> {
    let action = record
        .action
        .iter()
        .map(|condition| condition.to_spec())
        .collect::<wallarm_core::Result<Vec<ConditionSpec>>>()?;

    let mut spec = RuleSpec::new(rule_type);
    spec.client_id = Some(record.client_id);
    spec.action = action;
    spec.point = wrap_point(&align_point(&record.point));
    spec.attack_type = record.attack_type.iter().cloned().collect();
    spec.mode = record.mode.clone();
    spec.regex = record.regex.clone();
    spec.regex_id = record.regex_id;
    spec.name = record.name.clone();
    spec.values = record.values.clone();
    spec.parser = record.parser.clone();
    spec.state = record.state.clone();
    spec.file_type = record.file_type.clone();
    spec.comment = record.comment.clone();
    Ok(spec)
}
