//! Request and response bodies of the hint, action and user endpoints.

use serde::{Deserialize, Serialize};
use wallarm_core::serde_util::null_default;
use wallarm_core::{
    Condition, CoreError, PointElement, RuleRecord, RuleSpec, RuleType, expand_points,
};

/// Largest page the list endpoints return.
pub const PAGE_SIZE: u32 = 1000;

/// Standard `{"status": ..., "body": ...}` wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<u16>,
    pub body: T,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HintFilter {
    pub clientid: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actionid: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub id: Vec<i64>,
    #[serde(rename = "type", skip_serializing_if = "Vec::is_empty")]
    pub rule_type: Vec<String>,
}

/// Body of `POST /v1/objects/hint`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HintRead {
    pub filter: HintFilter,
    pub order_by: String,
    pub order_desc: bool,
    pub limit: u32,
    pub offset: u32,
}

impl HintRead {
    /// Newest first, which is the order reconciliation relies on.
    pub fn new(filter: HintFilter) -> Self {
        Self {
            filter,
            order_by: "updated_at".to_string(),
            order_desc: true,
            limit: PAGE_SIZE,
            offset: 0,
        }
    }

    pub fn for_client(client_id: i64) -> Self {
        Self::new(HintFilter {
            clientid: vec![client_id],
            ..Default::default()
        })
    }

    pub fn action(mut self, action_id: i64) -> Self {
        self.filter.actionid = vec![action_id];
        self
    }

    pub fn rule(mut self, rule_id: i64) -> Self {
        self.filter.id = vec![rule_id];
        self
    }

    pub fn rule_type(mut self, rule_type: RuleType) -> Self {
        self.filter.rule_type = vec![rule_type.as_str().to_string()];
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionFilter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub id: Vec<i64>,
    pub clientid: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hint_type: Vec<String>,
}

/// Body of `POST /v1/objects/action`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRead {
    pub filter: ActionFilter,
    pub limit: u32,
    pub offset: u32,
}

impl ActionRead {
    pub fn for_client(client_id: i64) -> Self {
        Self {
            filter: ActionFilter {
                clientid: vec![client_id],
                ..Default::default()
            },
            limit: PAGE_SIZE,
            offset: 0,
        }
    }

    pub fn hint_type(mut self, rule_type: RuleType) -> Self {
        self.filter.hint_type = vec![rule_type.as_str().to_string()];
        self
    }

    pub fn action(mut self, action_id: i64) -> Self {
        self.filter.id = vec![action_id];
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Action as listed by the action endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSummary {
    pub id: i64,
    pub clientid: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub conditions: Vec<Condition>,
    /// Number of rules attached to the action.
    #[serde(default)]
    pub hints: u32,
    #[serde(default)]
    pub grouped_hints_count: u32,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl ActionSummary {
    /// Whether deleting its last rule should remove the whole action.
    pub fn holds_single_rule(&self) -> bool {
        self.hints == 1 && self.grouped_hints_count == 1
    }
}

/// Body of `POST /v1/objects/hint/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HintCreate {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub action: Vec<Condition>,
    pub clientid: i64,
    pub validated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub point: Vec<Vec<PointElement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl HintCreate {
    /// One create body per server rule the declaration expands into.
    pub fn for_spec(spec: &RuleSpec, client_id: i64) -> Result<Vec<Self>, CoreError> {
        spec.validate()?;
        let action = spec.conditions()?;
        let point = expand_points(&spec.point)?;
        Ok(spec
            .attack_types()
            .into_iter()
            .map(|attack_type| Self {
                rule_type: spec.rule_type,
                action: action.clone(),
                clientid: client_id,
                validated: false,
                point: point.clone(),
                attack_type: attack_type.map(str::to_string),
                mode: spec.mode.clone(),
                regex: spec.regex.clone(),
                regex_id: spec.regex_id,
                name: spec.name.clone(),
                values: spec.values.clone(),
                parser: spec.parser.clone(),
                state: spec.state.clone(),
                file_type: spec.file_type.clone(),
                comment: spec.comment.clone(),
            })
            .collect())
    }
}

pub type HintCreated = Envelope<RuleRecord>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HintDeleteFilter {
    pub clientid: Vec<i64>,
    pub id: i64,
}

/// Body of `POST /v1/objects/hint/delete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HintDelete {
    pub filter: HintDeleteFilter,
}

impl HintDelete {
    pub fn new(client_id: i64, rule_id: i64) -> Self {
        Self {
            filter: HintDeleteFilter {
                clientid: vec![client_id],
                id: rule_id,
            },
        }
    }
}

/// Account behind the configured credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    #[serde(default)]
    pub id: Option<i64>,
    pub clientid: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub realname: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub permissions: Vec<String>,
}
