//! Rule ("hint") types: the local declaration, the server record, and the
//! fingerprint the reconciler compares them by.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::condition::{Condition, ConditionSpec, PointElement, normalize_conditions};
use crate::error::{CoreError, Result};
use crate::point::{align_point, expand_points, flatten_points};
use crate::serde_util::{lenient_string, lenient_strings, null_default, one_or_many};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Vpatch,
    WallarmMode,
    Regex,
    ExperimentalRegex,
    DisableRegex,
    DisableAttackType,
    SetResponseHeader,
    BinaryData,
    SensitiveData,
    ParserState,
    VariativeKeys,
    VariativeValues,
    Uploads,
    BruteCounter,
    DirbustCounter,
    BolaCounter,
}

/// Rule field that participates in reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Point,
    AttackType,
    Mode,
    Regex,
    RegexId,
    Name,
    Values,
    Parser,
    State,
    FileType,
}

impl RuleType {
    pub const ALL: &'static [RuleType] = &[
        Self::Vpatch,
        Self::WallarmMode,
        Self::Regex,
        Self::ExperimentalRegex,
        Self::DisableRegex,
        Self::DisableAttackType,
        Self::SetResponseHeader,
        Self::BinaryData,
        Self::SensitiveData,
        Self::ParserState,
        Self::VariativeKeys,
        Self::VariativeValues,
        Self::Uploads,
        Self::BruteCounter,
        Self::DirbustCounter,
        Self::BolaCounter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpatch => "vpatch",
            Self::WallarmMode => "wallarm_mode",
            Self::Regex => "regex",
            Self::ExperimentalRegex => "experimental_regex",
            Self::DisableRegex => "disable_regex",
            Self::DisableAttackType => "disable_attack_type",
            Self::SetResponseHeader => "set_response_header",
            Self::BinaryData => "binary_data",
            Self::SensitiveData => "sensitive_data",
            Self::ParserState => "parser_state",
            Self::VariativeKeys => "variative_keys",
            Self::VariativeValues => "variative_values",
            Self::Uploads => "uploads",
            Self::BruteCounter => "brute_counter",
            Self::DirbustCounter => "dirbust_counter",
            Self::BolaCounter => "bola_counter",
        }
    }

    /// Fields that identify a rule of this type within its action.
    pub fn compared_fields(&self) -> &'static [RuleField] {
        use RuleField::*;
        match self {
            Self::Vpatch | Self::DisableAttackType => &[Point, AttackType],
            Self::WallarmMode => &[Mode],
            Self::Regex | Self::ExperimentalRegex => &[Point, AttackType, Regex],
            Self::DisableRegex => &[Point, RegexId],
            Self::SetResponseHeader => &[Mode, Name, Values],
            Self::BinaryData | Self::SensitiveData | Self::VariativeKeys | Self::VariativeValues => {
                &[Point]
            }
            Self::ParserState => &[Point, Parser, State],
            Self::Uploads => &[Point, FileType],
            Self::BruteCounter | Self::DirbustCounter | Self::BolaCounter => &[],
        }
    }

    /// Whether one declaration becomes one server rule per attack type.
    pub fn expands_per_attack_type(&self) -> bool {
        matches!(self, Self::Vpatch)
    }

    pub fn has_point(&self) -> bool {
        self.compared_fields().contains(&RuleField::Point)
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::unknown_rule_type(s))
    }
}

/// Local declaration of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    /// Overrides the configured default client id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub action: Vec<ConditionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub point: Vec<Vec<String>>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub attack_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RuleSpec {
    pub fn new(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            client_id: None,
            action: Vec::new(),
            point: Vec::new(),
            attack_type: Vec::new(),
            mode: None,
            regex: None,
            regex_id: None,
            name: None,
            values: Vec::new(),
            parser: None,
            state: None,
            file_type: None,
            comment: None,
        }
    }

    /// Check that the fields this rule type needs are present.
    pub fn validate(&self) -> Result<()> {
        let missing = |field: &str| {
            Err(CoreError::invalid_condition(format!(
                "{} rule requires `{field}`",
                self.rule_type
            )))
        };
        for field in self.rule_type.compared_fields() {
            let present = match field {
                RuleField::Point => !self.point.is_empty(),
                RuleField::AttackType => !self.attack_type.is_empty(),
                RuleField::Mode => non_empty(&self.mode).is_some(),
                RuleField::Regex => non_empty(&self.regex).is_some(),
                RuleField::RegexId => self.regex_id.is_some(),
                RuleField::Name => non_empty(&self.name).is_some(),
                RuleField::Values => true,
                RuleField::Parser => non_empty(&self.parser).is_some(),
                RuleField::State => non_empty(&self.state).is_some(),
                RuleField::FileType => non_empty(&self.file_type).is_some(),
            };
            if !present {
                return missing(field_name(*field));
            }
        }
        if !self.rule_type.expands_per_attack_type() && self.attack_type.len() > 1 {
            return Err(CoreError::invalid_condition(format!(
                "{} rule takes a single attack type, got {}",
                self.rule_type,
                self.attack_type.len()
            )));
        }
        expand_points(&self.point)?;
        Ok(())
    }

    pub fn conditions(&self) -> Result<Vec<Condition>> {
        normalize_conditions(&self.action)
    }

    /// Attack types that each become one server rule.
    pub fn attack_types(&self) -> Vec<Option<&str>> {
        if self.rule_type.expands_per_attack_type() {
            self.attack_type.iter().map(|a| Some(a.as_str())).collect()
        } else {
            vec![self.attack_type.first().map(String::as_str)]
        }
    }

    /// Fingerprints of every server rule this declaration should own.
    pub fn expected_fingerprints(&self, action_id: Option<i64>) -> Result<Vec<RuleFingerprint>> {
        let point = align_point(&flatten_points(&expand_points(&self.point)?));
        let fields = self.rule_type.compared_fields();
        Ok(self
            .attack_types()
            .into_iter()
            .map(|attack_type| {
                RuleFingerprint {
                    rule_type: self.rule_type.as_str().to_string(),
                    action_id,
                    point: (!point.is_empty()).then(|| point.clone()),
                    attack_type: attack_type.map(str::to_string),
                    mode: non_empty(&self.mode),
                    regex: non_empty(&self.regex),
                    regex_id: self.regex_id,
                    name: non_empty(&self.name),
                    values: (!self.values.is_empty()).then(|| self.values.clone()),
                    parser: non_empty(&self.parser),
                    state: non_empty(&self.state),
                    file_type: non_empty(&self.file_type),
                }
                .masked(fields)
            })
            .collect())
    }
}

fn field_name(field: RuleField) -> &'static str {
    match field {
        RuleField::Point => "point",
        RuleField::AttackType => "attack_type",
        RuleField::Mode => "mode",
        RuleField::Regex => "regex",
        RuleField::RegexId => "regex_id",
        RuleField::Name => "name",
        RuleField::Values => "values",
        RuleField::Parser => "parser",
        RuleField::State => "state",
        RuleField::FileType => "file_type",
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

/// Rule record as returned by the hint list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: i64,
    #[serde(rename = "actionid")]
    pub action_id: i64,
    #[serde(rename = "clientid")]
    pub client_id: i64,
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default, deserialize_with = "null_default")]
    pub action: Vec<Condition>,
    #[serde(default, deserialize_with = "null_default")]
    pub point: Vec<PointElement>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub attack_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub regex: Option<String>,
    #[serde(default)]
    pub regex_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub values: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub parser: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub file_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub counter: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub comment: Option<String>,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

/// Normalized, comparable view of one rule.
///
/// Empty strings and lists are `None`, so a record that omits a field and a
/// declaration that leaves it blank compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFingerprint {
    pub rule_type: String,
    pub action_id: Option<i64>,
    pub point: Option<Vec<String>>,
    pub attack_type: Option<String>,
    pub mode: Option<String>,
    pub regex: Option<String>,
    pub regex_id: Option<i64>,
    pub name: Option<String>,
    pub values: Option<Vec<String>>,
    pub parser: Option<String>,
    pub state: Option<String>,
    pub file_type: Option<String>,
}

impl RuleFingerprint {
    pub fn of_record(record: &RuleRecord) -> Self {
        let point = align_point(&record.point);
        Self {
            rule_type: record.rule_type.clone(),
            action_id: Some(record.action_id),
            point: (!point.is_empty()).then_some(point),
            attack_type: non_empty(&record.attack_type),
            mode: non_empty(&record.mode),
            regex: non_empty(&record.regex),
            regex_id: record.regex_id,
            name: non_empty(&record.name),
            values: (!record.values.is_empty()).then(|| record.values.clone()),
            parser: non_empty(&record.parser),
            state: non_empty(&record.state),
            file_type: non_empty(&record.file_type),
        }
    }

    /// Keep only the type, the action id and the listed fields.
    pub fn masked(mut self, fields: &[RuleField]) -> Self {
        let keep = |field: RuleField| fields.contains(&field);
        if !keep(RuleField::Point) {
            self.point = None;
        }
        if !keep(RuleField::AttackType) {
            self.attack_type = None;
        }
        if !keep(RuleField::Mode) {
            self.mode = None;
        }
        if !keep(RuleField::Regex) {
            self.regex = None;
        }
        if !keep(RuleField::RegexId) {
            self.regex_id = None;
        }
        if !keep(RuleField::Name) {
            self.name = None;
        }
        if !keep(RuleField::Values) {
            self.values = None;
        }
        if !keep(RuleField::Parser) {
            self.parser = None;
        }
        if !keep(RuleField::State) {
            self.state = None;
        }
        if !keep(RuleField::FileType) {
            self.file_type = None;
        }
        self
    }

    /// Whether a server record satisfies this expected fingerprint.
    pub fn matches(&self, record: &RuleRecord) -> bool {
        let fields = self
            .rule_type
            .parse::<RuleType>()
            .map(|rule_type| rule_type.compared_fields())
            .unwrap_or(&[]);
        let mut actual = Self::of_record(record).masked(fields);
        if self.action_id.is_none() {
            actual.action_id = None;
        }
        *self == actual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::MatchType;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RuleRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn rule_type_round_trips_through_str() {
        for rule_type in RuleType::ALL {
            assert_eq!(rule_type.as_str().parse::<RuleType>().unwrap(), *rule_type);
            assert_eq!(
                serde_json::to_value(rule_type).unwrap(),
                json!(rule_type.as_str())
            );
        }
        assert!(matches!(
            "block_everything".parse::<RuleType>(),
            Err(CoreError::UnknownRuleType(_))
        ));
    }

    #[test]
    fn vpatch_expands_per_attack_type() {
        let mut spec = RuleSpec::new(RuleType::Vpatch);
        spec.attack_type = vec!["sqli".into(), "xss".into()];
        spec.point = vec![vec!["get".into(), "q".into()]];
        let fps = spec.expected_fingerprints(Some(10)).unwrap();
        assert_eq!(fps.len(), 2);
        assert_eq!(fps[0].attack_type.as_deref(), Some("sqli"));
        assert_eq!(fps[1].attack_type.as_deref(), Some("xss"));
        assert_eq!(fps[0].point, Some(vec!["get".to_string(), "q".to_string()]));
    }

    #[test]
    fn fingerprint_matches_echoed_record() {
        let mut spec = RuleSpec::new(RuleType::Regex);
        spec.attack_type = vec!["sqli".into()];
        spec.regex = Some("union.*select".into());
        spec.point = vec![vec!["post".into()], vec!["array".into(), "0".into()]];
        spec.comment = Some("ignored in comparison".into());
        let expected = spec.expected_fingerprints(Some(7)).unwrap().remove(0);

        let echoed = record(json!({
            "id": 1, "actionid": 7, "clientid": 42, "type": "regex",
            "action": null,
            "point": ["post", "array", 0.0],
            "attack_type": "sqli",
            "regex": "union.*select",
            "comment": "something else",
            "values": null
        }));
        assert!(expected.matches(&echoed));

        let other_action = record(json!({
            "id": 1, "actionid": 8, "clientid": 42, "type": "regex",
            "point": ["post", "array", 0], "attack_type": "sqli", "regex": "union.*select"
        }));
        assert!(!expected.matches(&other_action));
    }

    #[test]
    fn mode_rule_ignores_point() {
        let mut spec = RuleSpec::new(RuleType::WallarmMode);
        spec.mode = Some("block".into());
        let expected = spec.expected_fingerprints(None).unwrap().remove(0);
        let echoed = record(json!({
            "id": 3, "actionid": 99, "clientid": 1, "type": "wallarm_mode",
            "mode": "block", "point": ["header", "X"]
        }));
        assert!(expected.matches(&echoed));
        let monitoring = record(json!({
            "id": 3, "actionid": 99, "clientid": 1, "type": "wallarm_mode", "mode": "monitoring"
        }));
        assert!(!expected.matches(&monitoring));
    }

    #[test]
    fn validate_reports_missing_fields() {
        let spec = RuleSpec::new(RuleType::WallarmMode);
        let err = spec.validate().unwrap_err();
        assert!(err.to_string().contains("`mode`"));

        let mut spec = RuleSpec::new(RuleType::Regex);
        spec.point = vec![vec!["post".into()]];
        spec.regex = Some("x".into());
        spec.attack_type = vec!["sqli".into(), "xss".into()];
        assert!(spec.validate().is_err());
        spec.attack_type.truncate(1);
        spec.validate().unwrap();
    }

    #[test]
    fn spec_parses_from_json() {
        let spec: RuleSpec = serde_json::from_value(json!({
            "type": "vpatch",
            "attack_type": "sqli",
            "action": [{ "type": "iequal", "point": { "header": "host" }, "value": "Example.com" }],
            "point": [["get", "id"]]
        }))
        .unwrap();
        assert_eq!(spec.attack_type, vec!["sqli"]);
        let conditions = spec.conditions().unwrap();
        assert_eq!(conditions[0].match_type, MatchType::Iequal);
        assert_eq!(conditions[0].value.as_deref(), Some("example.com"));
    }

    #[test]
    fn record_tolerates_loose_payloads() {
        let r = record(json!({
            "id": 5, "actionid": 6, "clientid": 7, "type": "set_response_header",
            "action": [{ "type": "equal", "point": ["path", 0], "value": 12 }],
            "mode": "append", "name": "X-Frame-Options", "values": ["DENY", 1]
        }));
        assert_eq!(r.action[0].value.as_deref(), Some("12"));
        assert_eq!(r.values, vec!["DENY", "1"]);
        assert!(!r.validated);
    }
}
