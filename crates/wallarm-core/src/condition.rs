//! Action conditions: the match predicates attached to every rule.
//!
//! A [`ConditionSpec`] is the declarative form a user writes:
//!
//! ```json
//! { "type": "iequal", "value": "Example.COM", "point": { "header": "host" } }
//! ```
//!
//! [`normalize_conditions`] turns a collection of specs into canonical
//! [`Condition`]s, the exact shape the API stores and echoes back:
//!
//! ```json
//! { "type": "iequal", "point": ["header", "HOST"], "value": "example.com" }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{CoreError, Result};
use crate::serde_util::{lenient_string, null_default};

/// How a condition compares the located request part with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Equal,
    /// Case-insensitive equality; values are stored lower-cased.
    Iequal,
    Regex,
    /// Matches when the located part is missing; carries no value.
    Absent,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Iequal => "iequal",
            Self::Regex => "regex",
            Self::Absent => "absent",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "equal" => Ok(Self::Equal),
            "iequal" => Ok(Self::Iequal),
            "regex" => Ok(Self::Regex),
            "absent" => Ok(Self::Absent),
            other => Err(CoreError::invalid_condition(format!(
                "unknown match type {other:?}, expected one of equal, iequal, regex, absent"
            ))),
        }
    }
}

/// One element of a condition point or rule point.
///
/// Numbers are kept as `f64` because the API only ever echoes JSON numbers,
/// and comparing in that representation avoids int/float mismatches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PointElement {
    Number(f64),
    Text(String),
}

impl PointElement {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.parse().ok(),
        }
    }
}

impl Serialize for PointElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            Self::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

impl fmt::Display for PointElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if is_integral(*n) => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for PointElement {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for PointElement {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15
}

/// The part of an HTTP request a condition inspects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Request header by name; names are upper-cased.
    Header(String),
    /// URI path segment by index.
    Path(u32),
    /// Query string parameter by key; wire kind is `get`.
    Query(String),
    Method,
    Proto,
    Scheme,
    Uri,
    /// Application (pool) id.
    Instance,
    ActionName,
    ActionExt,
}

impl Locator {
    /// Key used for this locator in a [`ConditionSpec`] point map.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Header(_) => "header",
            Self::Path(_) => "path",
            Self::Query(_) => "query",
            Self::Method => "method",
            Self::Proto => "proto",
            Self::Scheme => "scheme",
            Self::Uri => "uri",
            Self::Instance => "instance",
            Self::ActionName => "action_name",
            Self::ActionExt => "action_ext",
        }
    }

    /// Whether the point-map string is the condition value rather than a selector.
    pub fn carries_value(&self) -> bool {
        !matches!(self, Self::Header(_) | Self::Path(_) | Self::Query(_))
    }

    /// Wire representation of the locator.
    pub fn point(&self) -> Vec<PointElement> {
        match self {
            Self::Header(name) => vec!["header".into(), PointElement::text(name.as_str())],
            Self::Path(index) => vec!["path".into(), PointElement::Number(f64::from(*index))],
            Self::Query(key) => vec!["get".into(), PointElement::text(key.as_str())],
            other => vec![other.kind().into()],
        }
    }

    /// Parse one point-map entry. Returns the locator and, for value-carrying
    /// locators, the value it implies.
    pub fn from_entry(kind: &str, raw: &str) -> Result<(Self, Option<String>)> {
        let with_value = |locator: Self| Ok((locator, Some(raw.to_string())));
        match kind {
            "header" => Ok((Self::Header(raw.to_string()), None)),
            "path" => Ok((Self::Path(parse_index(kind, raw)?), None)),
            "query" | "get" => Ok((Self::Query(raw.to_string()), None)),
            "method" => with_value(Self::Method),
            "proto" => with_value(Self::Proto),
            "scheme" => with_value(Self::Scheme),
            "uri" => with_value(Self::Uri),
            "instance" => with_value(Self::Instance),
            "action_name" => with_value(Self::ActionName),
            "action_ext" => with_value(Self::ActionExt),
            other => Err(CoreError::unknown_locator(other)),
        }
    }

    /// Recover the locator from a wire point as echoed by the API.
    pub fn from_point(point: &[PointElement]) -> Result<Self> {
        let describe = || {
            point
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("/")
        };
        let (head, rest) = point
            .split_first()
            .ok_or_else(|| CoreError::invalid_condition("condition point is empty"))?;
        let kind = head
            .as_text()
            .ok_or_else(|| CoreError::unknown_locator(describe()))?;

        match (kind, rest) {
            ("header", [name]) => Ok(Self::Header(name.to_string())),
            ("get", [key]) => Ok(Self::Query(key.to_string())),
            ("path", [index]) => {
                let raw = index.to_string();
                Ok(Self::Path(parse_index(kind, &raw)?))
            }
            (_, []) => match Self::from_entry(kind, "")? {
                (locator, Some(_)) => Ok(locator),
                _ => Err(CoreError::unknown_locator(describe())),
            },
            _ => Err(CoreError::unknown_locator(describe())),
        }
    }
}

fn parse_index(locator: &str, raw: &str) -> Result<u32> {
    let number: f64 = raw
        .trim()
        .parse()
        .map_err(|_| CoreError::invalid_number(locator, raw))?;
    if !number.is_finite() || number < 0.0 || number.fract() != 0.0 || number > f64::from(u32::MAX)
    {
        return Err(CoreError::invalid_number(locator, raw));
    }
    Ok(number as u32)
}

/// Declarative condition as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub point: BTreeMap<String, String>,
}

impl ConditionSpec {
    pub fn new(match_type: MatchType, kind: &str, locator: &str) -> Self {
        Self {
            match_type: Some(match_type),
            value: None,
            point: BTreeMap::from([(kind.to_string(), locator.to_string())]),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    fn locator(&self) -> Result<Option<(Locator, Option<String>)>> {
        let mut entries = self.point.iter();
        let Some((kind, raw)) = entries.next() else {
            return Ok(None);
        };
        if entries.next().is_some() {
            let kinds: Vec<&str> = self.point.keys().map(String::as_str).collect();
            return Err(CoreError::invalid_condition(format!(
                "point must name exactly one locator, got {}",
                kinds.join(", ")
            )));
        }
        Locator::from_entry(kind, raw).map(Some)
    }

    /// Canonicalize this spec. `Ok(None)` means the spec has no match type
    /// and only marks the default branch.
    pub fn normalize(&self) -> Result<Option<Condition>> {
        let located = self.locator()?;
        let match_type = match (&located, self.match_type) {
            (Some((Locator::Instance, _)), _) => MatchType::Equal,
            (_, Some(match_type)) => match_type,
            (_, None) => return Ok(None),
        };
        let Some((locator, implied)) = located else {
            return Err(CoreError::invalid_condition(format!(
                "condition of type {match_type} has no point"
            )));
        };
        let explicit = self.value.as_deref().filter(|v| !v.is_empty());
        let value = explicit.map(str::to_string).or(implied);
        Ok(Some(Condition::new(match_type, locator, value)))
    }
}

/// Canonical condition as stored by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub match_type: MatchType,
    #[serde(default, deserialize_with = "null_default")]
    pub point: Vec<PointElement>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
}

impl Condition {
    /// Build a condition, enforcing the case-folding and `absent` invariants.
    pub fn new(match_type: MatchType, locator: Locator, value: Option<String>) -> Self {
        let locator = match locator {
            Locator::Header(name) => Locator::Header(name.to_uppercase()),
            Locator::Query(key) if match_type == MatchType::Iequal => {
                Locator::Query(key.to_lowercase())
            }
            other => other,
        };
        let value = match match_type {
            MatchType::Absent => None,
            MatchType::Iequal => value.map(|v| v.to_lowercase()),
            MatchType::Equal | MatchType::Regex => value,
        };
        Self {
            match_type,
            point: locator.point(),
            value,
        }
    }

    pub fn locator(&self) -> Result<Locator> {
        Locator::from_point(&self.point)
    }

    /// Map back to the declarative form. Normalizing the result yields a
    /// condition equal to `self`.
    pub fn to_spec(&self) -> Result<ConditionSpec> {
        let locator = self.locator()?;
        let (entry, value) = match &locator {
            Locator::Header(name) => (name.clone(), self.value.clone()),
            Locator::Path(index) => (index.to_string(), self.value.clone()),
            Locator::Query(key) => (key.clone(), self.value.clone()),
            _ => (self.value.clone().unwrap_or_default(), None),
        };
        let match_type = match locator {
            Locator::Instance => None,
            _ => Some(self.match_type),
        };
        Ok(ConditionSpec {
            match_type,
            value,
            point: BTreeMap::from([(locator.kind().to_string(), entry)]),
        })
    }
}

/// Canonicalize a collection of condition specs, preserving input order.
///
/// Specs without a match type are dropped. The result is never "missing":
/// a configuration with no effective conditions yields an empty list, which
/// addresses the default branch.
pub fn normalize_conditions<'a, I>(specs: I) -> Result<Vec<Condition>>
where
    I: IntoIterator<Item = &'a ConditionSpec>,
{
    let mut conditions = Vec::new();
    for spec in specs {
        match spec.normalize()? {
            Some(condition) => conditions.push(condition),
            None => tracing::debug!(?spec, "skipping condition without match type"),
        }
    }
    Ok(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize_one(spec: ConditionSpec) -> Condition {
        spec.normalize().unwrap().unwrap()
    }

    #[test]
    fn header_name_is_upper_cased() {
        let c = normalize_one(
            ConditionSpec::new(MatchType::Equal, "header", "host").with_value("example.com"),
        );
        assert_eq!(c.point, vec![PointElement::text("header"), "HOST".into()]);
        assert_eq!(c.value.as_deref(), Some("example.com"));
    }

    #[test]
    fn iequal_lower_cases_value_and_query_key() {
        let c = normalize_one(
            ConditionSpec::new(MatchType::Iequal, "query", "UserName").with_value("ADMIN"),
        );
        assert_eq!(c.point, vec![PointElement::text("get"), "username".into()]);
        assert_eq!(c.value.as_deref(), Some("admin"));

        let c = normalize_one(
            ConditionSpec::new(MatchType::Equal, "query", "UserName").with_value("ADMIN"),
        );
        assert_eq!(c.point, vec![PointElement::text("get"), "UserName".into()]);
        assert_eq!(c.value.as_deref(), Some("ADMIN"));
    }

    #[test]
    fn path_index_is_numeric() {
        let c = normalize_one(
            ConditionSpec::new(MatchType::Equal, "path", "3").with_value("login"),
        );
        assert_eq!(c.point, vec![PointElement::text("path"), PointElement::Number(3.0)]);
        assert_eq!(serde_json::to_value(&c).unwrap()["point"], json!(["path", 3]));
    }

    #[test]
    fn path_index_must_be_a_number() {
        let err = ConditionSpec::new(MatchType::Equal, "path", "three")
            .normalize()
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidNumber { .. }));
    }

    #[test]
    fn path_index_is_a_segment_position() {
        for raw in ["1.5", "-1", "NaN"] {
            let err = ConditionSpec::new(MatchType::Equal, "path", raw)
                .normalize()
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidNumber { .. }), "{raw}");
        }
        let c = normalize_one(ConditionSpec::new(MatchType::Equal, "path", " 2.0 "));
        assert_eq!(c.point[1], PointElement::Number(2.0));
    }

    #[test]
    fn textual_locator_value_comes_from_point() {
        let c = normalize_one(ConditionSpec::new(MatchType::Iequal, "uri", "/API/Login"));
        assert_eq!(c.point, vec![PointElement::text("uri")]);
        assert_eq!(c.value.as_deref(), Some("/api/login"));

        let c = normalize_one(ConditionSpec::new(MatchType::Equal, "method", "POST"));
        assert_eq!(c.value.as_deref(), Some("POST"));
    }

    #[test]
    fn absent_drops_value() {
        let c = normalize_one(
            ConditionSpec::new(MatchType::Absent, "header", "x-debug").with_value("anything"),
        );
        assert_eq!(c.value, None);
        assert!(serde_json::to_value(&c).unwrap().get("value").is_none());

        let c = normalize_one(ConditionSpec::new(MatchType::Absent, "action_ext", "php"));
        assert_eq!(c.value, None);
    }

    #[test]
    fn instance_forces_equal() {
        let mut spec = ConditionSpec::new(MatchType::Regex, "instance", "7");
        let c = normalize_one(spec.clone());
        assert_eq!(c.match_type, MatchType::Equal);
        assert_eq!(c.value.as_deref(), Some("7"));

        spec.match_type = None;
        assert_eq!(normalize_one(spec).match_type, MatchType::Equal);
    }

    #[test]
    fn untyped_spec_is_default_branch() {
        let spec = ConditionSpec {
            point: BTreeMap::from([("header".to_string(), "HOST".to_string())]),
            ..Default::default()
        };
        assert!(spec.normalize().unwrap().is_none());
        let all = normalize_conditions([&spec, &ConditionSpec::default()]).unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn unknown_and_multiple_locators_are_rejected() {
        let err = ConditionSpec::new(MatchType::Equal, "cookie", "sid")
            .normalize()
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownLocator(_)));

        let mut spec = ConditionSpec::new(MatchType::Equal, "method", "GET");
        spec.point.insert("uri".into(), "/".into());
        assert!(matches!(
            spec.normalize().unwrap_err(),
            CoreError::InvalidCondition(_)
        ));
    }

    #[test]
    fn typed_spec_without_point_is_rejected() {
        let spec = ConditionSpec {
            match_type: Some(MatchType::Equal),
            value: Some("x".into()),
            ..Default::default()
        };
        assert!(matches!(
            spec.normalize().unwrap_err(),
            CoreError::InvalidCondition(_)
        ));
    }

    #[test]
    fn empty_input_is_empty_list() {
        let all = normalize_conditions(&Vec::<ConditionSpec>::new()).unwrap();
        assert!(all.is_empty());
        assert_eq!(serde_json::to_value(&all).unwrap(), json!([]));
    }

    #[test]
    fn api_echo_round_trips_to_spec() {
        let specs = vec![
            ConditionSpec::new(MatchType::Iequal, "header", "Host").with_value("Example.com"),
            ConditionSpec::new(MatchType::Equal, "path", "0").with_value("api"),
            ConditionSpec::new(MatchType::Iequal, "query", "Q").with_value("V"),
            ConditionSpec::new(MatchType::Iequal, "method", "POST"),
            ConditionSpec::new(MatchType::Absent, "action_ext", ""),
            ConditionSpec {
                point: BTreeMap::from([("instance".to_string(), "12".to_string())]),
                ..Default::default()
            },
        ];
        let normalized = normalize_conditions(&specs).unwrap();

        // Simulate the API echo with reordered JSON fields.
        let echoed: Vec<Condition> = normalized
            .iter()
            .map(|c| {
                let v = serde_json::to_value(c).unwrap();
                let reordered = json!({ "value": v.get("value"), "point": v["point"], "type": v["type"] });
                serde_json::from_value(reordered).unwrap()
            })
            .collect();
        assert_eq!(echoed, normalized);

        for (condition, original) in echoed.iter().zip(&specs) {
            let spec = condition.to_spec().unwrap();
            assert_eq!(
                spec.point.keys().collect::<Vec<_>>(),
                original.point.keys().collect::<Vec<_>>()
            );
            assert_eq!(spec.normalize().unwrap().as_ref(), Some(condition));
        }
    }

    #[test]
    fn locator_from_point_rejects_unknown_shapes() {
        assert!(Locator::from_point(&[]).is_err());
        assert!(Locator::from_point(&["cookie".into(), "sid".into()]).is_err());
        assert!(Locator::from_point(&["header".into()]).is_err());
        assert_eq!(
            Locator::from_point(&["path".into(), PointElement::Number(2.0)]).unwrap(),
            Locator::Path(2)
        );
        assert_eq!(
            Locator::from_point(&["scheme".into()]).unwrap(),
            Locator::Scheme
        );
    }

    #[test]
    fn match_type_parses() {
        assert_eq!("iequal".parse::<MatchType>().unwrap(), MatchType::Iequal);
        assert!("like".parse::<MatchType>().is_err());
    }
}
