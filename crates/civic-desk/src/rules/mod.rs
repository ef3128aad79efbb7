//! Visibility rules for service documents and questionnaire fields.
//!
//! A rule set is a conjunction of `(field, operator, value)` triples. It is stored as a flat JSON
//! object mapping each field to its value prefixed with an operator marker:
//!
//! | operator       | marker |
//! |----------------|--------|
//! | equals         | none   |
//! | not equals     | `!`    |
//! | greater than   | `>`    |
//! | less than      | `<`    |
//! | contains       | `*`    |
//!
//! Stored rule sets predate this crate, so the encoding must stay byte-compatible.

mod context;

pub use context::EvaluationContext;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Comparison applied between the context value and the rule value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
}

impl RuleOperator {
    /// Markers in the order decoding must try them.
    const DECODE_PRIORITY: [Self; 4] = [
        Self::GreaterThan,
        Self::LessThan,
        Self::NotEquals,
        Self::Contains,
    ];

    pub const fn marker(self) -> Option<char> {
        match self {
            Self::Equals => None,
            Self::NotEquals => Some('!'),
            Self::GreaterThan => Some('>'),
            Self::LessThan => Some('<'),
            Self::Contains => Some('*'),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "does not equal",
            Self::GreaterThan => "is greater than",
            Self::LessThan => "is less than",
            Self::Contains => "contains",
        }
    }

    /// Split an encoded value into its operator and operand, stripping at most one marker.
    pub fn decode(encoded: &str) -> (Self, &str) {
        for operator in Self::DECODE_PRIORITY {
            if let Some(marker) = operator.marker() {
                if let Some(rest) = encoded.strip_prefix(marker) {
                    return (operator, rest);
                }
            }
        }
        (Self::Equals, encoded)
    }

    pub fn encode(self, value: &str) -> String {
        match self.marker() {
            Some(marker) => format!("{marker}{value}"),
            None => value.to_string(),
        }
    }

    fn holds(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Equals => actual == expected,
            Self::NotEquals => actual != expected,
            Self::Contains => actual.contains(expected),
            Self::GreaterThan => compare(actual, expected).is_gt(),
            Self::LessThan => compare(actual, expected).is_lt(),
        }
    }
}

/// Numeric ordering when both sides are numbers, string ordering otherwise.
fn compare(actual: &str, expected: &str) -> std::cmp::Ordering {
    match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
        (Ok(left), Ok(right)) => left
            .partial_cmp(&right)
            .unwrap_or(std::cmp::Ordering::Equal),
        _ => actual.cmp(expected),
    }
}

/// One `(field, operator, value)` condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub field: String,
    pub operator: RuleOperator,
    pub value: String,
}

impl Rule {
    pub fn new(field: impl Into<String>, operator: RuleOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// A rule whose field is absent from the context is unmet rather than an error.
    pub fn is_met(&self, context: &EvaluationContext) -> bool {
        context
            .get(&self.field)
            .map(|actual| self.operator.holds(actual, &self.value))
            .unwrap_or(false)
    }

    pub fn describe(&self) -> String {
        format!("{} {} '{}'", self.field, self.operator.label(), self.value)
    }
}

/// Conjunction of rules; an empty set is always satisfied.
///
/// Holds at most one rule per field, matching the stored `field -> rule` shape. Adding a rule
/// for a field already present replaces the earlier rule in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleParseError {
    #[error("rule set is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rule set must be a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("rule for field '{field}' must be a string, number or boolean")]
    InvalidValue { field: String },
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut set = Self::default();
        for rule in rules {
            set.insert(rule);
        }
        set
    }

    /// Add `rule`, replacing any existing rule on the same field.
    pub fn insert(&mut self, rule: Rule) {
        match self.rules.iter_mut().find(|existing| existing.field == rule.field) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    pub fn rule_for(&self, field: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.field == field)
    }

    pub fn builder() -> LogicBuilder {
        LogicBuilder::default()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn evaluate(&self, context: &EvaluationContext) -> bool {
        self.rules.iter().all(|rule| rule.is_met(context))
    }

    /// Rules that fail against `context`, for explaining why something is hidden.
    pub fn unmet<'a>(&'a self, context: &'a EvaluationContext) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |rule| !rule.is_met(context))
    }

    /// Encode into the stored `field -> marker+value` map, keys in rule order.
    pub fn encode(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for rule in &self.rules {
            map.insert(
                rule.field.clone(),
                Value::String(rule.operator.encode(&rule.value)),
            );
        }
        map
    }

    /// Compact stored form, e.g. `{"gender":"MALE","age":">16"}`.
    pub fn to_json(&self) -> String {
        let entries: Vec<String> = self
            .rules
            .iter()
            .map(|rule| {
                format!(
                    "{}:{}",
                    Value::String(rule.field.clone()),
                    Value::String(rule.operator.encode(&rule.value))
                )
            })
            .collect();
        format!("{{{}}}", entries.join(","))
    }

    pub fn decode(map: &Map<String, Value>) -> Result<Self, RuleParseError> {
        let mut rules = Vec::with_capacity(map.len());
        for (field, value) in map {
            let encoded = match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                _ => {
                    return Err(RuleParseError::InvalidValue {
                        field: field.clone(),
                    })
                }
            };
            let (operator, operand) = RuleOperator::decode(&encoded);
            rules.push(Rule::new(field.clone(), operator, operand));
        }
        Ok(Self::new(rules))
    }

    /// Strict parse used when staff submit new rules.
    pub fn from_json(raw: &str) -> Result<Self, RuleParseError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(&value)
    }

    /// Strict parse of an already-decoded JSON value (object, encoded string or null).
    pub fn from_value(value: &Value) -> Result<Self, RuleParseError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => Self::decode(map),
            Value::String(text) if text.trim().is_empty() => Ok(Self::default()),
            Value::String(text) => Self::from_json(text),
            Value::Array(_) => Err(RuleParseError::NotAnObject("an array")),
            Value::Bool(_) => Err(RuleParseError::NotAnObject("a boolean")),
            Value::Number(_) => Err(RuleParseError::NotAnObject("a number")),
        }
    }

    /// Parse stored rules, treating anything malformed as "no rules" so a corrupt row
    /// never hides a document from staff.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::default(),
            Some(text) => Self::from_json(text).unwrap_or_else(|err| {
                warn!(error = %err, "ignoring malformed rule set");
                Self::default()
            }),
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rules.is_empty() {
            return write!(f, "always");
        }
        let parts: Vec<String> = self.rules.iter().map(Rule::describe).collect();
        write!(f, "{}", parts.join(" and "))
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for rule in &self.rules {
            map.serialize_entry(&rule.field, &rule.operator.encode(&rule.value))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Deserializer for persisted rule columns: accepts an object, a JSON-encoded string or null,
/// and falls back to an empty set on anything malformed.
pub fn lenient<'de, D>(deserializer: D) -> Result<RuleSet, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    Ok(RuleSet::from_value(&value).unwrap_or_else(|err| {
        warn!(error = %err, "ignoring malformed stored rule set");
        RuleSet::default()
    }))
}

/// Fluent construction of rule sets for catalog configuration. A second condition on the same
/// field replaces the first.
#[derive(Debug, Clone, Default)]
pub struct LogicBuilder {
    rules: RuleSet,
}

impl LogicBuilder {
    pub fn rule(
        mut self,
        field: impl Into<String>,
        operator: RuleOperator,
        value: impl Into<String>,
    ) -> Self {
        self.rules.insert(Rule::new(field, operator, value));
        self
    }

    pub fn equals(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.rule(field, RuleOperator::Equals, value)
    }

    pub fn not_equals(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.rule(field, RuleOperator::NotEquals, value)
    }

    pub fn greater_than(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.rule(field, RuleOperator::GreaterThan, value)
    }

    pub fn less_than(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.rule(field, RuleOperator::LessThan, value)
    }

    pub fn contains(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.rule(field, RuleOperator::Contains, value)
    }

    pub fn build(self) -> RuleSet {
        self.rules
    }
}
