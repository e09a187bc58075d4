//! Condition — a guard on the event snapshot that must hold for a rule to run.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::snapshot::Snapshot;
use crate::task::Priority;

/// Comparison applied between a snapshot field and a condition value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    /// Case-insensitive substring test.
    Contains,
    Gte,
    Lte,
    /// Anything else stored by an older client. Never matches.
    Unknown(String),
}

impl Operator {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "contains" => Self::Contains,
            "gte" => Self::Gte,
            "lte" => Self::Lte,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// A predicate over one snapshot field.
///
/// Conditions of a rule are combined with logical AND; see [`all_match`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Snapshot attribute to read, e.g. `priority`, `status`, `title`.
    pub field: String,
    pub operator: Operator,
    /// Expected value. Numbers and booleans are accepted and kept as text.
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
}

impl Condition {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Evaluate against a snapshot.
    ///
    /// A field that is absent (or `null`) never matches, whatever the operator.
    #[must_use]
    pub fn evaluate(&self, snapshot: &Snapshot) -> bool {
        let Some(actual) = snapshot.text(&self.field) else {
            return false;
        };

        match &self.operator {
            Operator::Equals => actual == self.value,
            Operator::NotEquals => actual != self.value,
            Operator::Contains => actual
                .to_lowercase()
                .contains(&self.value.to_lowercase()),
            Operator::Gte => self.compare(&actual).is_ge(),
            Operator::Lte => self.compare(&actual).is_le(),
            Operator::Unknown(_) => false,
        }
    }

    /// Priority fields compare by rank, everything else lexicographically.
    fn compare(&self, actual: &str) -> Ordering {
        if self.field == "priority" {
            Priority::rank(actual).cmp(&Priority::rank(&self.value))
        } else {
            actual.cmp(self.value.as_str())
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator.as_str(), self.value)
    }
}

/// `true` when every condition holds. An empty list always matches.
#[must_use]
pub fn all_match(conditions: &[Condition], snapshot: &Snapshot) -> bool {
    conditions
        .iter()
        .all(|condition| condition.evaluate(snapshot))
}

fn scalar_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "condition value must be a string, number or boolean, got {other}"
        ))),
    }
}
