//! Snapshot — the flattened key/value view of the entity involved in an event.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::TaskId;

/// Flat map of entity attributes (`id`, `title`, `status`, `priority`, `ownerId`, …).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw value for `field`, treating JSON `null` as absent.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|value| !value.is_null())
    }

    /// String form of `field`.
    ///
    /// Strings are returned as-is, numbers and booleans through their display
    /// form, nested values as compact JSON.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// The `id` of the entity this snapshot describes, if any.
    #[must_use]
    pub fn entity_id(&self) -> Option<TaskId> {
        self.text("id")
            .filter(|id| !id.is_empty())
            .map(TaskId::from)
    }

    /// The `title` field, if present.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.text("title")
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// JSON object form, used as webhook `data`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
