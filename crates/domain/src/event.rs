//! Event — a named occurrence in the task lifecycle.
//!
//! The CRUD layer emits a [`DomainEvent`] after a mutation succeeds. Both the
//! automation engine and the webhook dispatcher consume the same event.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::UserId;
use crate::snapshot::Snapshot;

/// Lifecycle events automations and webhooks can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventName {
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskDeleted,
    SubtaskCreated,
    SubtaskCompleted,
    ListCreated,
    ListUpdated,
    ListDeleted,
}

impl EventName {
    /// Every known event, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::TaskCreated,
        Self::TaskUpdated,
        Self::TaskCompleted,
        Self::TaskDeleted,
        Self::SubtaskCreated,
        Self::SubtaskCompleted,
        Self::ListCreated,
        Self::ListUpdated,
        Self::ListDeleted,
    ];

    /// Wire name, e.g. `"task.created"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task.created",
            Self::TaskUpdated => "task.updated",
            Self::TaskCompleted => "task.completed",
            Self::TaskDeleted => "task.deleted",
            Self::SubtaskCreated => "subtask.created",
            Self::SubtaskCompleted => "subtask.completed",
            Self::ListCreated => "list.created",
            Self::ListUpdated => "list.updated",
            Self::ListDeleted => "list.deleted",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownEvent(s.to_string()))
    }
}

impl Serialize for EventName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The `(event name, entity snapshot, owner id)` tuple handed to the engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub name: EventName,
    pub snapshot: Snapshot,
    /// Owner whose automations may react. `None` evaluates every active rule.
    pub owner_id: Option<UserId>,
}

impl DomainEvent {
    #[must_use]
    pub fn new(name: EventName, snapshot: Snapshot, owner_id: Option<UserId>) -> Self {
        Self {
            name,
            snapshot,
            owner_id,
        }
    }
}
