//! Task — the entity automations act on.
//!
//! Tasks are owned by the surrounding product. This module only models what
//! automations read (through a [`Snapshot`]) and what they may change
//! (through a [`TaskChange`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TaskhookError, ValidationError};
use crate::id::{ListId, TaskId, UserId};
use crate::snapshot::Snapshot;
use crate::time::{Timestamp, now, to_iso8601};

/// Task priority, ordered from least to most pressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }

    /// Ordinal used by `gte`/`lte` conditions; unrecognized values rank 0.
    #[must_use]
    pub fn rank(raw: &str) -> u8 {
        match raw.parse::<Self>() {
            Ok(Self::Low) => 1,
            Ok(Self::Medium) => 2,
            Ok(Self::High) => 3,
            Ok(Self::Urgent) => 4,
            Err(_) => 0,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "URGENT" => Ok(Self::Urgent),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Canceled,
}

impl TaskStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DONE" => Ok(Self::Done),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// A single-field mutation applied to a task by an automation or the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    Status(TaskStatus),
    Priority(Priority),
    List(ListId),
    Assignee(UserId),
    Title(String),
}

impl TaskChange {
    /// Column-ish name of the changed field, for logs.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Priority(_) => "priority",
            Self::List(_) => "listId",
            Self::Assignee(_) => "assigneeId",
            Self::Title(_) => "title",
        }
    }
}

/// A task record as stored by the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: UserId,
    pub list_id: Option<ListId>,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee_id: Option<UserId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// Create a `TODO`/`MEDIUM` task with fresh timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] when `title` is blank.
    pub fn new(
        id: TaskId,
        owner_id: UserId,
        title: impl Into<String>,
    ) -> Result<Self, TaskhookError> {
        let ts = now();
        let task = Self {
            id,
            owner_id,
            list_id: None,
            title: title.into(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            assignee_id: None,
            created_at: ts,
            updated_at: ts,
        };
        task.validate()?;
        Ok(task)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] when `title` is blank.
    pub fn validate(&self) -> Result<(), TaskhookError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }
        Ok(())
    }

    /// Apply a change in memory and bump `updated_at`.
    pub fn apply(&mut self, change: TaskChange, at: Timestamp) {
        match change {
            TaskChange::Status(status) => self.status = status,
            TaskChange::Priority(priority) => self.priority = priority,
            TaskChange::List(list_id) => self.list_id = Some(list_id),
            TaskChange::Assignee(user_id) => self.assignee_id = Some(user_id),
            TaskChange::Title(title) => self.title = title,
        }
        self.updated_at = at;
    }

    /// Flatten into the snapshot shape events carry.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new()
            .with("id", self.id.as_str())
            .with("title", self.title.as_str())
            .with("status", self.status.as_str())
            .with("priority", self.priority.as_str())
            .with("ownerId", self.owner_id.as_str())
            .with("createdAt", to_iso8601(self.created_at))
            .with("updatedAt", to_iso8601(self.updated_at));
        if let Some(list_id) = &self.list_id {
            snapshot = snapshot.with("listId", list_id.as_str());
        }
        if let Some(assignee_id) = &self.assignee_id {
            snapshot = snapshot.with("assigneeId", assignee_id.as_str());
        }
        snapshot
    }
}
