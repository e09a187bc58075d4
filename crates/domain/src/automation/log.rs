//! Automation log — one append-only row per rule execution attempt.

use serde::{Deserialize, Serialize};

use crate::event::EventName;
use crate::id::{AutomationId, AutomationLogId};
use crate::snapshot::Snapshot;
use crate::time::{Timestamp, now};

/// Outcome of running one rule's action for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationLog {
    pub id: AutomationLogId,
    pub automation_id: AutomationId,
    pub event: EventName,
    pub success: bool,
    pub error: Option<String>,
    /// Minimal view of the entity: `entityId`, `title`, `event`.
    pub data: serde_json::Value,
    pub created_at: Timestamp,
}

impl AutomationLog {
    /// Row for a successful execution.
    #[must_use]
    pub fn succeeded(automation_id: AutomationId, event: EventName, snapshot: &Snapshot) -> Self {
        Self::new(automation_id, event, snapshot, None)
    }

    /// Row for a failed execution, carrying the error message.
    #[must_use]
    pub fn failed(
        automation_id: AutomationId,
        event: EventName,
        snapshot: &Snapshot,
        error: impl Into<String>,
    ) -> Self {
        Self::new(automation_id, event, snapshot, Some(error.into()))
    }

    fn new(
        automation_id: AutomationId,
        event: EventName,
        snapshot: &Snapshot,
        error: Option<String>,
    ) -> Self {
        Self {
            id: AutomationLogId::new(),
            automation_id,
            event,
            success: error.is_none(),
            error,
            data: serde_json::json!({
                "entityId": snapshot.text("id"),
                "title": snapshot.title(),
                "event": event,
            }),
            created_at: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_record_entity_id_and_title() {
        let snapshot = Snapshot::new().with("id", "t1").with("title", "Ship release");
        let log = AutomationLog::succeeded(AutomationId::new(), EventName::TaskCreated, &snapshot);
        assert!(log.success);
        assert!(log.error.is_none());
        assert_eq!(log.data["entityId"], "t1");
        assert_eq!(log.data["title"], "Ship release");
        assert_eq!(log.data["event"], "task.created");
    }

    #[test]
    fn should_mark_failed_rows_with_error() {
        let log = AutomationLog::failed(
            AutomationId::new(),
            EventName::TaskUpdated,
            &Snapshot::new(),
            "Task t1 not found",
        );
        assert!(!log.success);
        assert_eq!(log.error.as_deref(), Some("Task t1 not found"));
        assert!(log.data["entityId"].is_null());
    }
}
