//! Trigger — the event pattern that activates an automation.

use serde::{Deserialize, Serialize};

use super::condition::{Condition, all_match};
use crate::event::EventName;
use crate::snapshot::Snapshot;

/// Which event activates a rule, and which conditions the snapshot must meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub event: EventName,
    /// Empty or absent means "always match".
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Trigger {
    /// Trigger on `event` with no conditions.
    #[must_use]
    pub fn on(event: EventName) -> Self {
        Self {
            event,
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn fires_on(&self, event: EventName) -> bool {
        self.event == event
    }

    /// Logical AND over all conditions.
    #[must_use]
    pub fn conditions_hold(&self, snapshot: &Snapshot) -> bool {
        all_match(&self.conditions, snapshot)
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event)?;
        if !self.conditions.is_empty() {
            write!(f, " if {} condition(s)", self.conditions.len())?;
        }
        Ok(())
    }
}
