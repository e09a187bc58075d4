//! Automation — trigger → condition → action rules.
//!
//! Each automation belongs to one owner, reacts to one [`EventName`] through
//! its [`Trigger`], guards on the trigger's [`Condition`]s and performs a
//! single [`Action`]. Rules only ever act on their own owner's data.
//!
//! [`EventName`]: crate::event::EventName

mod action;
mod condition;
mod log;
mod trigger;

pub use action::Action;
pub use condition::{Condition, Operator, all_match};
pub use log::AutomationLog;
pub use trigger::Trigger;

use serde::{Deserialize, Serialize};

use crate::error::{TaskhookError, ValidationError};
use crate::event::EventName;
use crate::id::{AutomationId, UserId};
use crate::time::{Timestamp, now};

/// A user-defined rule that reacts to events by executing an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automation {
    pub id: AutomationId,
    pub owner_id: UserId,
    pub name: String,
    pub is_active: bool,
    pub trigger: Trigger,
    pub action: Action,
    /// Set on every successful execution.
    pub last_triggered_at: Option<Timestamp>,
    /// Incremented only on successful execution.
    pub trigger_count: u64,
    pub created_at: Timestamp,
}

impl Automation {
    /// Create a builder for constructing an [`Automation`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - the action lacks a required param ([`ValidationError::MissingParam`])
    pub fn validate(&self) -> Result<(), TaskhookError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if let Action::Incomplete { kind, missing, .. } = &self.action {
            return Err(ValidationError::MissingParam {
                action: kind.clone(),
                param: missing.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// `true` when this rule is active and listens for `event`.
    #[must_use]
    pub fn listens_to(&self, event: EventName) -> bool {
        self.is_active && self.trigger.fires_on(event)
    }
}

/// Step-by-step builder for [`Automation`].
#[derive(Debug, Default)]
pub struct AutomationBuilder {
    id: Option<AutomationId>,
    owner_id: Option<UserId>,
    name: Option<String>,
    is_active: Option<bool>,
    trigger: Option<Trigger>,
    action: Option<Action>,
    last_triggered_at: Option<Timestamp>,
    trigger_count: u64,
    created_at: Option<Timestamp>,
}

impl AutomationBuilder {
    #[must_use]
    pub fn id(mut self, id: AutomationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn owner(mut self, owner_id: impl Into<UserId>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn last_triggered_at(mut self, ts: Timestamp) -> Self {
        self.last_triggered_at = Some(ts);
        self
    }

    #[must_use]
    pub fn trigger_count(mut self, count: u64) -> Self {
        self.trigger_count = count;
        self
    }

    #[must_use]
    pub fn created_at(mut self, ts: Timestamp) -> Self {
        self.created_at = Some(ts);
        self
    }

    /// Consume the builder, validate, and return an [`Automation`].
    ///
    /// Defaults: active, triggered by `task.created`, action `send_slack`
    /// with the default message.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::Validation`] if required fields are missing or empty.
    pub fn build(self) -> Result<Automation, TaskhookError> {
        let automation = Automation {
            id: self.id.unwrap_or_default(),
            owner_id: self.owner_id.unwrap_or_else(|| UserId::new("")),
            name: self.name.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            trigger: self
                .trigger
                .unwrap_or_else(|| Trigger::on(EventName::TaskCreated)),
            action: self
                .action
                .unwrap_or(Action::SendSlack { message: None }),
            last_triggered_at: self.last_triggered_at,
            trigger_count: self.trigger_count,
            created_at: self.created_at.unwrap_or_else(now),
        };
        automation.validate()?;
        Ok(automation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn valid_automation() -> Automation {
        Automation::builder()
            .owner("u1")
            .name("Cancel urgent completions")
            .trigger(
                Trigger::on(EventName::TaskCompleted).when(Condition::new(
                    "priority",
                    Operator::Equals,
                    "URGENT",
                )),
            )
            .action(Action::ChangeStatus {
                status: "CANCELED".to_string(),
            })
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_valid_automation_when_required_fields_provided() {
        let auto = valid_automation();
        assert_eq!(auto.name, "Cancel urgent completions");
        assert_eq!(auto.owner_id, UserId::new("u1"));
        assert!(auto.is_active);
        assert_eq!(auto.trigger_count, 0);
        assert!(auto.last_triggered_at.is_none());
    }

    #[test]
    fn should_build_inactive_automation_when_active_is_false() {
        let auto = Automation::builder()
            .name("Paused rule")
            .active(false)
            .build()
            .unwrap();
        assert!(!auto.is_active);
        assert!(!auto.listens_to(EventName::TaskCreated));
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Automation::builder().build();
        assert!(matches!(
            result,
            Err(TaskhookError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_incomplete_action() {
        let result = Automation::builder()
            .name("Broken")
            .action(Action::Incomplete {
                kind: "change_status".to_string(),
                missing: "status".to_string(),
                params: BTreeMap::new(),
            })
            .build();
        assert!(matches!(
            result,
            Err(TaskhookError::Validation(ValidationError::MissingParam { .. }))
        ));
    }

    #[test]
    fn should_accept_unknown_action_type() {
        let result = Automation::builder()
            .name("From the future")
            .action(Action::Unknown {
                kind: "send_email".to_string(),
                params: BTreeMap::new(),
            })
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn should_listen_only_to_its_trigger_event() {
        let auto = valid_automation();
        assert!(auto.listens_to(EventName::TaskCompleted));
        assert!(!auto.listens_to(EventName::TaskUpdated));
    }

    #[test]
    fn should_roundtrip_automation_through_serde_json() {
        let auto = valid_automation();
        let json = serde_json::to_value(&auto).unwrap();
        assert_eq!(json["trigger"]["event"], "task.completed");
        assert_eq!(json["action"]["type"], "change_status");
        let parsed: Automation = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, auto);
    }
}
