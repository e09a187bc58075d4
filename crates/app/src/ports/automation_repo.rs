//! Automation repository port — persistence for rules and their run log.

use std::future::Future;
use std::sync::Arc;

use taskhook_domain::automation::{Automation, AutomationLog};
use taskhook_domain::error::TaskhookError;
use taskhook_domain::id::{AutomationId, UserId};

/// Repository for persisting and querying [`Automation`]s.
pub trait AutomationRepository {
    /// Create a new automation in storage.
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, TaskhookError>> + Send;

    /// Get an automation by its unique identifier.
    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, TaskhookError>> + Send;

    /// List automations, optionally restricted to one owner.
    fn list(
        &self,
        owner: Option<UserId>,
    ) -> impl Future<Output = Result<Vec<Automation>, TaskhookError>> + Send;

    /// Replace the definition of an existing automation.
    ///
    /// Counters (`trigger_count`, `last_triggered_at`) are left untouched.
    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, TaskhookError>> + Send;

    /// Delete an automation and its log.
    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), TaskhookError>> + Send;

    /// Active automations, restricted to `owner` when given.
    fn find_active(
        &self,
        owner: Option<UserId>,
    ) -> impl Future<Output = Result<Vec<Automation>, TaskhookError>> + Send;

    /// Append `log` and, when it records a success, bump the rule's
    /// `trigger_count` and `last_triggered_at` in the same transaction.
    fn record_outcome(
        &self,
        log: AutomationLog,
    ) -> impl Future<Output = Result<(), TaskhookError>> + Send;

    /// Most recent log rows for one automation, newest first.
    fn list_logs(
        &self,
        automation_id: AutomationId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<AutomationLog>, TaskhookError>> + Send;
}

impl<T: AutomationRepository + Send + Sync> AutomationRepository for Arc<T> {
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, TaskhookError>> + Send {
        (**self).create(automation)
    }

    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, TaskhookError>> + Send {
        (**self).get_by_id(id)
    }

    fn list(
        &self,
        owner: Option<UserId>,
    ) -> impl Future<Output = Result<Vec<Automation>, TaskhookError>> + Send {
        (**self).list(owner)
    }

    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, TaskhookError>> + Send {
        (**self).update(automation)
    }

    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), TaskhookError>> + Send {
        (**self).delete(id)
    }

    fn find_active(
        &self,
        owner: Option<UserId>,
    ) -> impl Future<Output = Result<Vec<Automation>, TaskhookError>> + Send {
        (**self).find_active(owner)
    }

    fn record_outcome(
        &self,
        log: AutomationLog,
    ) -> impl Future<Output = Result<(), TaskhookError>> + Send {
        (**self).record_outcome(log)
    }

    fn list_logs(
        &self,
        automation_id: AutomationId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<AutomationLog>, TaskhookError>> + Send {
        (**self).list_logs(automation_id, limit)
    }
}
