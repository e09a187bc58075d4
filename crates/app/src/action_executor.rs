//! Action executor — applies one automation action to the event's task.
//!
//! The executor is stateless: task mutations go through the [`TaskRepository`]
//! and Slack notifications through the [`HttpTransport`]. It never emits
//! events itself, so an automation cannot trigger another one.

use serde_json::json;

use taskhook_domain::automation::Action;
use taskhook_domain::error::TaskhookError;
use taskhook_domain::id::{TaskId, UserId};
use taskhook_domain::snapshot::Snapshot;
use taskhook_domain::task::TaskChange;
use taskhook_domain::webhook::DELIVERY_TIMEOUT;

use crate::ports::{
    HttpRequest, HttpTransport, IntegrationRepository, TaskRepository, TransportError,
};

/// Why an action could not be carried out.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("action {action} requires param {param}")]
    MissingParam { action: String, param: String },

    #[error("invalid {param}: {value}")]
    InvalidParam { param: &'static str, value: String },

    #[error("failed to update task {task}")]
    Target {
        task: TaskId,
        #[source]
        source: TaskhookError,
    },

    #[error("failed to load integration settings")]
    Settings(#[source] TaskhookError),

    #[error("slack notification failed")]
    Notification(#[source] TransportError),

    #[error("slack notification rejected with status {status}")]
    NotificationRejected { status: u16 },
}

/// Executes [`Action`]s against tasks and integrations.
pub struct ActionExecutor<T, I, H> {
    tasks: T,
    integrations: I,
    transport: H,
}

impl<T, I, H> ActionExecutor<T, I, H>
where
    T: TaskRepository + Send + Sync,
    I: IntegrationRepository + Send + Sync,
    H: HttpTransport + Send + Sync,
{
    pub fn new(tasks: T, integrations: I, transport: H) -> Self {
        Self {
            tasks,
            integrations,
            transport,
        }
    }

    /// Execute `action` for the entity described by `snapshot`.
    ///
    /// `owner` is the automation's owner, whose integration settings are used
    /// for notifications. A snapshot without an `id` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] when a parameter is missing or invalid, the
    /// task update fails, or the Slack endpoint does not accept the message.
    pub async fn execute(
        &self,
        action: &Action,
        snapshot: &Snapshot,
        owner: &UserId,
    ) -> Result<(), ActionError> {
        let Some(task_id) = snapshot.entity_id() else {
            tracing::debug!(action = %action, "snapshot has no id, nothing to act on");
            return Ok(());
        };

        match action {
            Action::ChangeStatus { status } => {
                let status = status.parse().map_err(|_| ActionError::InvalidParam {
                    param: "status",
                    value: status.clone(),
                })?;
                self.change(task_id, TaskChange::Status(status)).await
            }
            Action::ChangePriority { priority } => {
                let priority = priority.parse().map_err(|_| ActionError::InvalidParam {
                    param: "priority",
                    value: priority.clone(),
                })?;
                self.change(task_id, TaskChange::Priority(priority)).await
            }
            Action::MoveToProject { list_id } => {
                self.change(task_id, TaskChange::List(list_id.clone())).await
            }
            Action::AssignToUser { user_id } => {
                self.change(task_id, TaskChange::Assignee(user_id.clone()))
                    .await
            }
            Action::SendSlack { message } => {
                self.notify_slack(message.as_deref(), snapshot, owner).await
            }
            Action::Incomplete { kind, missing, .. } => Err(ActionError::MissingParam {
                action: kind.clone(),
                param: missing.clone(),
            }),
            Action::Unknown { kind, .. } => {
                tracing::warn!(action = %kind, "unknown action type, skipping");
                Ok(())
            }
        }
    }

    async fn change(&self, task: TaskId, change: TaskChange) -> Result<(), ActionError> {
        let field = change.field();
        match self.tasks.apply_change(task.clone(), change).await {
            Ok(_) => {
                tracing::debug!(task_id = %task, field, "task updated by automation");
                Ok(())
            }
            Err(source) => Err(ActionError::Target { task, source }),
        }
    }

    async fn notify_slack(
        &self,
        message: Option<&str>,
        snapshot: &Snapshot,
        owner: &UserId,
    ) -> Result<(), ActionError> {
        let settings = self
            .integrations
            .get_settings(owner.clone())
            .await
            .map_err(ActionError::Settings)?;
        let Some(url) = settings.slack_url() else {
            tracing::debug!(owner_id = %owner, "no slack webhook configured, skipping");
            return Ok(());
        };

        let body = slack_message(message, snapshot);
        let request = HttpRequest::json(url, body.to_string().into_bytes(), DELIVERY_TIMEOUT);
        let response = self
            .transport
            .post(request)
            .await
            .map_err(ActionError::Notification)?;
        if !response.is_success() {
            return Err(ActionError::NotificationRejected {
                status: response.status,
            });
        }
        Ok(())
    }
}

/// Slack incoming-webhook body for a task notification.
fn slack_message(message: Option<&str>, snapshot: &Snapshot) -> serde_json::Value {
    let text = message.map_or_else(
        || {
            format!(
                "Automation triggered for task \"{}\"",
                snapshot.title().unwrap_or_default()
            )
        },
        str::to_string,
    );
    let status = snapshot.text("status").unwrap_or_default();
    let priority = snapshot.text("priority").unwrap_or_default();
    json!({
        "text": text,
        "attachments": [{
            "fields": [
                { "title": "Status", "value": status, "short": true },
                { "title": "Priority", "value": priority, "short": true },
            ]
        }]
    })
}
