//! Task service — the thin task surface that emits lifecycle events.
//!
//! Every successful mutation publishes a [`DomainEvent`] carrying the task's
//! snapshot and owner. Publishing is fire-and-forget: the caller gets its
//! answer regardless of what the background engines do with the event.

use taskhook_domain::error::{NotFoundError, TaskhookError, ValidationError};
use taskhook_domain::event::{DomainEvent, EventName};
use taskhook_domain::id::{ListId, TaskId, UserId};
use taskhook_domain::task::{Priority, Task, TaskChange, TaskStatus};

use crate::ports::{EventPublisher, TaskRepository};

/// Input for [`TaskService::create_task`].
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Generated when absent.
    pub id: Option<TaskId>,
    pub owner_id: UserId,
    pub title: String,
    pub list_id: Option<ListId>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<UserId>,
}

/// Application service for tasks.
pub struct TaskService<R, P> {
    repo: R,
    publisher: P,
}

impl<R: TaskRepository, P: EventPublisher> TaskService<R, P> {
    pub fn new(repo: R, publisher: P) -> Self {
        Self { repo, publisher }
    }

    /// Create a task and emit `task.created`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::Validation`] for a blank title, or a storage error.
    #[tracing::instrument(skip(self, input), fields(owner_id = %input.owner_id))]
    pub async fn create_task(&self, input: NewTask) -> Result<Task, TaskhookError> {
        let id = input
            .id
            .unwrap_or_else(|| TaskId::new(uuid::Uuid::new_v4().to_string()));
        let mut task = Task::new(id, input.owner_id, input.title)?;
        task.list_id = input.list_id;
        task.assignee_id = input.assignee_id;
        if let Some(priority) = input.priority {
            task.priority = priority;
        }

        let task = self.repo.create(task).await?;
        self.emit(EventName::TaskCreated, &task);
        Ok(task)
    }

    /// # Errors
    ///
    /// Returns [`TaskhookError::NotFound`] when no task with `id` exists, or
    /// a storage error.
    pub async fn get_task(&self, id: TaskId) -> Result<Task, TaskhookError> {
        self.repo.get_by_id(id.clone()).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Task",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Apply `changes` in order and emit one event.
    ///
    /// Moving the status to `DONE` emits `task.completed`; any other change
    /// emits `task.updated`. An empty change list emits nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::NotFound`], [`TaskhookError::Validation`] for
    /// a blank title, or a storage error.
    #[tracing::instrument(skip(self, changes), fields(changes = changes.len()))]
    pub async fn update_task(
        &self,
        id: TaskId,
        changes: Vec<TaskChange>,
    ) -> Result<Task, TaskhookError> {
        let mut task = self.get_task(id.clone()).await?;
        if changes.is_empty() {
            return Ok(task);
        }
        if changes
            .iter()
            .any(|change| matches!(change, TaskChange::Title(title) if title.trim().is_empty()))
        {
            return Err(ValidationError::EmptyTitle.into());
        }

        let was_done = task.status == TaskStatus::Done;
        for change in changes {
            task = self.repo.apply_change(id.clone(), change).await?;
        }

        let event = if !was_done && task.status == TaskStatus::Done {
            EventName::TaskCompleted
        } else {
            EventName::TaskUpdated
        };
        self.emit(event, &task);
        Ok(task)
    }

    fn emit(&self, name: EventName, task: &Task) {
        tracing::debug!(event = %name, task_id = %task.id, "emitting task event");
        self.publisher.publish(DomainEvent::new(
            name,
            task.snapshot(),
            Some(task.owner_id.clone()),
        ));
    }
}
