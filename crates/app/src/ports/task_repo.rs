//! Task repository port — the entity mutations automations perform.

use std::future::Future;
use std::sync::Arc;

use taskhook_domain::error::TaskhookError;
use taskhook_domain::id::TaskId;
use taskhook_domain::task::{Task, TaskChange};

/// Repository for [`Task`]s.
pub trait TaskRepository {
    fn create(&self, task: Task) -> impl Future<Output = Result<Task, TaskhookError>> + Send;

    fn get_by_id(
        &self,
        id: TaskId,
    ) -> impl Future<Output = Result<Option<Task>, TaskhookError>> + Send;

    /// Apply a single-field change and return the updated task.
    ///
    /// Fails with [`TaskhookError::NotFound`] when the task no longer exists.
    fn apply_change(
        &self,
        id: TaskId,
        change: TaskChange,
    ) -> impl Future<Output = Result<Task, TaskhookError>> + Send;
}

impl<T: TaskRepository + Send + Sync> TaskRepository for Arc<T> {
    fn create(&self, task: Task) -> impl Future<Output = Result<Task, TaskhookError>> + Send {
        (**self).create(task)
    }

    fn get_by_id(
        &self,
        id: TaskId,
    ) -> impl Future<Output = Result<Option<Task>, TaskhookError>> + Send {
        (**self).get_by_id(id)
    }

    fn apply_change(
        &self,
        id: TaskId,
        change: TaskChange,
    ) -> impl Future<Output = Result<Task, TaskhookError>> + Send {
        (**self).apply_change(id, change)
    }
}
