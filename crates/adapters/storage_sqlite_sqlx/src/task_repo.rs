//! `SQLite` implementation of [`TaskRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use taskhook_app::ports::TaskRepository;
use taskhook_domain::error::{NotFoundError, TaskhookError};
use taskhook_domain::id::{ListId, TaskId, UserId};
use taskhook_domain::task::{Task, TaskChange};
use taskhook_domain::time::now;

use crate::codec::{parse, parse_timestamp, timestamp};
use crate::error::StorageError;

struct Wrapper(Task);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Task> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let owner_id: String = row.try_get("owner_id")?;
        let list_id: Option<String> = row.try_get("list_id")?;
        let status: String = row.try_get("status")?;
        let priority: String = row.try_get("priority")?;
        let assignee_id: Option<String> = row.try_get("assignee_id")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(Self(Task {
            id: TaskId::new(id),
            owner_id: UserId::new(owner_id),
            list_id: list_id.map(ListId::new),
            title: row.try_get("title")?,
            status: parse(&status)?,
            priority: parse(&priority)?,
            assignee_id: assignee_id.map(UserId::new),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO tasks
        (id, owner_id, list_id, title, status, priority, assignee_id, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM tasks WHERE id = ?";

/// Column and new value for a single-field change.
fn column(change: &TaskChange) -> (&'static str, String) {
    match change {
        TaskChange::Status(status) => ("status", status.as_str().to_string()),
        TaskChange::Priority(priority) => ("priority", priority.as_str().to_string()),
        TaskChange::List(list_id) => ("list_id", list_id.as_str().to_string()),
        TaskChange::Assignee(user_id) => ("assignee_id", user_id.as_str().to_string()),
        TaskChange::Title(title) => ("title", title.clone()),
    }
}

/// `SQLite`-backed task store.
#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, task: Task) -> Result<Task, TaskhookError> {
        sqlx::query(INSERT)
            .bind(task.id.as_str())
            .bind(task.owner_id.as_str())
            .bind(task.list_id.as_ref().map(ListId::as_str))
            .bind(&task.title)
            .bind(task.status.as_str())
            .bind(task.priority.as_str())
            .bind(task.assignee_id.as_ref().map(UserId::as_str))
            .bind(timestamp(task.created_at))
            .bind(timestamp(task.updated_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(task)
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Option<Task>, TaskhookError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    #[tracing::instrument(skip(self, change), fields(field = change.field()))]
    async fn apply_change(&self, id: TaskId, change: TaskChange) -> Result<Task, TaskhookError> {
        let (column, value) = column(&change);
        let sql = format!("UPDATE tasks SET {column} = ?, updated_at = ? WHERE id = ? RETURNING *");

        let row: Option<Wrapper> = sqlx::query_as(&sql)
            .bind(value)
            .bind(timestamp(now()))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        row.map(|w| w.0).ok_or_else(|| {
            NotFoundError {
                entity: "Task",
                id: id.to_string(),
            }
            .into()
        })
    }
}
