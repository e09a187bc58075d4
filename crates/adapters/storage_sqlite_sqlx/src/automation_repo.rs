//! `SQLite` implementation of [`AutomationRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use taskhook_app::ports::AutomationRepository;
use taskhook_domain::automation::{Action, Automation, AutomationLog, Trigger};
use taskhook_domain::error::{NotFoundError, TaskhookError};
use taskhook_domain::id::{AutomationId, UserId};

use crate::codec::{
    counter, decode_err, parse, parse_optional_timestamp, parse_timestamp, timestamp,
};
use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Automation);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Automation> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let owner_id: String = row.try_get("owner_id")?;
        let trigger_json: String = row.try_get("trigger_data")?;
        let action_json: String = row.try_get("action_data")?;
        let last_triggered_at: Option<String> = row.try_get("last_triggered_at")?;
        let trigger_count: i64 = row.try_get("trigger_count")?;
        let created_at: String = row.try_get("created_at")?;

        let trigger: Trigger = serde_json::from_str(&trigger_json).map_err(decode_err)?;
        let action: Action = serde_json::from_str(&action_json).map_err(decode_err)?;

        Ok(Self(Automation {
            id: parse(&id)?,
            owner_id: UserId::new(owner_id),
            name: row.try_get("name")?,
            is_active: row.try_get("is_active")?,
            trigger,
            action,
            last_triggered_at: parse_optional_timestamp(last_triggered_at)?,
            trigger_count: counter(trigger_count)?,
            created_at: parse_timestamp(&created_at)?,
        }))
    }
}

struct LogWrapper(AutomationLog);

impl<'r> FromRow<'r, SqliteRow> for LogWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let automation_id: String = row.try_get("automation_id")?;
        let event: String = row.try_get("event")?;
        let data: String = row.try_get("data")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(AutomationLog {
            id: parse(&id)?,
            automation_id: parse(&automation_id)?,
            event: parse(&event)?,
            success: row.try_get("success")?,
            error: row.try_get("error")?,
            data: serde_json::from_str(&data).map_err(decode_err)?,
            created_at: parse_timestamp(&created_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO automations
        (id, owner_id, name, is_active, trigger_data, action_data,
         last_triggered_at, trigger_count, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM automations WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM automations ORDER BY created_at, id";
const SELECT_BY_OWNER: &str =
    "SELECT * FROM automations WHERE owner_id = ? ORDER BY created_at, id";
const SELECT_ACTIVE: &str =
    "SELECT * FROM automations WHERE is_active = 1 ORDER BY created_at, id";
const SELECT_ACTIVE_BY_OWNER: &str =
    "SELECT * FROM automations WHERE is_active = 1 AND owner_id = ? ORDER BY created_at, id";

const UPDATE: &str = r"
    UPDATE automations
    SET owner_id = ?, name = ?, is_active = ?, trigger_data = ?, action_data = ?
    WHERE id = ?
";

const DELETE: &str = "DELETE FROM automations WHERE id = ?";

const INSERT_LOG: &str = r"
    INSERT INTO automation_logs (id, automation_id, event, success, error, data, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const BUMP_COUNTERS: &str = r"
    UPDATE automations
    SET trigger_count = trigger_count + 1, last_triggered_at = ?
    WHERE id = ?
";

const SELECT_LOGS: &str = r"
    SELECT * FROM automation_logs
    WHERE automation_id = ?
    ORDER BY created_at DESC, rowid DESC
    LIMIT ?
";

fn not_found(id: AutomationId) -> TaskhookError {
    NotFoundError {
        entity: "Automation",
        id: id.to_string(),
    }
    .into()
}

/// `SQLite`-backed automation repository.
#[derive(Clone)]
pub struct SqliteAutomationRepository {
    pool: SqlitePool,
}

impl SqliteAutomationRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(
        &self,
        sql: &str,
        owner: Option<UserId>,
    ) -> Result<Vec<Automation>, TaskhookError> {
        let mut query = sqlx::query_as::<_, Wrapper>(sql);
        if let Some(owner) = owner {
            query = query.bind(owner.as_str().to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

impl AutomationRepository for SqliteAutomationRepository {
    async fn create(&self, automation: Automation) -> Result<Automation, TaskhookError> {
        let trigger_json =
            serde_json::to_string(&automation.trigger).map_err(StorageError::from)?;
        let action_json = serde_json::to_string(&automation.action).map_err(StorageError::from)?;
        let trigger_count = i64::try_from(automation.trigger_count).unwrap_or(i64::MAX);

        sqlx::query(INSERT)
            .bind(automation.id.to_string())
            .bind(automation.owner_id.as_str())
            .bind(&automation.name)
            .bind(automation.is_active)
            .bind(&trigger_json)
            .bind(&action_json)
            .bind(automation.last_triggered_at.map(timestamp))
            .bind(trigger_count)
            .bind(timestamp(automation.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(automation)
    }

    async fn get_by_id(&self, id: AutomationId) -> Result<Option<Automation>, TaskhookError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Automation>, TaskhookError> {
        let sql = if owner.is_some() {
            SELECT_BY_OWNER
        } else {
            SELECT_ALL
        };
        self.fetch(sql, owner).await
    }

    async fn update(&self, automation: Automation) -> Result<Automation, TaskhookError> {
        let trigger_json =
            serde_json::to_string(&automation.trigger).map_err(StorageError::from)?;
        let action_json = serde_json::to_string(&automation.action).map_err(StorageError::from)?;

        let result = sqlx::query(UPDATE)
            .bind(automation.owner_id.as_str())
            .bind(&automation.name)
            .bind(automation.is_active)
            .bind(&trigger_json)
            .bind(&action_json)
            .bind(automation.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        if result.rows_affected() == 0 {
            return Err(not_found(automation.id));
        }

        // Counters are owned by the engine; return what is stored.
        self.get_by_id(automation.id)
            .await?
            .ok_or_else(|| not_found(automation.id))
    }

    async fn delete(&self, id: AutomationId) -> Result<(), TaskhookError> {
        let result = sqlx::query(DELETE)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn find_active(&self, owner: Option<UserId>) -> Result<Vec<Automation>, TaskhookError> {
        let sql = if owner.is_some() {
            SELECT_ACTIVE_BY_OWNER
        } else {
            SELECT_ACTIVE
        };
        self.fetch(sql, owner).await
    }

    async fn record_outcome(&self, log: AutomationLog) -> Result<(), TaskhookError> {
        let data = serde_json::to_string(&log.data).map_err(StorageError::from)?;
        let created_at = timestamp(log.created_at);

        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        sqlx::query(INSERT_LOG)
            .bind(log.id.to_string())
            .bind(log.automation_id.to_string())
            .bind(log.event.as_str())
            .bind(log.success)
            .bind(&log.error)
            .bind(&data)
            .bind(&created_at)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        if log.success {
            sqlx::query(BUMP_COUNTERS)
                .bind(&created_at)
                .bind(log.automation_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn list_logs(
        &self,
        automation_id: AutomationId,
        limit: u32,
    ) -> Result<Vec<AutomationLog>, TaskhookError> {
        let rows: Vec<LogWrapper> = sqlx::query_as(SELECT_LOGS)
            .bind(automation_id.to_string())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
