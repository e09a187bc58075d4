//! `SQLite` implementation of [`WebhookRepository`].
//!
//! Health counters and the active flag are updated with single
//! `UPDATE ... RETURNING` statements so that concurrent deliveries to the same
//! subscription never lose an increment, and a management edit never writes
//! back counters it read earlier.

use std::collections::BTreeSet;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use taskhook_app::ports::WebhookRepository;
use taskhook_domain::error::{NotFoundError, TaskhookError};
use taskhook_domain::event::EventName;
use taskhook_domain::id::WebhookId;
use taskhook_domain::time::Timestamp;
use taskhook_domain::webhook::{DeliveryLog, WebhookHealth, WebhookSubscription};

use crate::codec::{
    counter, decode_err, parse, parse_optional_timestamp, parse_timestamp, timestamp,
};
use crate::error::StorageError;

struct Wrapper(WebhookSubscription);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<WebhookSubscription> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let events_json: String = row.try_get("events")?;
        let failure_count: i64 = row.try_get("failure_count")?;
        let last_triggered_at: Option<String> = row.try_get("last_triggered_at")?;
        let created_at: String = row.try_get("created_at")?;

        let events: BTreeSet<EventName> =
            serde_json::from_str(&events_json).map_err(decode_err)?;

        Ok(Self(WebhookSubscription {
            id: parse(&id)?,
            url: row.try_get("url")?,
            secret: row.try_get("secret")?,
            events,
            is_active: row.try_get("is_active")?,
            failure_count: counter(failure_count)?,
            last_triggered_at: parse_optional_timestamp(last_triggered_at)?,
            created_at: parse_timestamp(&created_at)?,
        }))
    }
}

struct HealthWrapper(WebhookHealth);

impl<'r> FromRow<'r, SqliteRow> for HealthWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let failure_count: i64 = row.try_get("failure_count")?;
        Ok(Self(WebhookHealth {
            failure_count: counter(failure_count)?,
            is_active: row.try_get("is_active")?,
        }))
    }
}

struct DeliveryWrapper(DeliveryLog);

impl<'r> FromRow<'r, SqliteRow> for DeliveryWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let webhook_id: String = row.try_get("webhook_id")?;
        let event: String = row.try_get("event")?;
        let response_status: Option<i64> = row.try_get("response_status")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(DeliveryLog {
            id: parse(&id)?,
            webhook_id: parse(&webhook_id)?,
            event: parse(&event)?,
            payload: row.try_get("payload")?,
            response_status: response_status.map(counter).transpose()?,
            response_body: row.try_get("response_body")?,
            success: row.try_get("success")?,
            created_at: parse_timestamp(&created_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO webhooks
        (id, url, secret, events, is_active, failure_count, last_triggered_at, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM webhooks WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM webhooks ORDER BY created_at, id";
const SELECT_ACTIVE: &str = "SELECT * FROM webhooks WHERE is_active = 1 ORDER BY created_at, id";

const UPDATE: &str = r"
    UPDATE webhooks
    SET url = ?, secret = ?, events = ?
    WHERE id = ?
    RETURNING *
";

// SET expressions see the old row, so the reset only happens on a transition.
const REACTIVATE: &str = r"
    UPDATE webhooks
    SET failure_count = CASE WHEN is_active = 0 THEN 0 ELSE failure_count END,
        is_active = 1
    WHERE id = ?
    RETURNING *
";

const DEACTIVATE: &str = "UPDATE webhooks SET is_active = 0 WHERE id = ? RETURNING *";

const DELETE: &str = "DELETE FROM webhooks WHERE id = ?";

const RECORD_SUCCESS: &str = r"
    UPDATE webhooks
    SET failure_count = 0, last_triggered_at = ?
    WHERE id = ?
    RETURNING failure_count, is_active
";

const RECORD_FAILURE: &str = r"
    UPDATE webhooks
    SET failure_count = failure_count + 1,
        is_active = CASE WHEN failure_count + 1 >= ? THEN 0 ELSE is_active END
    WHERE id = ?
    RETURNING failure_count, is_active
";

const INSERT_DELIVERY: &str = r"
    INSERT INTO webhook_deliveries
        (id, webhook_id, event, payload, response_status, response_body, success, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_DELIVERIES: &str = r"
    SELECT * FROM webhook_deliveries
    WHERE webhook_id = ?
    ORDER BY created_at DESC, rowid DESC
    LIMIT ?
";

fn not_found(id: WebhookId) -> TaskhookError {
    NotFoundError {
        entity: "Webhook",
        id: id.to_string(),
    }
    .into()
}

/// `SQLite`-backed webhook repository.
#[derive(Clone)]
pub struct SqliteWebhookRepository {
    pool: SqlitePool,
}

impl SqliteWebhookRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<WebhookSubscription>, TaskhookError> {
        let rows: Vec<Wrapper> = sqlx::query_as(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

impl WebhookRepository for SqliteWebhookRepository {
    async fn create(
        &self,
        subscription: WebhookSubscription,
    ) -> Result<WebhookSubscription, TaskhookError> {
        let events = serde_json::to_string(&subscription.events).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(subscription.id.to_string())
            .bind(&subscription.url)
            .bind(&subscription.secret)
            .bind(&events)
            .bind(subscription.is_active)
            .bind(i64::from(subscription.failure_count))
            .bind(subscription.last_triggered_at.map(timestamp))
            .bind(timestamp(subscription.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(subscription)
    }

    async fn get_by_id(&self, id: WebhookId) -> Result<Option<WebhookSubscription>, TaskhookError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn list(&self) -> Result<Vec<WebhookSubscription>, TaskhookError> {
        self.fetch_all(SELECT_ALL).await
    }

    async fn update(
        &self,
        subscription: WebhookSubscription,
    ) -> Result<WebhookSubscription, TaskhookError> {
        let events = serde_json::to_string(&subscription.events).map_err(StorageError::from)?;

        let row: Option<Wrapper> = sqlx::query_as(UPDATE)
            .bind(&subscription.url)
            .bind(&subscription.secret)
            .bind(&events)
            .bind(subscription.id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Wrapper::maybe(row).ok_or_else(|| not_found(subscription.id))
    }

    async fn set_active(
        &self,
        id: WebhookId,
        active: bool,
    ) -> Result<WebhookSubscription, TaskhookError> {
        let sql = if active { REACTIVATE } else { DEACTIVATE };
        let row: Option<Wrapper> = sqlx::query_as(sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Wrapper::maybe(row).ok_or_else(|| not_found(id))
    }

    async fn delete(&self, id: WebhookId) -> Result<(), TaskhookError> {
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

    async fn find_active(&self) -> Result<Vec<WebhookSubscription>, TaskhookError> {
        self.fetch_all(SELECT_ACTIVE).await
    }

    async fn append_delivery(&self, delivery: DeliveryLog) -> Result<(), TaskhookError> {
        sqlx::query(INSERT_DELIVERY)
            .bind(delivery.id.to_string())
            .bind(delivery.webhook_id.to_string())
            .bind(delivery.event.as_str())
            .bind(&delivery.payload)
            .bind(delivery.response_status.map(i64::from))
            .bind(&delivery.response_body)
            .bind(delivery.success)
            .bind(timestamp(delivery.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn record_success(
        &self,
        id: WebhookId,
        at: Timestamp,
    ) -> Result<WebhookHealth, TaskhookError> {
        let row: Option<HealthWrapper> = sqlx::query_as(RECORD_SUCCESS)
            .bind(timestamp(at))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        row.map(|w| w.0).ok_or_else(|| not_found(id))
    }

    async fn record_failure(
        &self,
        id: WebhookId,
        threshold: u32,
    ) -> Result<WebhookHealth, TaskhookError> {
        let row: Option<HealthWrapper> = sqlx::query_as(RECORD_FAILURE)
            .bind(i64::from(threshold))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        row.map(|w| w.0).ok_or_else(|| not_found(id))
    }

    async fn list_deliveries(
        &self,
        webhook_id: WebhookId,
        limit: u32,
    ) -> Result<Vec<DeliveryLog>, TaskhookError> {
        let rows: Vec<DeliveryWrapper> = sqlx::query_as(SELECT_DELIVERIES)
            .bind(webhook_id.to_string())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
