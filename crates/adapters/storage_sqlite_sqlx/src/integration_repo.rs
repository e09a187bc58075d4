//! `SQLite` implementation of [`IntegrationRepository`].

use sqlx::SqlitePool;

use taskhook_app::ports::IntegrationRepository;
use taskhook_domain::error::TaskhookError;
use taskhook_domain::id::UserId;
use taskhook_domain::integration::IntegrationSettings;
use taskhook_domain::time::now;

use crate::codec::timestamp;
use crate::error::StorageError;

const SELECT: &str = "SELECT slack_webhook_url FROM integration_settings WHERE owner_id = ?";

const UPSERT: &str = r"
    INSERT INTO integration_settings (owner_id, slack_webhook_url, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT (owner_id) DO UPDATE SET
        slack_webhook_url = excluded.slack_webhook_url,
        updated_at = excluded.updated_at
";

/// `SQLite`-backed per-user integration settings.
#[derive(Clone)]
pub struct SqliteIntegrationRepository {
    pool: SqlitePool,
}

impl SqliteIntegrationRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl IntegrationRepository for SqliteIntegrationRepository {
    async fn get_settings(&self, owner: UserId) -> Result<IntegrationSettings, TaskhookError> {
        let row: Option<(Option<String>,)> = sqlx::query_as(SELECT)
            .bind(owner.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row
            .map(|(slack_webhook_url,)| IntegrationSettings { slack_webhook_url })
            .unwrap_or_default())
    }

    async fn save_settings(
        &self,
        owner: UserId,
        settings: IntegrationSettings,
    ) -> Result<IntegrationSettings, TaskhookError> {
        sqlx::query(UPSERT)
            .bind(owner.as_str())
            .bind(&settings.slack_webhook_url)
            .bind(timestamp(now()))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(settings)
    }
}
