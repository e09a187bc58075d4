//! Webhook service — use-cases for managing webhook subscriptions.

use taskhook_domain::error::{NotFoundError, TaskhookError};
use taskhook_domain::event::EventName;
use taskhook_domain::id::WebhookId;
use taskhook_domain::webhook::{DeliveryLog, WebhookSubscription};

use crate::ports::WebhookRepository;

/// Partial edit of a subscription. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct WebhookUpdate {
    pub url: Option<String>,
    pub events: Option<Vec<EventName>>,
    pub is_active: Option<bool>,
}

/// Application service for webhook subscription CRUD.
pub struct WebhookService<R> {
    repo: R,
}

impl<R: WebhookRepository> WebhookService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Register a subscription with a freshly generated secret.
    ///
    /// The returned value is the only one that carries the full secret
    /// to the caller; management views show a hint instead.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::Validation`] for a non-http(s) URL or an empty
    /// event list, or a storage error.
    #[tracing::instrument(skip(self, events))]
    pub async fn create_webhook(
        &self,
        url: String,
        events: Vec<EventName>,
    ) -> Result<WebhookSubscription, TaskhookError> {
        let subscription = WebhookSubscription::new(url, events)?;
        let created = self.repo.create(subscription).await?;
        tracing::info!(webhook_id = %created.id, "webhook registered");
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns [`TaskhookError::NotFound`] when no subscription with `id`
    /// exists, or a storage error.
    pub async fn get_webhook(&self, id: WebhookId) -> Result<WebhookSubscription, TaskhookError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Webhook",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_webhooks(&self) -> Result<Vec<WebhookSubscription>, TaskhookError> {
        self.repo.list().await
    }

    /// Apply `update`. Re-enabling an inactive subscription clears its
    /// failure counter so the breaker starts closed again.
    ///
    /// Health counters are never written from the copy read here: the
    /// active flag goes through [`WebhookRepository::set_active`], and only
    /// when the request actually flips it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::NotFound`], [`TaskhookError::Validation`] or a
    /// storage error.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_webhook(
        &self,
        id: WebhookId,
        update: WebhookUpdate,
    ) -> Result<WebhookSubscription, TaskhookError> {
        let mut subscription = self.get_webhook(id).await?;
        let was_active = subscription.is_active;
        let edits_definition = update.url.is_some() || update.events.is_some();
        if let Some(url) = update.url {
            subscription.url = url;
        }
        if let Some(events) = update.events {
            subscription.events = events.into_iter().collect();
        }
        subscription.validate()?;

        if edits_definition {
            subscription = self.repo.update(subscription).await?;
        }
        if let Some(active) = update.is_active.filter(|active| *active != was_active) {
            subscription = self.repo.set_active(id, active).await?;
            if active {
                tracing::info!(webhook_id = %id, "webhook re-enabled");
            } else {
                tracing::info!(webhook_id = %id, "webhook disabled");
            }
        }
        Ok(subscription)
    }

    /// # Errors
    ///
    /// Returns [`TaskhookError::NotFound`] or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_webhook(&self, id: WebhookId) -> Result<(), TaskhookError> {
        self.repo.delete(id).await
    }

    /// Most recent delivery attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::NotFound`] if the subscription does not
    /// exist, or a storage error.
    pub async fn list_deliveries(
        &self,
        id: WebhookId,
        limit: u32,
    ) -> Result<Vec<DeliveryLog>, TaskhookError> {
        self.get_webhook(id).await?;
        self.repo.list_deliveries(id, limit).await
    }
}
