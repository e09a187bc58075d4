//! Webhook repository port — subscriptions, delivery log and health counters.

use std::future::Future;
use std::sync::Arc;

use taskhook_domain::error::TaskhookError;
use taskhook_domain::id::WebhookId;
use taskhook_domain::time::Timestamp;
use taskhook_domain::webhook::{DeliveryLog, WebhookHealth, WebhookSubscription};

/// Repository for [`WebhookSubscription`]s.
pub trait WebhookRepository {
    fn create(
        &self,
        subscription: WebhookSubscription,
    ) -> impl Future<Output = Result<WebhookSubscription, TaskhookError>> + Send;

    fn get_by_id(
        &self,
        id: WebhookId,
    ) -> impl Future<Output = Result<Option<WebhookSubscription>, TaskhookError>> + Send;

    fn list(&self) -> impl Future<Output = Result<Vec<WebhookSubscription>, TaskhookError>> + Send;

    /// Persist url, secret and events. The active flag and health counters
    /// are left as stored; returns the subscription as it is now.
    fn update(
        &self,
        subscription: WebhookSubscription,
    ) -> impl Future<Output = Result<WebhookSubscription, TaskhookError>> + Send;

    /// Atomically enable or disable a subscription. Enabling an inactive one
    /// also clears its `failure_count`.
    fn set_active(
        &self,
        id: WebhookId,
        active: bool,
    ) -> impl Future<Output = Result<WebhookSubscription, TaskhookError>> + Send;

    fn delete(&self, id: WebhookId) -> impl Future<Output = Result<(), TaskhookError>> + Send;

    /// All subscriptions with `is_active = true`.
    fn find_active(
        &self,
    ) -> impl Future<Output = Result<Vec<WebhookSubscription>, TaskhookError>> + Send;

    fn append_delivery(
        &self,
        delivery: DeliveryLog,
    ) -> impl Future<Output = Result<(), TaskhookError>> + Send;

    /// Reset `failure_count` and set `last_triggered_at = at`.
    fn record_success(
        &self,
        id: WebhookId,
        at: Timestamp,
    ) -> impl Future<Output = Result<WebhookHealth, TaskhookError>> + Send;

    /// Atomically increment `failure_count` and deactivate the subscription
    /// once it reaches `threshold`. Returns the counters after the update.
    fn record_failure(
        &self,
        id: WebhookId,
        threshold: u32,
    ) -> impl Future<Output = Result<WebhookHealth, TaskhookError>> + Send;

    /// Most recent delivery attempts for one subscription, newest first.
    fn list_deliveries(
        &self,
        webhook_id: WebhookId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<DeliveryLog>, TaskhookError>> + Send;
}

impl<T: WebhookRepository + Send + Sync> WebhookRepository for Arc<T> {
    fn create(
        &self,
        subscription: WebhookSubscription,
    ) -> impl Future<Output = Result<WebhookSubscription, TaskhookError>> + Send {
        (**self).create(subscription)
    }

    fn get_by_id(
        &self,
        id: WebhookId,
    ) -> impl Future<Output = Result<Option<WebhookSubscription>, TaskhookError>> + Send {
        (**self).get_by_id(id)
    }

    fn list(&self) -> impl Future<Output = Result<Vec<WebhookSubscription>, TaskhookError>> + Send {
        (**self).list()
    }

    fn update(
        &self,
        subscription: WebhookSubscription,
    ) -> impl Future<Output = Result<WebhookSubscription, TaskhookError>> + Send {
        (**self).update(subscription)
    }

    fn set_active(
        &self,
        id: WebhookId,
        active: bool,
    ) -> impl Future<Output = Result<WebhookSubscription, TaskhookError>> + Send {
        (**self).set_active(id, active)
    }

    fn delete(&self, id: WebhookId) -> impl Future<Output = Result<(), TaskhookError>> + Send {
        (**self).delete(id)
    }

    fn find_active(
        &self,
    ) -> impl Future<Output = Result<Vec<WebhookSubscription>, TaskhookError>> + Send {
        (**self).find_active()
    }

    fn append_delivery(
        &self,
        delivery: DeliveryLog,
    ) -> impl Future<Output = Result<(), TaskhookError>> + Send {
        (**self).append_delivery(delivery)
    }

    fn record_success(
        &self,
        id: WebhookId,
        at: Timestamp,
    ) -> impl Future<Output = Result<WebhookHealth, TaskhookError>> + Send {
        (**self).record_success(id, at)
    }

    fn record_failure(
        &self,
        id: WebhookId,
        threshold: u32,
    ) -> impl Future<Output = Result<WebhookHealth, TaskhookError>> + Send {
        (**self).record_failure(id, threshold)
    }

    fn list_deliveries(
        &self,
        webhook_id: WebhookId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<DeliveryLog>, TaskhookError>> + Send {
        (**self).list_deliveries(webhook_id, limit)
    }
}
