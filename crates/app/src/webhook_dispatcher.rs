//! Webhook dispatcher — signed fan-out of events to subscribers.
//!
//! One canonical payload is built per event and signed per subscriber with
//! that subscriber's secret. Deliveries run concurrently, each under its own
//! deadline, and the dispatch settles only once every delivery has finished.
//! Each delivery writes its own log row and health update.

use std::time::Duration;

use futures::future::join_all;

use taskhook_domain::error::TaskhookError;
use taskhook_domain::event::EventName;
use taskhook_domain::id::WebhookId;
use taskhook_domain::time::now;
use taskhook_domain::webhook::{
    DELIVERY_HEADER, DELIVERY_TIMEOUT, DeliveryLog, EVENT_HEADER, FAILURE_THRESHOLD,
    SIGNATURE_HEADER, WebhookHealth, WebhookPayload, WebhookSubscription, signature,
};

use crate::error_chain;
use crate::ports::{HttpRequest, HttpTransport, TransportError, WebhookRepository};

/// Why a dispatch could not start.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to load webhook subscriptions")]
    Load(#[from] TaskhookError),

    #[error("failed to encode webhook payload")]
    Encode(#[from] serde_json::Error),
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub webhook_id: WebhookId,
    pub success: bool,
    pub status: Option<u16>,
    /// Counters after the update; `None` if the update itself failed.
    pub health: Option<WebhookHealth>,
}

/// Delivers events to every active, subscribed webhook.
pub struct WebhookDispatcher<WR, H> {
    webhooks: WR,
    transport: H,
    user_agent: String,
    timeout: Duration,
}

impl<WR, H> WebhookDispatcher<WR, H>
where
    WR: WebhookRepository + Send + Sync,
    H: HttpTransport + Send + Sync,
{
    pub fn new(webhooks: WR, transport: H) -> Self {
        Self {
            webhooks,
            transport,
            user_agent: concat!("taskhook-webhooks/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: DELIVERY_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the per-delivery deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Deliver `event` to its subscribers. Never fails: errors are logged.
    pub async fn dispatch(&self, event: EventName, data: serde_json::Value) {
        match self.try_dispatch(event, data).await {
            Ok(outcomes) if !outcomes.is_empty() => {
                let delivered = outcomes.iter().filter(|o| o.success).count();
                tracing::info!(
                    %event,
                    subscribers = outcomes.len(),
                    delivered,
                    "webhook dispatch settled"
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(%event, error = %error_chain(&err), "webhook dispatch failed");
            }
        }
    }

    /// Deliver `event` and report every attempt once all have settled.
    ///
    /// # Errors
    ///
    /// Returns an error only when subscriptions cannot be loaded or the
    /// payload cannot be encoded. Per-subscriber failures are reported in
    /// the outcomes.
    #[tracing::instrument(skip(self, data))]
    pub async fn try_dispatch(
        &self,
        event: EventName,
        data: serde_json::Value,
    ) -> Result<Vec<DeliveryOutcome>, DispatchError> {
        let subscribers: Vec<_> = self
            .webhooks
            .find_active()
            .await?
            .into_iter()
            .filter(|sub| sub.wants(event))
            .collect();
        if subscribers.is_empty() {
            return Ok(Vec::new());
        }

        let payload = WebhookPayload::new(event, data);
        let body = payload.to_bytes()?;
        let deliveries = subscribers
            .iter()
            .map(|sub| self.deliver(sub, &payload, &body));
        Ok(join_all(deliveries).await)
    }

    async fn deliver(
        &self,
        sub: &WebhookSubscription,
        payload: &WebhookPayload,
        body: &[u8],
    ) -> DeliveryOutcome {
        let request = HttpRequest::json(sub.url.clone(), body.to_vec(), self.timeout)
            .header("User-Agent", self.user_agent.clone())
            .header(SIGNATURE_HEADER, signature::sign(body, &sub.secret))
            .header(EVENT_HEADER, payload.event.as_str())
            .header(DELIVERY_HEADER, payload.id.to_string());

        let result = tokio::time::timeout(self.timeout, self.transport.post(request))
            .await
            .unwrap_or(Err(TransportError::Timeout(self.timeout)));

        let (status, response_body, success) = match result {
            Ok(response) => {
                let success = response.is_success();
                (Some(response.status), Some(response.body), success)
            }
            Err(err) => {
                tracing::warn!(
                    webhook_id = %sub.id,
                    url = %sub.url,
                    error = %err,
                    "webhook delivery failed"
                );
                (None, Some(err.to_string()), false)
            }
        };
        if let Some(code) = status.filter(|_| !success) {
            tracing::warn!(
                webhook_id = %sub.id,
                status = code,
                "webhook endpoint rejected delivery"
            );
        }

        let log = DeliveryLog::new(
            sub.id,
            payload.event,
            String::from_utf8_lossy(body).into_owned(),
            status,
            response_body,
            success,
        );
        if let Err(err) = self.webhooks.append_delivery(log).await {
            tracing::error!(
                webhook_id = %sub.id,
                error = %error_chain(&err),
                "failed to record delivery"
            );
        }

        let health = self.update_health(sub.id, success).await;
        DeliveryOutcome {
            webhook_id: sub.id,
            success,
            status,
            health,
        }
    }

    async fn update_health(&self, id: WebhookId, success: bool) -> Option<WebhookHealth> {
        let result = if success {
            self.webhooks.record_success(id, now()).await
        } else {
            self.webhooks.record_failure(id, FAILURE_THRESHOLD).await
        };
        match result {
            Ok(health) => {
                if health.just_tripped() {
                    tracing::warn!(
                        webhook_id = %id,
                        failures = health.failure_count,
                        "webhook disabled after consecutive failures"
                    );
                }
                Some(health)
            }
            Err(err) => {
                tracing::error!(
                    webhook_id = %id,
                    error = %error_chain(&err),
                    "failed to update webhook health"
                );
                None
            }
        }
    }
}
