//! Webhook payloads and delivery log rows.

use serde::{Deserialize, Serialize};

use crate::event::EventName;
use crate::id::{DeliveryId, PayloadId, WebhookId};
use crate::time::{Timestamp, now, to_iso8601};

/// Upper bound on response body characters kept for diagnostics.
pub const MAX_RESPONSE_BODY_CHARS: usize = 1000;

/// Canonical body of a webhook delivery, shared by every recipient of a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub id: PayloadId,
    pub event: EventName,
    /// ISO-8601 time the payload was built.
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl WebhookPayload {
    #[must_use]
    pub fn new(event: EventName, data: serde_json::Value) -> Self {
        Self {
            id: PayloadId::new(),
            event,
            timestamp: to_iso8601(now()),
            data,
        }
    }

    /// Serialize to the exact bytes that get signed and sent.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if `data` cannot be serialized.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// One delivery attempt to one subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLog {
    pub id: DeliveryId,
    pub webhook_id: WebhookId,
    pub event: EventName,
    /// The exact signed body.
    pub payload: String,
    /// `None` when the request never got a response.
    pub response_status: Option<u16>,
    pub response_body: Option<String>,
    pub success: bool,
    pub created_at: Timestamp,
}

impl DeliveryLog {
    #[must_use]
    pub fn new(
        webhook_id: WebhookId,
        event: EventName,
        payload: String,
        response_status: Option<u16>,
        response_body: Option<String>,
        success: bool,
    ) -> Self {
        Self {
            id: DeliveryId::new(),
            webhook_id,
            event,
            payload,
            response_status,
            response_body: response_body.map(|body| truncate(&body)),
            success,
            created_at: now(),
        }
    }
}

/// Keep at most [`MAX_RESPONSE_BODY_CHARS`] characters.
#[must_use]
pub fn truncate(body: &str) -> String {
    body.chars().take(MAX_RESPONSE_BODY_CHARS).collect()
}
