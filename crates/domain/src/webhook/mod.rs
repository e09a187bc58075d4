//! Webhook subscriptions — signed HTTP notifications to third parties.
//!
//! A subscription lists the events it wants, the URL to POST them to and
//! the secret used to sign each body. Its health counters are owned by the
//! dispatcher: ten consecutive failures switch it off until a human turns
//! it back on.

mod delivery;
pub mod secret;
pub mod signature;

pub use delivery::{DeliveryLog, MAX_RESPONSE_BODY_CHARS, WebhookPayload, truncate};

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use crate::error::{TaskhookError, ValidationError};
use crate::event::EventName;
use crate::id::WebhookId;
use crate::time::{Timestamp, now};

/// Consecutive failures after which a subscription is deactivated.
pub const FAILURE_THRESHOLD: u32 = 10;

/// Hard deadline for a single delivery.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the hex HMAC-SHA256 of the body.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Header carrying the event name.
pub const EVENT_HEADER: &str = "X-Webhook-Event";

/// Header carrying the payload id.
pub const DELIVERY_HEADER: &str = "X-Webhook-Id";

/// A registered delivery endpoint.
#[derive(Clone, PartialEq)]
pub struct WebhookSubscription {
    pub id: WebhookId,
    pub url: String,
    pub secret: String,
    pub events: BTreeSet<EventName>,
    pub is_active: bool,
    /// Consecutive failures; reset to 0 on any success.
    pub failure_count: u32,
    /// Set on successful delivery only.
    pub last_triggered_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl WebhookSubscription {
    /// Register a new active subscription with a freshly generated secret.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::Validation`] if the URL is not http(s) or
    /// `events` is empty.
    pub fn new(
        url: impl Into<String>,
        events: impl IntoIterator<Item = EventName>,
    ) -> Result<Self, TaskhookError> {
        let subscription = Self {
            id: WebhookId::new(),
            url: url.into(),
            secret: secret::generate(),
            events: events.into_iter().collect(),
            is_active: true,
            failure_count: 0,
            last_triggered_at: None,
            created_at: now(),
        };
        subscription.validate()?;
        Ok(subscription)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUrl`] or [`ValidationError::NoEvents`].
    pub fn validate(&self) -> Result<(), TaskhookError> {
        let rest = self
            .url
            .strip_prefix("https://")
            .or_else(|| self.url.strip_prefix("http://"));
        match rest {
            Some(host) if !host.is_empty() && !host.starts_with('/') => {}
            _ => return Err(ValidationError::InvalidUrl(self.url.clone()).into()),
        }
        if self.events.is_empty() {
            return Err(ValidationError::NoEvents.into());
        }
        Ok(())
    }

    /// `true` when active and subscribed to `event`.
    #[must_use]
    pub fn wants(&self, event: EventName) -> bool {
        self.is_active && self.events.contains(&event)
    }

    #[must_use]
    pub fn secret_hint(&self) -> String {
        secret::hint(&self.secret)
    }

    #[must_use]
    pub fn health(&self) -> WebhookHealth {
        WebhookHealth {
            failure_count: self.failure_count,
            is_active: self.is_active,
        }
    }
}

impl fmt::Debug for WebhookSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSubscription")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("secret", &self.secret_hint())
            .field("events", &self.events)
            .field("is_active", &self.is_active)
            .field("failure_count", &self.failure_count)
            .field("last_triggered_at", &self.last_triggered_at)
            .finish_non_exhaustive()
    }
}

/// Health counters of a subscription after a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookHealth {
    pub failure_count: u32,
    pub is_active: bool,
}

impl WebhookHealth {
    /// State after a successful delivery.
    #[must_use]
    pub fn after_success(self) -> Self {
        Self {
            failure_count: 0,
            is_active: self.is_active,
        }
    }

    /// State after a failed delivery; trips at [`FAILURE_THRESHOLD`].
    #[must_use]
    pub fn after_failure(self) -> Self {
        let failure_count = self.failure_count.saturating_add(1);
        Self {
            failure_count,
            is_active: self.is_active && failure_count < FAILURE_THRESHOLD,
        }
    }

    /// `true` when this state is the one that tripped the breaker.
    #[must_use]
    pub fn just_tripped(self) -> bool {
        !self.is_active && self.failure_count == FAILURE_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_active_subscription_with_prefixed_secret() {
        let sub = WebhookSubscription::new("https://example.com/hook", [EventName::TaskCreated])
            .unwrap();
        assert!(sub.is_active);
        assert_eq!(sub.failure_count, 0);
        assert!(sub.secret.starts_with(secret::SECRET_PREFIX));
        assert!(sub.wants(EventName::TaskCreated));
        assert!(!sub.wants(EventName::TaskDeleted));
    }

    #[test]
    fn should_reject_non_http_url() {
        for url in ["ftp://example.com", "example.com", "https://", "http:///path"] {
            let result = WebhookSubscription::new(url, [EventName::TaskCreated]);
            assert!(
                matches!(
                    result,
                    Err(TaskhookError::Validation(ValidationError::InvalidUrl(_)))
                ),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn should_reject_empty_event_set() {
        let result = WebhookSubscription::new("https://example.com", []);
        assert!(matches!(
            result,
            Err(TaskhookError::Validation(ValidationError::NoEvents))
        ));
    }

    #[test]
    fn should_not_want_events_when_inactive() {
        let mut sub =
            WebhookSubscription::new("https://example.com", [EventName::TaskCreated]).unwrap();
        sub.is_active = false;
        assert!(!sub.wants(EventName::TaskCreated));
    }

    #[test]
    fn should_redact_secret_in_debug_output() {
        let sub =
            WebhookSubscription::new("https://example.com", [EventName::TaskCreated]).unwrap();
        let debug = format!("{sub:?}");
        assert!(!debug.contains(&sub.secret));
        assert!(debug.contains(&sub.secret_hint()));
    }

    #[test]
    fn should_trip_breaker_on_tenth_consecutive_failure() {
        let health = WebhookHealth {
            failure_count: 9,
            is_active: true,
        }
        .after_failure();
        assert_eq!(health.failure_count, 10);
        assert!(!health.is_active);
        assert!(health.just_tripped());
    }

    #[test]
    fn should_reset_failures_on_success_without_touching_active_flag() {
        let health = WebhookHealth {
            failure_count: 9,
            is_active: true,
        }
        .after_success();
        assert_eq!(health.failure_count, 0);
        assert!(health.is_active);
    }

    #[test]
    fn should_stay_active_below_threshold() {
        let health = WebhookHealth {
            failure_count: 3,
            is_active: true,
        }
        .after_failure();
        assert_eq!(health.failure_count, 4);
        assert!(health.is_active);
        assert!(!health.just_tripped());
    }
}
