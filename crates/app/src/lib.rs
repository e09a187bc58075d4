//! # taskhook-app
//!
//! Application layer — use-cases, engines and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AutomationRepository` — rules, run log and run counters
//!   - `WebhookRepository` — subscriptions, delivery log and health counters
//!   - `TaskRepository` — the task mutations automations perform
//!   - `IntegrationRepository` — per-user Slack settings
//!   - `HttpTransport` — outbound JSON POSTs
//!   - `EventPublisher` — hand-off of domain events after a mutation
//! - Run the **engines**:
//!   - `AutomationEngine` — evaluate triggers and conditions, execute actions
//!   - `WebhookDispatcher` — signed, concurrent fan-out with a circuit breaker
//!   - `EventRouter` — background worker feeding both engines from a bounded queue
//! - Provide **driving/inbound** use-case services for management surfaces
//!
//! ## Dependency rule
//! Depends on `taskhook-domain` only (plus `tokio` and `futures` for
//! concurrency). Never imports adapter crates.

pub mod action_executor;
pub mod automation_engine;
pub mod event_router;
pub mod ports;
pub mod services;
pub mod webhook_dispatcher;

#[cfg(test)]
mod testing;

/// Render an error and its sources as `outer: inner: root`.
#[must_use]
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
