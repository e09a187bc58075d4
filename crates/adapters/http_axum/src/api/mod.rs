//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod automations;
#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod integrations;
#[allow(clippy::missing_errors_doc)]
pub mod tasks;
#[allow(clippy::missing_errors_doc)]
pub mod webhooks;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, post};
use serde::Deserialize;

use taskhook_app::ports::{
    AutomationRepository, EventPublisher, IntegrationRepository, TaskRepository,
    WebhookRepository,
};
use taskhook_domain::error::ValidationError;

use crate::error::ApiError;
use crate::state::AppState;

/// Default number of log rows returned by the log views.
pub const DEFAULT_LOG_LIMIT: u32 = 50;
/// Upper bound accepted for `?limit=`.
pub const MAX_LOG_LIMIT: u32 = 500;

/// `?limit=` for the automation and delivery log views.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

impl LimitQuery {
    #[must_use]
    pub fn resolve(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_LOG_LIMIT)
            .clamp(1, MAX_LOG_LIMIT)
    }
}

/// Parse a path identifier, reporting a bad one as a validation error.
pub(crate) fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::from(ValidationError::InvalidId(raw.to_string())))
}

/// Build the `/api` sub-router.
pub fn routes<AR, WR, TR, IR, P>() -> Router<AppState<AR, WR, TR, IR, P>>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Event intake
        .route("/events", post(events::emit::<AR, WR, TR, IR, P>))
        // Tasks
        .route("/tasks", post(tasks::create::<AR, WR, TR, IR, P>))
        .route(
            "/tasks/{id}",
            get(tasks::get::<AR, WR, TR, IR, P>).patch(tasks::update::<AR, WR, TR, IR, P>),
        )
        // Automations
        .route(
            "/automations",
            get(automations::list::<AR, WR, TR, IR, P>)
                .post(automations::create::<AR, WR, TR, IR, P>),
        )
        .route(
            "/automations/{id}",
            get(automations::get::<AR, WR, TR, IR, P>)
                .put(automations::update::<AR, WR, TR, IR, P>)
                .delete(automations::delete::<AR, WR, TR, IR, P>),
        )
        .route(
            "/automations/{id}/logs",
            get(automations::logs::<AR, WR, TR, IR, P>),
        )
        // Webhooks
        .route(
            "/webhooks",
            get(webhooks::list::<AR, WR, TR, IR, P>).post(webhooks::create::<AR, WR, TR, IR, P>),
        )
        .route(
            "/webhooks/{id}",
            get(webhooks::get::<AR, WR, TR, IR, P>)
                .put(webhooks::update::<AR, WR, TR, IR, P>)
                .delete(webhooks::delete::<AR, WR, TR, IR, P>),
        )
        .route(
            "/webhooks/{id}/deliveries",
            get(webhooks::deliveries::<AR, WR, TR, IR, P>),
        )
        // Integrations
        .route(
            "/users/{id}/integrations",
            get(integrations::get::<AR, WR, TR, IR, P>)
                .put(integrations::save::<AR, WR, TR, IR, P>),
        )
}
