//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use taskhook_app::ports::{
    AutomationRepository, EventPublisher, IntegrationRepository, TaskRepository,
    WebhookRepository,
};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the API under `/api` next to a `/health` check. Includes a
/// [`TraceLayer`] that logs each HTTP request/response at the `DEBUG` level
/// using the `tracing` ecosystem.
pub fn build<AR, WR, TR, IR, P>(state: AppState<AR, WR, TR, IR, P>) -> Router
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
