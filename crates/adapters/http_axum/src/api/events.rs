//! Event intake — the entry point the surrounding product calls after a
//! mutation it performed itself.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use taskhook_app::ports::{
    AutomationRepository, EventPublisher, IntegrationRepository, TaskRepository,
    WebhookRepository,
};
use taskhook_domain::event::{DomainEvent, EventName};
use taskhook_domain::id::UserId;
use taskhook_domain::snapshot::Snapshot;

use crate::state::AppState;

/// Request body for `POST /api/events`.
#[derive(Deserialize)]
pub struct EmitEventRequest {
    pub event: String,
    #[serde(default)]
    pub snapshot: Snapshot,
    pub owner_id: Option<String>,
}

/// `POST /api/events` — queue an event for the automation engine and the
/// webhook dispatcher.
///
/// Always answers `202 Accepted`: processing happens in the background, and
/// an unknown event name is logged and dropped rather than reported.
pub async fn emit<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Json(req): Json<EmitEventRequest>,
) -> StatusCode
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    match req.event.parse::<EventName>() {
        Ok(name) => {
            let owner = req.owner_id.map(UserId::new);
            state
                .events
                .publish(DomainEvent::new(name, req.snapshot, owner));
        }
        Err(err) => {
            tracing::warn!(event = %req.event, error = %err, "ignoring unknown event");
        }
    }
    StatusCode::ACCEPTED
}
