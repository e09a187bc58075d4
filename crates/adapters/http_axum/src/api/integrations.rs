//! Per-user integration settings.

use axum::Json;
use axum::extract::{Path, State};

use taskhook_app::ports::{
    AutomationRepository, EventPublisher, IntegrationRepository, TaskRepository,
    WebhookRepository,
};
use taskhook_domain::id::UserId;
use taskhook_domain::integration::IntegrationSettings;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/users/:id/integrations`
pub async fn get<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(owner): Path<String>,
) -> Result<Json<IntegrationSettings>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let settings = state
        .integration_service
        .get_settings(UserId::new(owner))
        .await?;
    Ok(Json(settings))
}

/// `PUT /api/users/:id/integrations` — replace the user's settings.
pub async fn save<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(owner): Path<String>,
    Json(settings): Json<IntegrationSettings>,
) -> Result<Json<IntegrationSettings>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let saved = state
        .integration_service
        .save_settings(UserId::new(owner), settings)
        .await?;
    Ok(Json(saved))
}
