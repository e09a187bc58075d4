//! JSON REST handlers for automations.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use taskhook_app::ports::{
    AutomationRepository, EventPublisher, IntegrationRepository, TaskRepository,
    WebhookRepository,
};
use taskhook_domain::automation::{Action, Automation, AutomationLog, Trigger};
use taskhook_domain::id::{AutomationId, UserId};

use super::{LimitQuery, parse_id};
use crate::error::ApiError;
use crate::state::AppState;

/// `?owner=` filter for the list endpoint.
#[derive(Deserialize)]
pub struct OwnerQuery {
    pub owner: Option<String>,
}

/// Request body for creating an automation.
#[derive(Deserialize)]
pub struct CreateAutomationRequest {
    pub owner_id: String,
    pub name: String,
    pub is_active: Option<bool>,
    pub trigger: Trigger,
    pub action: Action,
}

/// Request body for replacing an automation's definition.
#[derive(Deserialize)]
pub struct UpdateAutomationRequest {
    pub name: String,
    pub is_active: bool,
    pub trigger: Trigger,
    pub action: Action,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Automation>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<Automation>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Automation>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/automations?owner=` — list automations, optionally of one owner.
pub async fn list<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Query(query): Query<OwnerQuery>,
) -> Result<ListResponse, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let automations = state
        .automation_service
        .list_automations(query.owner.map(UserId::new))
        .await?;
    Ok(ListResponse::Ok(Json(automations)))
}

/// `GET /api/automations/:id` — get automation by ID.
pub async fn get<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let automation_id: AutomationId = parse_id(&id)?;
    let automation = state
        .automation_service
        .get_automation(automation_id)
        .await?;
    Ok(GetResponse::Ok(Json(automation)))
}

/// `POST /api/automations` — create a new automation.
pub async fn create<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Json(req): Json<CreateAutomationRequest>,
) -> Result<CreateResponse, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let mut builder = Automation::builder()
        .owner(req.owner_id)
        .name(req.name)
        .trigger(req.trigger)
        .action(req.action);

    if let Some(is_active) = req.is_active {
        builder = builder.active(is_active);
    }

    let automation = builder.build()?;
    let created = state
        .automation_service
        .create_automation(automation)
        .await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/automations/:id` — replace an automation's definition.
///
/// Owner, creation time and run counters are kept from the stored rule.
pub async fn update<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAutomationRequest>,
) -> Result<GetResponse, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let automation_id: AutomationId = parse_id(&id)?;
    let existing = state
        .automation_service
        .get_automation(automation_id)
        .await?;

    let mut builder = Automation::builder()
        .id(existing.id)
        .owner(existing.owner_id)
        .name(req.name)
        .active(req.is_active)
        .trigger(req.trigger)
        .action(req.action)
        .trigger_count(existing.trigger_count)
        .created_at(existing.created_at);
    if let Some(ts) = existing.last_triggered_at {
        builder = builder.last_triggered_at(ts);
    }

    let automation = builder.build()?;
    let updated = state
        .automation_service
        .update_automation(automation)
        .await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `DELETE /api/automations/:id` — delete an automation and its logs.
pub async fn delete<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let automation_id: AutomationId = parse_id(&id)?;
    state
        .automation_service
        .delete_automation(automation_id)
        .await?;
    Ok(DeleteResponse::NoContent)
}

/// `GET /api/automations/:id/logs?limit=` — most recent runs, newest first.
pub async fn logs<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<AutomationLog>>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let automation_id: AutomationId = parse_id(&id)?;
    let logs = state
        .automation_service
        .list_logs(automation_id, query.resolve())
        .await?;
    Ok(Json(logs))
}
