//! JSON REST handlers for webhook subscriptions.
//!
//! The signing secret is returned once, in the creation response. Every other
//! view carries a short hint instead.

use std::collections::BTreeSet;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use taskhook_app::ports::{
    AutomationRepository, EventPublisher, IntegrationRepository, TaskRepository,
    WebhookRepository,
};
use taskhook_app::services::webhook_service::WebhookUpdate;
use taskhook_domain::error::ValidationError;
use taskhook_domain::event::EventName;
use taskhook_domain::id::WebhookId;
use taskhook_domain::time::Timestamp;
use taskhook_domain::webhook::{DeliveryLog, WebhookSubscription};

use super::{LimitQuery, parse_id};
use crate::error::ApiError;
use crate::state::AppState;

/// Management view of a subscription.
#[derive(Debug, Serialize)]
pub struct WebhookView {
    pub id: WebhookId,
    pub url: String,
    pub secret_hint: String,
    pub events: BTreeSet<EventName>,
    pub is_active: bool,
    pub failure_count: u32,
    pub last_triggered_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<&WebhookSubscription> for WebhookView {
    fn from(sub: &WebhookSubscription) -> Self {
        Self {
            id: sub.id,
            url: sub.url.clone(),
            secret_hint: sub.secret_hint(),
            events: sub.events.clone(),
            is_active: sub.is_active,
            failure_count: sub.failure_count,
            last_triggered_at: sub.last_triggered_at,
            created_at: sub.created_at,
        }
    }
}

/// Creation response: the view plus the full secret.
#[derive(Debug, Serialize)]
pub struct CreatedWebhook {
    #[serde(flatten)]
    pub view: WebhookView,
    pub secret: String,
}

/// Request body for registering a subscription.
#[derive(Deserialize)]
pub struct CreateWebhookRequest {
    pub url: String,
    pub events: Vec<String>,
}

/// Request body for `PUT /api/webhooks/:id`. Absent fields stay unchanged.
#[derive(Deserialize)]
pub struct UpdateWebhookRequest {
    pub url: Option<String>,
    pub events: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<CreatedWebhook>),
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

fn parse_events(raw: &[String]) -> Result<Vec<EventName>, ValidationError> {
    raw.iter().map(|name| name.parse()).collect()
}

/// `GET /api/webhooks`
pub async fn list<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
) -> Result<Json<Vec<WebhookView>>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let webhooks = state.webhook_service.list_webhooks().await?;
    Ok(Json(webhooks.iter().map(WebhookView::from).collect()))
}

/// `GET /api/webhooks/:id`
pub async fn get<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(id): Path<String>,
) -> Result<Json<WebhookView>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let webhook_id: WebhookId = parse_id(&id)?;
    let webhook = state.webhook_service.get_webhook(webhook_id).await?;
    Ok(Json(WebhookView::from(&webhook)))
}

/// `POST /api/webhooks` — register a subscription and reveal its secret.
pub async fn create<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Json(req): Json<CreateWebhookRequest>,
) -> Result<CreateResponse, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let events = parse_events(&req.events)?;
    let webhook = state
        .webhook_service
        .create_webhook(req.url, events)
        .await?;
    Ok(CreateResponse::Created(Json(CreatedWebhook {
        view: WebhookView::from(&webhook),
        secret: webhook.secret,
    })))
}

/// `PUT /api/webhooks/:id` — edit a subscription. Re-enabling an inactive
/// one clears its failure counter.
pub async fn update<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateWebhookRequest>,
) -> Result<Json<WebhookView>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let webhook_id: WebhookId = parse_id(&id)?;
    let update = WebhookUpdate {
        url: req.url,
        events: req.events.as_deref().map(parse_events).transpose()?,
        is_active: req.is_active,
    };
    let webhook = state
        .webhook_service
        .update_webhook(webhook_id, update)
        .await?;
    Ok(Json(WebhookView::from(&webhook)))
}

/// `DELETE /api/webhooks/:id` — remove a subscription and its delivery log.
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
    let webhook_id: WebhookId = parse_id(&id)?;
    state.webhook_service.delete_webhook(webhook_id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `GET /api/webhooks/:id/deliveries?limit=` — newest attempts first.
pub async fn deliveries<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<DeliveryLog>>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let webhook_id: WebhookId = parse_id(&id)?;
    let deliveries = state
        .webhook_service
        .list_deliveries(webhook_id, query.resolve())
        .await?;
    Ok(Json(deliveries))
}
