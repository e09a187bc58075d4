//! JSON REST handlers for the task surface.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use taskhook_app::ports::{
    AutomationRepository, EventPublisher, IntegrationRepository, TaskRepository,
    WebhookRepository,
};
use taskhook_app::services::task_service::NewTask;
use taskhook_domain::id::{ListId, TaskId, UserId};
use taskhook_domain::task::{Priority, Task, TaskChange, TaskStatus};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a task.
#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub id: Option<String>,
    pub owner_id: String,
    pub title: String,
    pub list_id: Option<String>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<String>,
}

/// Request body for `PATCH /api/tasks/:id`. Absent fields stay unchanged.
#[derive(Deserialize, Default)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub list_id: Option<String>,
    pub assignee_id: Option<String>,
}

impl UpdateTaskRequest {
    fn into_changes(self) -> Vec<TaskChange> {
        let mut changes = Vec::new();
        if let Some(title) = self.title {
            changes.push(TaskChange::Title(title));
        }
        if let Some(status) = self.status {
            changes.push(TaskChange::Status(status));
        }
        if let Some(priority) = self.priority {
            changes.push(TaskChange::Priority(priority));
        }
        if let Some(list_id) = self.list_id {
            changes.push(TaskChange::List(ListId::new(list_id)));
        }
        if let Some(assignee_id) = self.assignee_id {
            changes.push(TaskChange::Assignee(UserId::new(assignee_id)));
        }
        changes
    }
}

/// `POST /api/tasks` — create a task and emit `task.created`.
pub async fn create<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let task = state
        .task_service
        .create_task(NewTask {
            id: req.id.map(TaskId::new),
            owner_id: UserId::new(req.owner_id),
            title: req.title,
            list_id: req.list_id.map(ListId::new),
            priority: req.priority,
            assignee_id: req.assignee_id.map(UserId::new),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /api/tasks/:id`
pub async fn get<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let task = state.task_service.get_task(TaskId::new(id)).await?;
    Ok(Json(task))
}

/// `PATCH /api/tasks/:id` — apply changes and emit `task.updated`, or
/// `task.completed` when the status moves to `DONE`.
pub async fn update<AR, WR, TR, IR, P>(
    State(state): State<AppState<AR, WR, TR, IR, P>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let task = state
        .task_service
        .update_task(TaskId::new(id), req.into_changes())
        .await?;
    Ok(Json(task))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use taskhook_domain::event::EventName;

    use crate::testing::{app, send};

    #[tokio::test]
    async fn should_create_task_and_emit_created() {
        let (app, recorder) = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({"id": "t1", "owner_id": "u1", "title": "Ship", "priority": "URGENT"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "t1");
        assert_eq!(body["status"], "TODO");
        assert_eq!(body["priority"], "URGENT");
        let names: Vec<_> = recorder.taken().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec![EventName::TaskCreated]);
    }

    #[tokio::test]
    async fn should_emit_completed_when_patched_to_done() {
        let (app, recorder) = app();
        send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({"id": "t1", "owner_id": "u1", "title": "Ship"})),
        )
        .await;
        recorder.taken();

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/api/tasks/t1",
            Some(json!({"status": "DONE"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "DONE");
        let events = recorder.taken();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, EventName::TaskCompleted);
        assert_eq!(events[0].snapshot.text("status").as_deref(), Some("DONE"));
    }

    #[tokio::test]
    async fn should_reject_blank_title() {
        let (app, recorder) = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({"owner_id": "u1", "title": "  "})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "title must not be empty");
        assert!(recorder.taken().is_empty());
    }

    #[tokio::test]
    async fn should_return_404_for_missing_task() {
        let (app, _) = app();

        let (get_status, _) = send(&app, Method::GET, "/api/tasks/ghost", None).await;
        let (patch_status, _) = send(
            &app,
            Method::PATCH,
            "/api/tasks/ghost",
            Some(json!({"title": "x"})),
        )
        .await;

        assert_eq!(get_status, StatusCode::NOT_FOUND);
        assert_eq!(patch_status, StatusCode::NOT_FOUND);
    }
}
