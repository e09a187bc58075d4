//! In-memory ports and request helpers for route tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use taskhook_app::ports::{
    AutomationRepository, EventPublisher, IntegrationRepository, TaskRepository,
    WebhookRepository,
};
use taskhook_app::services::automation_service::AutomationService;
use taskhook_app::services::integration_service::IntegrationService;
use taskhook_app::services::task_service::TaskService;
use taskhook_app::services::webhook_service::WebhookService;
use taskhook_domain::automation::{Automation, AutomationLog};
use taskhook_domain::error::{NotFoundError, TaskhookError};
use taskhook_domain::event::DomainEvent;
use taskhook_domain::id::{AutomationId, TaskId, UserId, WebhookId};
use taskhook_domain::integration::IntegrationSettings;
use taskhook_domain::task::{Task, TaskChange};
use taskhook_domain::time::{Timestamp, now};
use taskhook_domain::webhook::{DeliveryLog, WebhookHealth, WebhookSubscription};

use crate::state::AppState;

fn missing(entity: &'static str, id: impl ToString) -> TaskhookError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}

#[derive(Default)]
pub struct Automations {
    store: Mutex<Vec<Automation>>,
    logs: Mutex<Vec<AutomationLog>>,
}

impl AutomationRepository for Automations {
    async fn create(&self, automation: Automation) -> Result<Automation, TaskhookError> {
        self.store.lock().unwrap().push(automation.clone());
        Ok(automation)
    }

    async fn get_by_id(&self, id: AutomationId) -> Result<Option<Automation>, TaskhookError> {
        Ok(self.store.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Automation>, TaskhookError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .iter()
            .filter(|a| owner.as_ref().is_none_or(|o| &a.owner_id == o))
            .cloned()
            .collect())
    }

    async fn update(&self, mut automation: Automation) -> Result<Automation, TaskhookError> {
        let mut store = self.store.lock().unwrap();
        let slot = store
            .iter_mut()
            .find(|a| a.id == automation.id)
            .ok_or_else(|| missing("Automation", automation.id))?;
        automation.trigger_count = slot.trigger_count;
        automation.last_triggered_at = slot.last_triggered_at;
        *slot = automation.clone();
        Ok(automation)
    }

    async fn delete(&self, id: AutomationId) -> Result<(), TaskhookError> {
        let mut store = self.store.lock().unwrap();
        let before = store.len();
        store.retain(|a| a.id != id);
        if store.len() == before {
            return Err(missing("Automation", id));
        }
        Ok(())
    }

    async fn find_active(&self, owner: Option<UserId>) -> Result<Vec<Automation>, TaskhookError> {
        let all = self.list(owner).await?;
        Ok(all.into_iter().filter(|a| a.is_active).collect())
    }

    async fn record_outcome(&self, log: AutomationLog) -> Result<(), TaskhookError> {
        if log.success {
            if let Some(a) = self
                .store
                .lock()
                .unwrap()
                .iter_mut()
                .find(|a| a.id == log.automation_id)
            {
                a.trigger_count += 1;
                a.last_triggered_at = Some(log.created_at);
            }
        }
        self.logs.lock().unwrap().push(log);
        Ok(())
    }

    async fn list_logs(
        &self,
        automation_id: AutomationId,
        limit: u32,
    ) -> Result<Vec<AutomationLog>, TaskhookError> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|l| l.automation_id == automation_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct Webhooks {
    store: Mutex<Vec<WebhookSubscription>>,
    deliveries: Mutex<Vec<DeliveryLog>>,
}

impl Webhooks {
    fn health(
        &self,
        id: WebhookId,
        change: impl FnOnce(&mut WebhookSubscription),
    ) -> Result<WebhookHealth, TaskhookError> {
        let mut store = self.store.lock().unwrap();
        let sub = store
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| missing("Webhook", id))?;
        change(sub);
        Ok(sub.health())
    }
}

impl WebhookRepository for Webhooks {
    async fn create(
        &self,
        subscription: WebhookSubscription,
    ) -> Result<WebhookSubscription, TaskhookError> {
        self.store.lock().unwrap().push(subscription.clone());
        Ok(subscription)
    }

    async fn get_by_id(&self, id: WebhookId) -> Result<Option<WebhookSubscription>, TaskhookError> {
        Ok(self.store.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<WebhookSubscription>, TaskhookError> {
        Ok(self.store.lock().unwrap().clone())
    }

    async fn update(
        &self,
        subscription: WebhookSubscription,
    ) -> Result<WebhookSubscription, TaskhookError> {
        let mut store = self.store.lock().unwrap();
        let slot = store
            .iter_mut()
            .find(|s| s.id == subscription.id)
            .ok_or_else(|| missing("Webhook", subscription.id))?;
        slot.url = subscription.url;
        slot.secret = subscription.secret;
        slot.events = subscription.events;
        Ok(slot.clone())
    }

    async fn set_active(
        &self,
        id: WebhookId,
        active: bool,
    ) -> Result<WebhookSubscription, TaskhookError> {
        let mut store = self.store.lock().unwrap();
        let slot = store
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| missing("Webhook", id))?;
        if active && !slot.is_active {
            slot.failure_count = 0;
        }
        slot.is_active = active;
        Ok(slot.clone())
    }

    async fn delete(&self, id: WebhookId) -> Result<(), TaskhookError> {
        let mut store = self.store.lock().unwrap();
        let before = store.len();
        store.retain(|s| s.id != id);
        if store.len() == before {
            return Err(missing("Webhook", id));
        }
        Ok(())
    }

    async fn find_active(&self) -> Result<Vec<WebhookSubscription>, TaskhookError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }

    async fn append_delivery(&self, delivery: DeliveryLog) -> Result<(), TaskhookError> {
        self.deliveries.lock().unwrap().push(delivery);
        Ok(())
    }

    async fn record_success(
        &self,
        id: WebhookId,
        at: Timestamp,
    ) -> Result<WebhookHealth, TaskhookError> {
        self.health(id, |s| {
            s.failure_count = 0;
            s.last_triggered_at = Some(at);
        })
    }

    async fn record_failure(
        &self,
        id: WebhookId,
        threshold: u32,
    ) -> Result<WebhookHealth, TaskhookError> {
        self.health(id, |s| {
            s.failure_count += 1;
            if s.failure_count >= threshold {
                s.is_active = false;
            }
        })
    }

    async fn list_deliveries(
        &self,
        webhook_id: WebhookId,
        limit: u32,
    ) -> Result<Vec<DeliveryLog>, TaskhookError> {
        Ok(self
            .deliveries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|d| d.webhook_id == webhook_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct Tasks {
    store: Mutex<HashMap<TaskId, Task>>,
}

impl TaskRepository for Tasks {
    async fn create(&self, task: Task) -> Result<Task, TaskhookError> {
        self.store
            .lock()
            .unwrap()
            .insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Option<Task>, TaskhookError> {
        Ok(self.store.lock().unwrap().get(&id).cloned())
    }

    async fn apply_change(&self, id: TaskId, change: TaskChange) -> Result<Task, TaskhookError> {
        let mut store = self.store.lock().unwrap();
        let task = store.get_mut(&id).ok_or_else(|| missing("Task", &id))?;
        task.apply(change, now());
        Ok(task.clone())
    }
}

#[derive(Default)]
pub struct Integrations {
    store: Mutex<HashMap<UserId, IntegrationSettings>>,
}

impl IntegrationRepository for Integrations {
    async fn get_settings(&self, owner: UserId) -> Result<IntegrationSettings, TaskhookError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .get(&owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_settings(
        &self,
        owner: UserId,
        settings: IntegrationSettings,
    ) -> Result<IntegrationSettings, TaskhookError> {
        self.store.lock().unwrap().insert(owner, settings.clone());
        Ok(settings)
    }
}

#[derive(Default)]
pub struct Recorder {
    pub events: Mutex<Vec<DomainEvent>>,
}

impl EventPublisher for Recorder {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Recorder {
    pub fn taken(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

/// Full router over fresh in-memory ports, plus the event recorder.
pub fn app() -> (Router, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let state = AppState::new(
        AutomationService::new(Automations::default()),
        WebhookService::new(Webhooks::default()),
        TaskService::new(Tasks::default(), Arc::clone(&recorder)),
        IntegrationService::new(Integrations::default()),
        Arc::clone(&recorder),
    );
    (crate::router::build(state), recorder)
}

/// Send one request and decode the JSON response body (`Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}
