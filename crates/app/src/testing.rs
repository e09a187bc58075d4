//! In-memory port implementations shared by the unit tests of this crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use taskhook_domain::automation::{Automation, AutomationLog};
use taskhook_domain::error::{NotFoundError, TaskhookError};
use taskhook_domain::event::DomainEvent;
use taskhook_domain::id::{AutomationId, TaskId, UserId, WebhookId};
use taskhook_domain::integration::IntegrationSettings;
use taskhook_domain::task::{Task, TaskChange};
use taskhook_domain::time::{Timestamp, now};
use taskhook_domain::webhook::{DeliveryLog, WebhookHealth, WebhookSubscription};

use crate::ports::{
    AutomationRepository, EventPublisher, HttpRequest, HttpResponse, HttpTransport,
    IntegrationRepository, TaskRepository, TransportError, WebhookRepository,
};

fn not_found(entity: &'static str, id: impl ToString) -> TaskhookError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}

// ── Automations ────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryAutomationRepo {
    pub store: Mutex<HashMap<AutomationId, Automation>>,
    pub logs: Mutex<Vec<AutomationLog>>,
    pub fail_fetch: bool,
}

impl InMemoryAutomationRepo {
    pub fn with(automations: Vec<Automation>) -> Self {
        let map = automations.into_iter().map(|a| (a.id, a)).collect();
        Self {
            store: Mutex::new(map),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_fetch: true,
            ..Self::default()
        }
    }

    pub fn get(&self, id: AutomationId) -> Automation {
        self.store.lock().unwrap().get(&id).cloned().unwrap()
    }

    pub fn logs_for(&self, id: AutomationId) -> Vec<AutomationLog> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.automation_id == id)
            .cloned()
            .collect()
    }
}

impl AutomationRepository for InMemoryAutomationRepo {
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, TaskhookError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(automation.id, automation.clone());
        async { Ok(automation) }
    }

    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, TaskhookError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn list(
        &self,
        owner: Option<UserId>,
    ) -> impl Future<Output = Result<Vec<Automation>, TaskhookError>> + Send {
        let result: Vec<_> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|a| owner.as_ref().is_none_or(|o| &a.owner_id == o))
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, TaskhookError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = match store.get_mut(&automation.id) {
            Some(existing) => {
                let mut updated = automation;
                updated.trigger_count = existing.trigger_count;
                updated.last_triggered_at = existing.last_triggered_at;
                *existing = updated.clone();
                Ok(updated)
            }
            None => Err(not_found("Automation", automation.id)),
        };
        async { result }
    }

    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), TaskhookError>> + Send {
        let removed = self.store.lock().unwrap().remove(&id);
        async move { removed.map(|_| ()).ok_or_else(|| not_found("Automation", id)) }
    }

    fn find_active(
        &self,
        owner: Option<UserId>,
    ) -> impl Future<Output = Result<Vec<Automation>, TaskhookError>> + Send {
        let result = if self.fail_fetch {
            Err(TaskhookError::Storage("database unavailable".into()))
        } else {
            let mut rules: Vec<_> = self
                .store
                .lock()
                .unwrap()
                .values()
                .filter(|a| a.is_active)
                .filter(|a| owner.as_ref().is_none_or(|o| &a.owner_id == o))
                .cloned()
                .collect();
            rules.sort_by_key(|a| a.created_at);
            Ok(rules)
        };
        async { result }
    }

    fn record_outcome(
        &self,
        log: AutomationLog,
    ) -> impl Future<Output = Result<(), TaskhookError>> + Send {
        if log.success {
            if let Some(rule) = self.store.lock().unwrap().get_mut(&log.automation_id) {
                rule.trigger_count += 1;
                rule.last_triggered_at = Some(log.created_at);
            }
        }
        self.logs.lock().unwrap().push(log);
        async { Ok(()) }
    }

    fn list_logs(
        &self,
        automation_id: AutomationId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<AutomationLog>, TaskhookError>> + Send {
        let mut logs = self.logs_for(automation_id);
        logs.reverse();
        logs.truncate(limit as usize);
        async { Ok(logs) }
    }
}

// ── Webhooks ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryWebhookRepo {
    pub store: Mutex<HashMap<WebhookId, WebhookSubscription>>,
    pub deliveries: Mutex<Vec<DeliveryLog>>,
    pub find_active_calls: Mutex<usize>,
}

impl InMemoryWebhookRepo {
    pub fn with(subscriptions: Vec<WebhookSubscription>) -> Self {
        let map = subscriptions.into_iter().map(|s| (s.id, s)).collect();
        Self {
            store: Mutex::new(map),
            ..Self::default()
        }
    }

    pub fn get(&self, id: WebhookId) -> WebhookSubscription {
        self.store.lock().unwrap().get(&id).cloned().unwrap()
    }

    pub fn deliveries_for(&self, id: WebhookId) -> Vec<DeliveryLog> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.webhook_id == id)
            .cloned()
            .collect()
    }
}

impl WebhookRepository for InMemoryWebhookRepo {
    fn create(
        &self,
        subscription: WebhookSubscription,
    ) -> impl Future<Output = Result<WebhookSubscription, TaskhookError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(subscription.id, subscription.clone());
        async { Ok(subscription) }
    }

    fn get_by_id(
        &self,
        id: WebhookId,
    ) -> impl Future<Output = Result<Option<WebhookSubscription>, TaskhookError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn list(&self) -> impl Future<Output = Result<Vec<WebhookSubscription>, TaskhookError>> + Send {
        let result: Vec<_> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn update(
        &self,
        subscription: WebhookSubscription,
    ) -> impl Future<Output = Result<WebhookSubscription, TaskhookError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = match store.get_mut(&subscription.id) {
            Some(existing) => {
                existing.url = subscription.url;
                existing.secret = subscription.secret;
                existing.events = subscription.events;
                Ok(existing.clone())
            }
            None => Err(not_found("Webhook", subscription.id)),
        };
        async { result }
    }

    fn set_active(
        &self,
        id: WebhookId,
        active: bool,
    ) -> impl Future<Output = Result<WebhookSubscription, TaskhookError>> + Send {
        let result = match self.store.lock().unwrap().get_mut(&id) {
            Some(sub) => {
                if active && !sub.is_active {
                    sub.failure_count = 0;
                }
                sub.is_active = active;
                Ok(sub.clone())
            }
            None => Err(not_found("Webhook", id)),
        };
        async { result }
    }

    fn delete(&self, id: WebhookId) -> impl Future<Output = Result<(), TaskhookError>> + Send {
        let removed = self.store.lock().unwrap().remove(&id);
        async move { removed.map(|_| ()).ok_or_else(|| not_found("Webhook", id)) }
    }

    fn find_active(
        &self,
    ) -> impl Future<Output = Result<Vec<WebhookSubscription>, TaskhookError>> + Send {
        *self.find_active_calls.lock().unwrap() += 1;
        let result: Vec<_> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn append_delivery(
        &self,
        delivery: DeliveryLog,
    ) -> impl Future<Output = Result<(), TaskhookError>> + Send {
        self.deliveries.lock().unwrap().push(delivery);
        async { Ok(()) }
    }

    fn record_success(
        &self,
        id: WebhookId,
        at: Timestamp,
    ) -> impl Future<Output = Result<WebhookHealth, TaskhookError>> + Send {
        let result = match self.store.lock().unwrap().get_mut(&id) {
            Some(sub) => {
                sub.failure_count = 0;
                sub.last_triggered_at = Some(at);
                Ok(sub.health())
            }
            None => Err(not_found("Webhook", id)),
        };
        async { result }
    }

    fn record_failure(
        &self,
        id: WebhookId,
        threshold: u32,
    ) -> impl Future<Output = Result<WebhookHealth, TaskhookError>> + Send {
        let result = match self.store.lock().unwrap().get_mut(&id) {
            Some(sub) => {
                sub.failure_count += 1;
                if sub.failure_count >= threshold {
                    sub.is_active = false;
                }
                Ok(sub.health())
            }
            None => Err(not_found("Webhook", id)),
        };
        async { result }
    }

    fn list_deliveries(
        &self,
        webhook_id: WebhookId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<DeliveryLog>, TaskhookError>> + Send {
        let mut deliveries = self.deliveries_for(webhook_id);
        deliveries.reverse();
        deliveries.truncate(limit as usize);
        async { Ok(deliveries) }
    }
}

// ── Tasks ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryTaskRepo {
    pub store: Mutex<HashMap<TaskId, Task>>,
    pub changes: Mutex<Vec<(TaskId, TaskChange)>>,
    /// Per-field latency applied before a change lands.
    pub delays: Mutex<HashMap<&'static str, Duration>>,
}

impl InMemoryTaskRepo {
    pub fn with(tasks: Vec<Task>) -> Self {
        let map = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            store: Mutex::new(map),
            ..Self::default()
        }
    }

    pub fn get(&self, id: &str) -> Task {
        self.store
            .lock()
            .unwrap()
            .get(&TaskId::new(id))
            .cloned()
            .unwrap()
    }

    pub fn slow(self, field: &'static str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(field, delay);
        self
    }

    pub fn change_count(&self) -> usize {
        self.changes.lock().unwrap().len()
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        self.changes
            .lock()
            .unwrap()
            .iter()
            .map(|(_, change)| change.field())
            .collect()
    }
}

impl TaskRepository for InMemoryTaskRepo {
    fn create(&self, task: Task) -> impl Future<Output = Result<Task, TaskhookError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(task.id.clone(), task.clone());
        async { Ok(task) }
    }

    fn get_by_id(
        &self,
        id: TaskId,
    ) -> impl Future<Output = Result<Option<Task>, TaskhookError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn apply_change(
        &self,
        id: TaskId,
        change: TaskChange,
    ) -> impl Future<Output = Result<Task, TaskhookError>> + Send {
        let delay = self.delays.lock().unwrap().get(change.field()).copied();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let result = match self.store.lock().unwrap().get_mut(&id) {
                Some(task) => {
                    task.apply(change.clone(), now());
                    self.changes.lock().unwrap().push((id, change));
                    Ok(task.clone())
                }
                None => Err(not_found("Task", id)),
            };
            result
        }
    }
}

// ── Integration settings ───────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryIntegrationRepo {
    pub store: Mutex<HashMap<UserId, IntegrationSettings>>,
}

impl InMemoryIntegrationRepo {
    pub fn with_slack(owner: &str, url: &str) -> Self {
        let repo = Self::default();
        repo.store.lock().unwrap().insert(
            UserId::new(owner),
            IntegrationSettings {
                slack_webhook_url: Some(url.to_string()),
            },
        );
        repo
    }
}

impl IntegrationRepository for InMemoryIntegrationRepo {
    fn get_settings(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<IntegrationSettings, TaskhookError>> + Send {
        let result = self
            .store
            .lock()
            .unwrap()
            .get(&owner)
            .cloned()
            .unwrap_or_default();
        async { Ok(result) }
    }

    fn save_settings(
        &self,
        owner: UserId,
        settings: IntegrationSettings,
    ) -> impl Future<Output = Result<IntegrationSettings, TaskhookError>> + Send {
        self.store.lock().unwrap().insert(owner, settings.clone());
        async { Ok(settings) }
    }
}

// ── HTTP transport ─────────────────────────────────────────────────

/// How the fake transport answers requests to one URL.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, &'static str),
    Fail(TransportError),
    /// Never answer; exercises the dispatcher's own deadline.
    Hang,
}

#[derive(Default)]
pub struct ScriptedTransport {
    pub replies: Mutex<HashMap<String, Reply>>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn reply(self, url: &str, reply: Reply) -> Self {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn post(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or(Reply::Status(200, "ok"));
        self.requests.lock().unwrap().push(request);
        async move {
            match reply {
                Reply::Status(status, body) => Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
                Reply::Fail(err) => Err(err),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(TransportError::Request("unreachable".to_string()))
                }
            }
        }
    }
}

// ── Event publisher ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<DomainEvent>>,
}

impl RecordingPublisher {
    pub fn names(&self) -> Vec<taskhook_domain::event::EventName> {
        self.events.lock().unwrap().iter().map(|e| e.name).collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}
