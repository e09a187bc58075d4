//! Shared application state for axum handlers.

use std::sync::Arc;

use taskhook_app::ports::{
    AutomationRepository, EventPublisher, IntegrationRepository, TaskRepository,
    WebhookRepository,
};
use taskhook_app::services::automation_service::AutomationService;
use taskhook_app::services::integration_service::IntegrationService;
use taskhook_app::services::task_service::TaskService;
use taskhook_app::services::webhook_service::WebhookService;

/// Application state shared across all axum handlers.
///
/// Generic over the repository types and the event publisher to avoid
/// dynamic dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<AR, WR, TR, IR, P> {
    pub automation_service: Arc<AutomationService<AR>>,
    pub webhook_service: Arc<WebhookService<WR>>,
    pub task_service: Arc<TaskService<TR, P>>,
    pub integration_service: Arc<IntegrationService<IR>>,
    /// Intake for events raised outside the task surface.
    pub events: Arc<P>,
}

impl<AR, WR, TR, IR, P> Clone for AppState<AR, WR, TR, IR, P> {
    fn clone(&self) -> Self {
        Self {
            automation_service: Arc::clone(&self.automation_service),
            webhook_service: Arc::clone(&self.webhook_service),
            task_service: Arc::clone(&self.task_service),
            integration_service: Arc::clone(&self.integration_service),
            events: Arc::clone(&self.events),
        }
    }
}

impl<AR, WR, TR, IR, P> AppState<AR, WR, TR, IR, P>
where
    AR: AutomationRepository + Send + Sync + 'static,
    WR: WebhookRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        automation_service: AutomationService<AR>,
        webhook_service: WebhookService<WR>,
        task_service: TaskService<TR, P>,
        integration_service: IntegrationService<IR>,
        events: P,
    ) -> Self {
        Self {
            automation_service: Arc::new(automation_service),
            webhook_service: Arc::new(webhook_service),
            task_service: Arc::new(task_service),
            integration_service: Arc::new(integration_service),
            events: Arc::new(events),
        }
    }
}
