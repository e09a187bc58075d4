//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.
//!
//! Every port is also implemented for `Arc<T>` so one adapter instance can be
//! shared by the engines and the management services.

pub mod automation_repo;
pub mod event_publisher;
pub mod integration_repo;
pub mod task_repo;
pub mod transport;
pub mod webhook_repo;

pub use automation_repo::AutomationRepository;
pub use event_publisher::EventPublisher;
pub use integration_repo::IntegrationRepository;
pub use task_repo::TaskRepository;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
pub use webhook_repo::WebhookRepository;
