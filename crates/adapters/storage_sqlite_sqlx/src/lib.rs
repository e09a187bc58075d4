//! # taskhook-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `taskhook-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Keep counter updates atomic: run counters in one transaction with the
//!   log row, webhook health in a single `UPDATE … RETURNING`
//!
//! ## Dependency rule
//! Depends on `taskhook-app` (for port traits) and `taskhook-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod automation_repo;
mod codec;
mod error;
mod integration_repo;
mod pool;
mod task_repo;
mod webhook_repo;

pub use automation_repo::SqliteAutomationRepository;
pub use error::StorageError;
pub use integration_repo::SqliteIntegrationRepository;
pub use pool::{Config, Database};
pub use task_repo::SqliteTaskRepository;
pub use webhook_repo::SqliteWebhookRepository;
