//! # taskhookd — taskhook daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations and the outbound HTTP transport
//! - Start the event router feeding the automation engine and the webhook
//!   dispatcher
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (Ctrl-C), draining queued events before exit
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use taskhook_adapter_http_axum::state::AppState;
use taskhook_adapter_http_reqwest::ReqwestTransport;
use taskhook_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteAutomationRepository, SqliteIntegrationRepository,
    SqliteTaskRepository, SqliteWebhookRepository,
};
use taskhook_app::action_executor::ActionExecutor;
use taskhook_app::automation_engine::AutomationEngine;
use taskhook_app::event_router::{self, EventRouter};
use taskhook_app::services::automation_service::AutomationService;
use taskhook_app::services::integration_service::IntegrationService;
use taskhook_app::services::task_service::TaskService;
use taskhook_app::services::webhook_service::WebhookService;
use taskhook_app::webhook_dispatcher::WebhookDispatcher;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories and transport
    let automation_repo = Arc::new(SqliteAutomationRepository::new(pool.clone()));
    let webhook_repo = Arc::new(SqliteWebhookRepository::new(pool.clone()));
    let task_repo = Arc::new(SqliteTaskRepository::new(pool.clone()));
    let integration_repo = Arc::new(SqliteIntegrationRepository::new(pool));
    let transport = Arc::new(ReqwestTransport::new()?);

    // Event pipeline
    let (emitter, receiver) = event_router::channel(config.events.queue_capacity);
    let executor = ActionExecutor::new(
        Arc::clone(&task_repo),
        Arc::clone(&integration_repo),
        Arc::clone(&transport),
    );
    let engine = AutomationEngine::new(Arc::clone(&automation_repo), executor);
    let mut dispatcher = WebhookDispatcher::new(Arc::clone(&webhook_repo), transport);
    if let Some(user_agent) = &config.webhooks.user_agent {
        dispatcher = dispatcher.with_user_agent(user_agent.clone());
    }
    let router_handle = EventRouter::new(Arc::new(engine), Arc::new(dispatcher)).spawn(receiver);

    // HTTP
    let state = AppState::new(
        AutomationService::new(automation_repo),
        WebhookService::new(webhook_repo),
        TaskService::new(task_repo, emitter.clone()),
        IntegrationService::new(integration_repo),
        emitter,
    );
    let app = taskhook_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "taskhookd listening");

    // Serving consumes the router, so every emitter is gone once this returns.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("draining queued events");
    if let Err(err) = router_handle.await {
        tracing::error!(error = %err, "event router terminated abnormally");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
