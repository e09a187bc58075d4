//! # taskhook-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Accept **domain events** from the surrounding product (`POST /api/events`)
//!   and hand them to the background router without waiting for it
//! - Serve a **JSON management API** for tasks, automations, webhook
//!   subscriptions, their logs, and per-user integration settings
//! - Map application results into HTTP responses and domain errors into
//!   `400` / `404` / `500` JSON bodies
//!
//! ## Dependency rule
//! Depends on `taskhook-app` (for port traits and services) and
//! `taskhook-domain` (for request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod testing;
