//! # taskhook-domain
//!
//! Pure domain model for the taskhook automation and webhook engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Events** (named lifecycle occurrences) and the flat **Snapshot**
//!   of the entity they concern
//! - Define **Tasks** as far as automations need them (status, priority, field changes)
//! - Define **Automations** (trigger → condition → action rules) and evaluate
//!   their conditions against a snapshot
//! - Define **Webhook subscriptions**, their payloads, signatures and health policy
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod event;
pub mod integration;
pub mod snapshot;
pub mod task;
pub mod webhook;
