// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Reconciliation engine for Control API resources.
//!
//! Given a desired state for an app, namespace, key, queue or rule, the
//! [`Engine`] creates, reads, updates, deletes or imports the matching remote
//! object and returns its observed state. Every remote call goes through the
//! [`retry`] executor, which retries transient failures with jittered
//! exponential backoff and honours cancellation and deadlines.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rtcontrol_api::HttpControlApi;
//! use rtcontrol_reconcile::{Engine, Observation, RetryContext, RetryPolicy};
//! use rtcontrol_reconcile::resources::RuleKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(HttpControlApi::from_env()?);
//! let ctx = RetryContext::new();
//! let engine = Engine::connect(api, RetryPolicy::default(), &ctx).await?;
//!
//! match engine.import::<RuleKind>(&ctx, "app1,rule1").await? {
//!     Observation::Present(rule) => println!("{:?}", rule.target),
//!     Observation::Absent => println!("rule is gone"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod engine;
pub mod error;
pub mod import;
pub mod resource;
pub mod resources;
pub mod retry;
pub mod state_file;
pub mod targets;

pub use classify::{Classify, ErrorClass, classify_error, classify_status};
pub use engine::Engine;
pub use error::{Operation, ReconcileError, Result};
pub use import::{ImportError, ImportFields};
pub use resource::{
    Deletion, Locator, Observation, ReadPolicy, ResourceKind, Scope, UpdatePolicy,
    carry_forward,
};
pub use retry::{RetryContext, RetryError, RetryPolicy, backoff, execute};
pub use state_file::{StateFile, StateFileError};
pub use targets::Target;

// Re-export the client crate so callers need only one dependency.
pub use rtcontrol_api;
