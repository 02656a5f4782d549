// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! rtcontrol API client
//!
//! Client for the realtime messaging Control API: apps, namespaces, API keys,
//! queues and integration rules.
//!
//! The [`ControlApi`] trait is the surface the reconciler consumes; it has one
//! method per resource kind and verb and performs no retries of its own.
//! [`HttpControlApi`] implements it over HTTPS.
//!
//! # Example
//!
//! ```no_run
//! use rtcontrol_api::{ApiConfig, ControlApi, HttpControlApi};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HttpControlApi::new(ApiConfig::new("my-access-token"))?;
//!
//! let me = api.me().await?;
//! for app in api.list_apps(&me.account.id).await? {
//!     println!("{} ({:?})", app.name, app.status);
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod client;
mod config;
mod error;
mod targets;
mod types;

pub use api::ControlApi;
pub use client::HttpControlApi;
pub use config::{ApiConfig, DEFAULT_BASE_URL};
pub use error::{ApiError, Result, TransportKind};
pub use targets::{
    AmqpExternalTarget, AmqpTarget, AwsAuthentication, AwsKinesisTarget, AwsLambdaTarget,
    AwsSqsTarget, AzureFunctionTarget, Format, GoogleCloudFunctionTarget, Header, HttpTarget,
    IftttTarget, KafkaAuth, KafkaSasl, KafkaTarget, MongoIngressTarget,
    PostgresOutboxIngressTarget, PulsarAuthentication, PulsarTarget, RuleTarget, SaslMechanism,
    WebhookTarget,
};
pub use types::{
    AccountInfo, App, AppPayload, AppStatus, Key, KeyPayload, KeyStatus, Me, Namespace,
    NamespacePayload, Queue, QueueAmqp, QueuePayload, QueueStomp, RequestMode, Rule, RulePayload,
    RuleSource, RuleStatus, SourceType,
};
