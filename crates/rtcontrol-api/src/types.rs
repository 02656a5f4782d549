// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wire types for the Control API.
//!
//! Response types mirror what the server returns; `*Payload` types are request
//! bodies. Everything is camelCase on the wire.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Account
// ============================================================================

/// Response of `GET /me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Me {
    pub account: AccountInfo,
}

/// Account the token belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

// ============================================================================
// Apps
// ============================================================================

/// App status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    #[default]
    Enabled,
    Disabled,
}

/// An app as returned by the server.
///
/// Push credentials (`fcmKey`, `fcmServiceAccount`, `apnsCertificate`,
/// `apnsPrivateKey`) are accepted on write but never echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub status: AppStatus,
    #[serde(default)]
    pub tls_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_service_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apns_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apns_private_key: Option<String>,
    #[serde(default)]
    pub apns_use_sandbox_endpoint: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub modified: Option<DateTime<Utc>>,
}

/// Body of app create/update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_service_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns_certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns_private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns_use_sandbox_endpoint: Option<bool>,
}

// ============================================================================
// Namespaces (channel rules)
// ============================================================================

/// A namespace as returned by the server. The `id` is the namespace name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub id: String,
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub persisted: bool,
    #[serde(default)]
    pub persist_last: bool,
    #[serde(default)]
    pub push_enabled: bool,
    #[serde(default)]
    pub tls_only: bool,
    #[serde(default)]
    pub expose_time_serial: bool,
    #[serde(default)]
    pub batching_enabled: bool,
    #[serde(default)]
    pub batching_interval: Option<u32>,
    #[serde(default)]
    pub conflation_enabled: bool,
    #[serde(default)]
    pub conflation_interval: Option<u32>,
    #[serde(default)]
    pub conflation_key: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub modified: Option<DateTime<Utc>>,
}

/// Body of namespace create/update requests. `id` is only sent on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespacePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub authenticated: bool,
    pub persisted: bool,
    pub persist_last: bool,
    pub push_enabled: bool,
    pub tls_only: bool,
    pub expose_time_serial: bool,
    pub batching_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batching_interval: Option<u32>,
    pub conflation_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflation_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflation_key: Option<String>,
}

// ============================================================================
// Keys
// ============================================================================

/// Key status as reported by the server (0 = enabled, 1 = revoked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    Enabled,
    Revoked,
}

impl From<i32> for KeyStatus {
    fn from(value: i32) -> Self {
        match value {
            0 => KeyStatus::Enabled,
            _ => KeyStatus::Revoked,
        }
    }
}

impl From<KeyStatus> for i32 {
    fn from(status: KeyStatus) -> Self {
        match status {
            KeyStatus::Enabled => 0,
            KeyStatus::Revoked => 1,
        }
    }
}

/// An API key as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    pub id: String,
    pub app_id: String,
    #[serde(default)]
    pub name: String,
    /// Raw status code, see [`KeyStatus`].
    #[serde(default)]
    pub status: i32,
    /// Full key secret (`appId.keyId:secret`).
    pub key: String,
    /// Resource name to allowed operations.
    #[serde(default)]
    pub capability: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub revocable_tokens: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub modified: Option<DateTime<Utc>>,
}

impl Key {
    /// Decoded status.
    pub fn key_status(&self) -> KeyStatus {
        KeyStatus::from(self.status)
    }
}

/// Body of key create/update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPayload {
    pub name: String,
    pub capability: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocable_tokens: Option<bool>,
}

// ============================================================================
// Queues
// ============================================================================

/// AMQP connection details of a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueAmqp {
    pub uri: String,
    pub queue_name: String,
}

/// STOMP connection details of a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStomp {
    pub uri: String,
    pub host: String,
    pub destination: String,
}

/// A queue as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub id: String,
    pub app_id: String,
    pub name: String,
    pub region: String,
    /// Message TTL in minutes.
    pub ttl: u32,
    pub max_length: u32,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub amqp: Option<QueueAmqp>,
    #[serde(default)]
    pub stomp: Option<QueueStomp>,
    #[serde(default)]
    pub deadletter: bool,
    #[serde(default)]
    pub deadletter_id: Option<String>,
}

/// Body of a queue create request. Queues cannot be updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePayload {
    pub name: String,
    pub ttl: u32,
    pub max_length: u32,
    pub region: String,
}

// ============================================================================
// Rules
// ============================================================================

/// Rule status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    #[default]
    Enabled,
    Disabled,
}

/// Whether messages are delivered one by one or batched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    #[default]
    Single,
    Batch,
}

/// Channel event type that triggers a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceType {
    #[default]
    #[serde(rename = "channel.message")]
    ChannelMessage,
    #[serde(rename = "channel.presence")]
    ChannelPresence,
    #[serde(rename = "channel.lifecycle")]
    ChannelLifecycle,
    #[serde(rename = "channel.occupancy")]
    ChannelOccupancy,
}

/// What a rule listens to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSource {
    #[serde(default)]
    pub channel_filter: String,
    #[serde(rename = "type")]
    pub kind: SourceType,
}

/// A rule as returned by the server.
///
/// `target` is kept as raw JSON; use [`Rule::typed_target`] to decode it
/// according to `rule_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub app_id: String,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default)]
    pub request_mode: RequestMode,
    #[serde(default)]
    pub source: Option<RuleSource>,
    pub rule_type: String,
    pub target: serde_json::Value,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub modified: Option<DateTime<Utc>>,
}

impl Rule {
    /// Decode the target according to the rule type.
    pub fn typed_target(&self) -> crate::Result<crate::RuleTarget> {
        crate::RuleTarget::from_parts(&self.rule_type, self.target.clone())
    }
}

/// Body of rule create/update requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePayload {
    pub status: RuleStatus,
    pub request_mode: RequestMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<RuleSource>,
    pub rule_type: String,
    pub target: serde_json::Value,
}

impl RulePayload {
    /// Build a payload from a typed target.
    pub fn new(
        status: RuleStatus,
        request_mode: RequestMode,
        source: Option<RuleSource>,
        target: &crate::RuleTarget,
    ) -> crate::Result<Self> {
        Ok(Self {
            status,
            request_mode,
            source,
            rule_type: target.rule_type().to_string(),
            target: target.to_json()?,
        })
    }
}
