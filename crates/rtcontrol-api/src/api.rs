// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The Control API surface consumed by the reconciler.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    App, AppPayload, Key, KeyPayload, Me, Namespace, NamespacePayload, Queue, QueuePayload, Rule,
    RulePayload,
};

/// One async operation per resource kind and verb.
///
/// Implementations perform a single network call per method and never retry;
/// retrying is the caller's concern. Errors carry a status code so the caller
/// can classify them. Implementations must be safe to call concurrently.
#[async_trait]
pub trait ControlApi: Send + Sync {
    /// Describe the account the token belongs to.
    async fn me(&self) -> Result<Me>;

    // Apps (scoped to an account)
    async fn list_apps(&self, account_id: &str) -> Result<Vec<App>>;
    async fn create_app(&self, account_id: &str, payload: &AppPayload) -> Result<App>;
    async fn update_app(&self, app_id: &str, payload: &AppPayload) -> Result<App>;
    async fn delete_app(&self, app_id: &str) -> Result<()>;

    // Namespaces
    async fn list_namespaces(&self, app_id: &str) -> Result<Vec<Namespace>>;
    async fn create_namespace(&self, app_id: &str, payload: &NamespacePayload)
    -> Result<Namespace>;
    async fn update_namespace(
        &self,
        app_id: &str,
        namespace_id: &str,
        payload: &NamespacePayload,
    ) -> Result<Namespace>;
    async fn delete_namespace(&self, app_id: &str, namespace_id: &str) -> Result<()>;

    // Keys
    async fn list_keys(&self, app_id: &str) -> Result<Vec<Key>>;
    async fn create_key(&self, app_id: &str, payload: &KeyPayload) -> Result<Key>;
    async fn update_key(&self, app_id: &str, key_id: &str, payload: &KeyPayload) -> Result<Key>;
    /// Keys are never deleted, only revoked.
    async fn revoke_key(&self, app_id: &str, key_id: &str) -> Result<()>;

    // Queues (no update endpoint)
    async fn list_queues(&self, app_id: &str) -> Result<Vec<Queue>>;
    async fn create_queue(&self, app_id: &str, payload: &QueuePayload) -> Result<Queue>;
    async fn delete_queue(&self, app_id: &str, queue_id: &str) -> Result<()>;

    // Rules
    async fn list_rules(&self, app_id: &str) -> Result<Vec<Rule>>;
    async fn get_rule(&self, app_id: &str, rule_id: &str) -> Result<Rule>;
    async fn create_rule(&self, app_id: &str, payload: &RulePayload) -> Result<Rule>;
    async fn update_rule(&self, app_id: &str, rule_id: &str, payload: &RulePayload)
    -> Result<Rule>;
    async fn delete_rule(&self, app_id: &str, rule_id: &str) -> Result<()>;
}
