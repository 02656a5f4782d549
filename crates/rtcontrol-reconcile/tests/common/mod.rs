// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory Control API for engine tests.
//!
//! Behaves like the real service where the engine cares: ids are assigned on
//! create, write-only secrets are never echoed, missing objects are 404.
//! Failures can be queued per method and every call is counted.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rtcontrol_api::{
    AccountInfo, ApiError, App, AppPayload, ControlApi, Key, KeyPayload, Me, Namespace,
    NamespacePayload, Queue, QueueAmqp, QueuePayload, Result, Rule, RulePayload, RuleTarget,
    TransportKind,
};
use rtcontrol_reconcile::{Engine, RetryPolicy};

pub const ACCOUNT_ID: &str = "acc1";

#[derive(Default)]
struct Inner {
    apps: Vec<App>,
    namespaces: BTreeMap<String, Vec<Namespace>>,
    keys: BTreeMap<String, Vec<Key>>,
    queues: BTreeMap<String, Vec<Queue>>,
    rules: BTreeMap<String, Vec<Rule>>,
    failures: HashMap<&'static str, VecDeque<ApiError>>,
    calls: HashMap<&'static str, usize>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

#[derive(Default)]
pub struct FakeControlApi {
    inner: Mutex<Inner>,
}

impl FakeControlApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next calls of `method` fail with `errors`, in order.
    pub fn fail_with(&self, method: &'static str, errors: impl IntoIterator<Item = ApiError>) {
        self.lock()
            .failures
            .entry(method)
            .or_default()
            .extend(errors);
    }

    /// Number of calls made to `method`, including failed ones.
    pub fn calls(&self, method: &'static str) -> usize {
        self.lock().calls.get(method).copied().unwrap_or(0)
    }

    /// Remove a rule behind the engine's back.
    pub fn drop_rule(&self, app_id: &str, rule_id: &str) {
        if let Some(rules) = self.lock().rules.get_mut(app_id) {
            rules.retain(|r| r.id != rule_id);
        }
    }

    /// Remove a queue behind the engine's back.
    pub fn drop_queue(&self, app_id: &str, queue_id: &str) {
        if let Some(queues) = self.lock().queues.get_mut(app_id) {
            queues.retain(|q| q.id != queue_id);
        }
    }

    /// Raw stored rule, as the server would return it.
    pub fn stored_rule(&self, app_id: &str, rule_id: &str) -> Option<Rule> {
        self.lock()
            .rules
            .get(app_id)
            .and_then(|rules| rules.iter().find(|r| r.id == rule_id).cloned())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Count the call and pop a queued failure, if any.
    fn enter(&self, method: &'static str) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        *inner.calls.entry(method).or_default() += 1;
        if let Some(err) = inner.failures.get_mut(method).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        Ok(inner)
    }
}

/// Engine over `api` with zero backoff so tests run instantly.
pub fn engine(api: Arc<FakeControlApi>) -> Engine {
    Engine::new(api, Some(ACCOUNT_ID.to_string()), fast_policy())
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::default()
        .with_initial_backoff(Duration::ZERO)
        .with_max_backoff(Duration::ZERO)
}

pub fn unavailable() -> ApiError {
    ApiError::server(503, "service unavailable")
}

pub fn connection_reset() -> ApiError {
    ApiError::Transport {
        kind: TransportKind::Reset,
        message: "connection reset by peer".to_string(),
    }
}

pub fn bad_request() -> ApiError {
    ApiError::server(400, "invalid request")
}

fn echo_rule_target(payload: &RulePayload) -> Result<serde_json::Value> {
    RuleTarget::from_parts(&payload.rule_type, payload.target.clone())?
        .redacted()
        .to_json()
}

#[async_trait]
impl ControlApi for FakeControlApi {
    async fn me(&self) -> Result<Me> {
        self.enter("me")?;
        Ok(Me {
            account: AccountInfo {
                id: ACCOUNT_ID.to_string(),
                name: Some("Test".to_string()),
            },
        })
    }

    async fn list_apps(&self, account_id: &str) -> Result<Vec<App>> {
        let inner = self.enter("list_apps")?;
        Ok(inner
            .apps
            .iter()
            .filter(|a| a.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn create_app(&self, account_id: &str, payload: &AppPayload) -> Result<App> {
        let mut inner = self.enter("create_app")?;
        let app = App {
            id: inner.next_id("app"),
            account_id: account_id.to_string(),
            name: payload.name.clone().unwrap_or_default(),
            status: payload.status.unwrap_or_default(),
            tls_only: payload.tls_only.unwrap_or_default(),
            fcm_key: None,
            fcm_service_account: None,
            fcm_project_id: payload.fcm_project_id.clone(),
            apns_certificate: None,
            apns_private_key: None,
            apns_use_sandbox_endpoint: payload.apns_use_sandbox_endpoint.unwrap_or_default(),
            created: None,
            modified: None,
        };
        inner.apps.push(app.clone());
        Ok(app)
    }

    async fn update_app(&self, app_id: &str, payload: &AppPayload) -> Result<App> {
        let mut inner = self.enter("update_app")?;
        let app = inner
            .apps
            .iter_mut()
            .find(|a| a.id == app_id)
            .ok_or_else(|| ApiError::not_found("app"))?;
        if let Some(name) = &payload.name {
            app.name = name.clone();
        }
        if let Some(status) = payload.status {
            app.status = status;
        }
        if let Some(tls_only) = payload.tls_only {
            app.tls_only = tls_only;
        }
        Ok(app.clone())
    }

    async fn delete_app(&self, app_id: &str) -> Result<()> {
        let mut inner = self.enter("delete_app")?;
        let before = inner.apps.len();
        inner.apps.retain(|a| a.id != app_id);
        if inner.apps.len() == before {
            return Err(ApiError::not_found("app"));
        }
        Ok(())
    }

    async fn list_namespaces(&self, app_id: &str) -> Result<Vec<Namespace>> {
        let inner = self.enter("list_namespaces")?;
        Ok(inner.namespaces.get(app_id).cloned().unwrap_or_default())
    }

    async fn create_namespace(
        &self,
        app_id: &str,
        payload: &NamespacePayload,
    ) -> Result<Namespace> {
        let mut inner = self.enter("create_namespace")?;
        let ns = Namespace {
            id: payload.id.clone().unwrap_or_default(),
            authenticated: payload.authenticated,
            persisted: payload.persisted,
            persist_last: payload.persist_last,
            push_enabled: payload.push_enabled,
            tls_only: payload.tls_only,
            expose_time_serial: payload.expose_time_serial,
            batching_enabled: payload.batching_enabled,
            batching_interval: payload.batching_interval,
            conflation_enabled: payload.conflation_enabled,
            conflation_interval: payload.conflation_interval,
            conflation_key: payload.conflation_key.clone(),
            created: None,
            modified: None,
        };
        inner
            .namespaces
            .entry(app_id.to_string())
            .or_default()
            .push(ns.clone());
        Ok(ns)
    }

    async fn update_namespace(
        &self,
        app_id: &str,
        namespace_id: &str,
        payload: &NamespacePayload,
    ) -> Result<Namespace> {
        let mut inner = self.enter("update_namespace")?;
        let ns = inner
            .namespaces
            .get_mut(app_id)
            .and_then(|list| list.iter_mut().find(|n| n.id == namespace_id))
            .ok_or_else(|| ApiError::not_found("namespace"))?;
        ns.authenticated = payload.authenticated;
        ns.persisted = payload.persisted;
        ns.persist_last = payload.persist_last;
        ns.push_enabled = payload.push_enabled;
        ns.tls_only = payload.tls_only;
        ns.expose_time_serial = payload.expose_time_serial;
        ns.batching_enabled = payload.batching_enabled;
        ns.batching_interval = payload.batching_interval;
        ns.conflation_enabled = payload.conflation_enabled;
        ns.conflation_interval = payload.conflation_interval;
        ns.conflation_key = payload.conflation_key.clone();
        Ok(ns.clone())
    }

    async fn delete_namespace(&self, app_id: &str, namespace_id: &str) -> Result<()> {
        let mut inner = self.enter("delete_namespace")?;
        let list = inner
            .namespaces
            .get_mut(app_id)
            .ok_or_else(|| ApiError::not_found("namespace"))?;
        let before = list.len();
        list.retain(|n| n.id != namespace_id);
        if list.len() == before {
            return Err(ApiError::not_found("namespace"));
        }
        Ok(())
    }

    async fn list_keys(&self, app_id: &str) -> Result<Vec<Key>> {
        let inner = self.enter("list_keys")?;
        Ok(inner.keys.get(app_id).cloned().unwrap_or_default())
    }

    async fn create_key(&self, app_id: &str, payload: &KeyPayload) -> Result<Key> {
        let mut inner = self.enter("create_key")?;
        let id = inner.next_id("key");
        let key = Key {
            key: format!("{}.{}:secret", app_id, id),
            id,
            app_id: app_id.to_string(),
            name: payload.name.clone(),
            status: 0,
            capability: payload.capability.clone(),
            revocable_tokens: payload.revocable_tokens.unwrap_or_default(),
            created: None,
            modified: None,
        };
        inner
            .keys
            .entry(app_id.to_string())
            .or_default()
            .push(key.clone());
        Ok(key)
    }

    async fn update_key(&self, app_id: &str, key_id: &str, payload: &KeyPayload) -> Result<Key> {
        let mut inner = self.enter("update_key")?;
        let key = inner
            .keys
            .get_mut(app_id)
            .and_then(|list| list.iter_mut().find(|k| k.id == key_id))
            .ok_or_else(|| ApiError::not_found("key"))?;
        key.name = payload.name.clone();
        key.capability = payload.capability.clone();
        Ok(key.clone())
    }

    async fn revoke_key(&self, app_id: &str, key_id: &str) -> Result<()> {
        let mut inner = self.enter("revoke_key")?;
        // Revoked keys stay listed with status 1.
        let key = inner
            .keys
            .get_mut(app_id)
            .and_then(|keys| keys.iter_mut().find(|k| k.id == key_id))
            .ok_or_else(|| ApiError::not_found("key"))?;
        key.status = 1;
        Ok(())
    }

    async fn list_queues(&self, app_id: &str) -> Result<Vec<Queue>> {
        let inner = self.enter("list_queues")?;
        Ok(inner.queues.get(app_id).cloned().unwrap_or_default())
    }

    async fn create_queue(&self, app_id: &str, payload: &QueuePayload) -> Result<Queue> {
        let mut inner = self.enter("create_queue")?;
        let id = format!("{}:{}:{}", app_id, payload.region, payload.name);
        let queue = Queue {
            amqp: Some(QueueAmqp {
                uri: "amqps://queue.example.com".to_string(),
                queue_name: id.clone(),
            }),
            id,
            app_id: app_id.to_string(),
            name: payload.name.clone(),
            region: payload.region.clone(),
            ttl: payload.ttl,
            max_length: payload.max_length,
            state: Some("Running".to_string()),
            stomp: None,
            deadletter: false,
            deadletter_id: None,
        };
        inner
            .queues
            .entry(app_id.to_string())
            .or_default()
            .push(queue.clone());
        Ok(queue)
    }

    async fn delete_queue(&self, app_id: &str, queue_id: &str) -> Result<()> {
        let mut inner = self.enter("delete_queue")?;
        let list = inner
            .queues
            .get_mut(app_id)
            .ok_or_else(|| ApiError::not_found("queue"))?;
        let before = list.len();
        list.retain(|q| q.id != queue_id);
        if list.len() == before {
            return Err(ApiError::not_found("queue"));
        }
        Ok(())
    }

    async fn list_rules(&self, app_id: &str) -> Result<Vec<Rule>> {
        let inner = self.enter("list_rules")?;
        Ok(inner.rules.get(app_id).cloned().unwrap_or_default())
    }

    async fn get_rule(&self, app_id: &str, rule_id: &str) -> Result<Rule> {
        let inner = self.enter("get_rule")?;
        inner
            .rules
            .get(app_id)
            .and_then(|list| list.iter().find(|r| r.id == rule_id))
            .cloned()
            .ok_or_else(|| ApiError::not_found("rule"))
    }

    async fn create_rule(&self, app_id: &str, payload: &RulePayload) -> Result<Rule> {
        let target = echo_rule_target(payload)?;
        let mut inner = self.enter("create_rule")?;
        let rule = Rule {
            id: inner.next_id("rule"),
            app_id: app_id.to_string(),
            status: payload.status,
            request_mode: payload.request_mode,
            source: payload.source.clone(),
            rule_type: payload.rule_type.clone(),
            target,
            version: Some("1".to_string()),
            created: None,
            modified: None,
        };
        inner
            .rules
            .entry(app_id.to_string())
            .or_default()
            .push(rule.clone());
        Ok(rule)
    }

    async fn update_rule(&self, app_id: &str, rule_id: &str, payload: &RulePayload) -> Result<Rule> {
        let target = echo_rule_target(payload)?;
        let mut inner = self.enter("update_rule")?;
        let rule = inner
            .rules
            .get_mut(app_id)
            .and_then(|list| list.iter_mut().find(|r| r.id == rule_id))
            .ok_or_else(|| ApiError::not_found("rule"))?;
        rule.status = payload.status;
        rule.request_mode = payload.request_mode;
        rule.source = payload.source.clone();
        rule.rule_type = payload.rule_type.clone();
        rule.target = target;
        Ok(rule.clone())
    }

    async fn delete_rule(&self, app_id: &str, rule_id: &str) -> Result<()> {
        let mut inner = self.enter("delete_rule")?;
        let list = inner
            .rules
            .get_mut(app_id)
            .ok_or_else(|| ApiError::not_found("rule"))?;
        let before = list.len();
        list.retain(|r| r.id != rule_id);
        if list.len() == before {
            return Err(ApiError::not_found("rule"));
        }
        Ok(())
    }
}
