// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Namespaces (channel rules). The id is the namespace name and is chosen by
//! the caller, so it is known before creation.

use async_trait::async_trait;
use rtcontrol_api::{ApiError, ControlApi, Namespace, NamespacePayload};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::import::ImportFields;
use crate::resource::{
    Locator, ReadPolicy, ResourceKind, Scope, app_parent, app_scoped_locator,
};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceState {
    pub id: Option<String>,
    pub app_id: Option<String>,
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

pub struct NamespaceKind;

#[async_trait]
impl ResourceKind for NamespaceKind {
    type State = NamespaceState;
    type Payload = NamespacePayload;
    type Remote = Namespace;

    const KIND: &'static str = "namespace";
    const IMPORT_FIELDS: &'static [&'static str] = &["app_id", "id"];
    const READ_POLICY: ReadPolicy = ReadPolicy::ScanList;

    fn parent(state: &NamespaceState, _scope: Scope<'_>) -> Result<String> {
        app_parent(Self::KIND, state.app_id.as_deref())
    }

    fn id(state: &NamespaceState) -> Option<&str> {
        state.id.as_deref()
    }

    fn import_locator(fields: &ImportFields, _scope: Scope<'_>) -> Result<Locator> {
        app_scoped_locator(Self::KIND, fields)
    }

    fn to_remote(state: &NamespaceState) -> std::result::Result<NamespacePayload, ApiError> {
        Ok(NamespacePayload {
            id: state.id.clone(),
            authenticated: state.authenticated,
            persisted: state.persisted,
            persist_last: state.persist_last,
            push_enabled: state.push_enabled,
            tls_only: state.tls_only,
            expose_time_serial: state.expose_time_serial,
            batching_enabled: state.batching_enabled,
            batching_interval: state.batching_interval,
            conflation_enabled: state.conflation_enabled,
            conflation_interval: state.conflation_interval,
            conflation_key: state.conflation_key.clone(),
        })
    }

    fn from_remote(
        ns: Namespace,
        prior: Option<&NamespaceState>,
    ) -> std::result::Result<NamespaceState, ApiError> {
        // The response does not name the app.
        Ok(NamespaceState {
            id: Some(ns.id),
            app_id: prior.and_then(|p| p.app_id.clone()),
            authenticated: ns.authenticated,
            persisted: ns.persisted,
            persist_last: ns.persist_last,
            push_enabled: ns.push_enabled,
            tls_only: ns.tls_only,
            expose_time_serial: ns.expose_time_serial,
            batching_enabled: ns.batching_enabled,
            batching_interval: ns.batching_interval,
            conflation_enabled: ns.conflation_enabled,
            conflation_interval: ns.conflation_interval,
            conflation_key: ns.conflation_key,
        })
    }

    fn remote_id(ns: &Namespace) -> &str {
        &ns.id
    }

    fn adopt_parent(state: &mut NamespaceState, app_id: &str) {
        state.app_id.get_or_insert_with(|| app_id.to_string());
    }

    async fn create(
        api: &dyn ControlApi,
        app_id: &str,
        payload: &NamespacePayload,
    ) -> rtcontrol_api::Result<Namespace> {
        api.create_namespace(app_id, payload).await
    }

    async fn list(api: &dyn ControlApi, app_id: &str) -> rtcontrol_api::Result<Vec<Namespace>> {
        api.list_namespaces(app_id).await
    }

    async fn update(
        api: &dyn ControlApi,
        at: &Locator,
        payload: &NamespacePayload,
    ) -> rtcontrol_api::Result<Namespace> {
        // The id is immutable and only sent on create.
        let body = NamespacePayload {
            id: None,
            ..payload.clone()
        };
        api.update_namespace(&at.parent, &at.id, &body).await
    }

    async fn delete(api: &dyn ControlApi, at: &Locator) -> rtcontrol_api::Result<()> {
        api.delete_namespace(&at.parent, &at.id).await
    }
}
