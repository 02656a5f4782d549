// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! API keys. Deleting a key revokes it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rtcontrol_api::{ApiError, ControlApi, Key, KeyPayload, KeyStatus};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::import::ImportFields;
use crate::resource::{
    Locator, ReadPolicy, ResourceKind, Scope, app_parent, app_scoped_locator,
};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyState {
    pub id: Option<String>,
    pub app_id: Option<String>,
    pub name: String,
    /// Resource name to allowed operations.
    pub capability: BTreeMap<String, Vec<String>>,
    pub revocable_tokens: bool,
    /// Server assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<KeyStatus>,
    /// Server issued secret (`appId.keyId:secret`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

pub struct KeyKind;

#[async_trait]
impl ResourceKind for KeyKind {
    type State = KeyState;
    type Payload = KeyPayload;
    type Remote = Key;

    const KIND: &'static str = "key";
    const IMPORT_FIELDS: &'static [&'static str] = &["app_id", "id"];
    const READ_POLICY: ReadPolicy = ReadPolicy::ScanList;

    fn parent(state: &KeyState, _scope: Scope<'_>) -> Result<String> {
        app_parent(Self::KIND, state.app_id.as_deref())
    }

    fn id(state: &KeyState) -> Option<&str> {
        state.id.as_deref()
    }

    fn import_locator(fields: &ImportFields, _scope: Scope<'_>) -> Result<Locator> {
        app_scoped_locator(Self::KIND, fields)
    }

    fn to_remote(state: &KeyState) -> std::result::Result<KeyPayload, ApiError> {
        Ok(KeyPayload {
            name: state.name.clone(),
            capability: state.capability.clone(),
            revocable_tokens: Some(state.revocable_tokens),
        })
    }

    fn from_remote(key: Key, _prior: Option<&KeyState>) -> std::result::Result<KeyState, ApiError> {
        let status = key.key_status();
        Ok(KeyState {
            id: Some(key.id),
            app_id: Some(key.app_id),
            name: key.name,
            capability: key.capability,
            revocable_tokens: key.revocable_tokens,
            status: Some(status),
            key: Some(key.key),
            created: key.created,
            modified: key.modified,
        })
    }

    fn remote_id(key: &Key) -> &str {
        &key.id
    }

    /// Revoked keys stay listed.
    fn is_retired(key: &Key) -> bool {
        key.key_status() == KeyStatus::Revoked
    }

    async fn create(
        api: &dyn ControlApi,
        app_id: &str,
        payload: &KeyPayload,
    ) -> rtcontrol_api::Result<Key> {
        api.create_key(app_id, payload).await
    }

    async fn list(api: &dyn ControlApi, app_id: &str) -> rtcontrol_api::Result<Vec<Key>> {
        api.list_keys(app_id).await
    }

    async fn update(
        api: &dyn ControlApi,
        at: &Locator,
        payload: &KeyPayload,
    ) -> rtcontrol_api::Result<Key> {
        api.update_key(&at.parent, &at.id, payload).await
    }

    async fn delete(api: &dyn ControlApi, at: &Locator) -> rtcontrol_api::Result<()> {
        api.revoke_key(&at.parent, &at.id).await
    }
}
