// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Apps, scoped to the account that owns the token.

use async_trait::async_trait;
use rtcontrol_api::{ApiError, App, AppPayload, AppStatus, ControlApi};
use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};
use crate::import::ImportFields;
use crate::resource::{Locator, ReadPolicy, ResourceKind, Scope, carry_forward};

/// Desired or observed app.
///
/// Push credentials are write-only; after a read they hold whatever was last
/// written.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub id: Option<String>,
    /// Owning account; falls back to the engine's account when unset.
    pub account_id: Option<String>,
    pub name: String,
    pub status: AppStatus,
    pub tls_only: bool,
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
    pub apns_use_sandbox_endpoint: bool,
}

pub struct AppKind;

#[async_trait]
impl ResourceKind for AppKind {
    type State = AppState;
    type Payload = AppPayload;
    type Remote = App;

    const KIND: &'static str = "app";
    const IMPORT_FIELDS: &'static [&'static str] = &["id"];
    const READ_POLICY: ReadPolicy = ReadPolicy::ScanList;

    fn parent(state: &AppState, scope: Scope<'_>) -> Result<String> {
        state
            .account_id
            .as_deref()
            .or(scope.account_id)
            .map(str::to_string)
            .ok_or_else(|| ReconcileError::config("account id is not known"))
    }

    fn id(state: &AppState) -> Option<&str> {
        state.id.as_deref()
    }

    fn import_locator(fields: &ImportFields, scope: Scope<'_>) -> Result<Locator> {
        let id = fields
            .get("id")
            .ok_or_else(|| ReconcileError::invalid_state(Self::KIND, "import needs an id"))?;
        let parent = scope
            .account_id
            .ok_or_else(|| ReconcileError::config("account id is not known"))?;
        Ok(Locator {
            parent: parent.to_string(),
            id: id.to_string(),
        })
    }

    fn to_remote(state: &AppState) -> std::result::Result<AppPayload, ApiError> {
        Ok(AppPayload {
            name: Some(state.name.clone()),
            status: Some(state.status),
            tls_only: Some(state.tls_only),
            fcm_key: state.fcm_key.clone(),
            fcm_service_account: state.fcm_service_account.clone(),
            fcm_project_id: state.fcm_project_id.clone(),
            apns_certificate: state.apns_certificate.clone(),
            apns_private_key: state.apns_private_key.clone(),
            apns_use_sandbox_endpoint: Some(state.apns_use_sandbox_endpoint),
        })
    }

    fn from_remote(app: App, prior: Option<&AppState>) -> std::result::Result<AppState, ApiError> {
        Ok(AppState {
            id: Some(app.id),
            account_id: Some(app.account_id),
            name: app.name,
            status: app.status,
            tls_only: app.tls_only,
            fcm_key: carry_forward(app.fcm_key, prior.and_then(|p| p.fcm_key.as_ref())),
            fcm_service_account: carry_forward(
                app.fcm_service_account,
                prior.and_then(|p| p.fcm_service_account.as_ref()),
            ),
            fcm_project_id: app.fcm_project_id,
            apns_certificate: carry_forward(
                app.apns_certificate,
                prior.and_then(|p| p.apns_certificate.as_ref()),
            ),
            apns_private_key: carry_forward(
                app.apns_private_key,
                prior.and_then(|p| p.apns_private_key.as_ref()),
            ),
            apns_use_sandbox_endpoint: app.apns_use_sandbox_endpoint,
        })
    }

    fn remote_id(app: &App) -> &str {
        &app.id
    }

    async fn create(
        api: &dyn ControlApi,
        account_id: &str,
        payload: &AppPayload,
    ) -> rtcontrol_api::Result<App> {
        api.create_app(account_id, payload).await
    }

    async fn list(api: &dyn ControlApi, account_id: &str) -> rtcontrol_api::Result<Vec<App>> {
        api.list_apps(account_id).await
    }

    async fn update(
        api: &dyn ControlApi,
        at: &Locator,
        payload: &AppPayload,
    ) -> rtcontrol_api::Result<App> {
        api.update_app(&at.id, payload).await
    }

    async fn delete(api: &dyn ControlApi, at: &Locator) -> rtcontrol_api::Result<()> {
        api.delete_app(&at.id).await
    }
}
