// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The per-kind seam between the engine and the Control API.
//!
//! Each managed kind (app, namespace, key, queue, rule) implements
//! [`ResourceKind`]: how to translate its state to and from the wire, where it
//! lives, and which API calls perform each verb. The engine is generic over
//! this trait and owns retrying, not-found handling and logging.

use async_trait::async_trait;
use rtcontrol_api::{ApiError, ControlApi};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ReconcileError, Result};
use crate::import::ImportFields;

/// How absence of a remote object is detected on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Fetch the object directly; a 404 means absent.
    FetchById,
    /// Fetch the parent's full list and scan it; no match means absent.
    ScanList,
}

/// Whether a kind can be changed after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    InPlace,
    /// No update endpoint; changes need delete + create.
    RequiresReplace,
}

/// Result of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<S> {
    /// The object exists; this is its current state.
    Present(S),
    /// The object no longer exists remotely.
    Absent,
}

impl<S> Observation<S> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Observation::Absent)
    }

    pub fn into_option(self) -> Option<S> {
        match self {
            Observation::Present(state) => Some(state),
            Observation::Absent => None,
        }
    }
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    /// The object was already gone; nothing to do.
    AlreadyAbsent,
}

/// Where a remote object lives: its parent (account or app) and its own id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub parent: String,
    pub id: String,
}

/// Engine-wide context a kind may need to place an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
    /// Account resolved from the token, used as the parent of apps.
    pub account_id: Option<&'a str>,
}

/// Write-only fields: take what the server echoed, otherwise keep the prior value.
pub fn carry_forward<T: Clone>(echoed: Option<T>, prior: Option<&T>) -> Option<T> {
    echoed.or_else(|| prior.cloned())
}

/// A kind of remote object the engine can manage.
#[async_trait]
pub trait ResourceKind: Send + Sync + 'static {
    /// Desired and observed state; both have the same shape.
    type State: Clone + Send + Sync + Serialize + DeserializeOwned + 'static;
    /// Request body for create/update.
    type Payload: Send + Sync + 'static;
    /// Object as returned by the server.
    type Remote: Send + 'static;

    /// Name used in logs and errors.
    const KIND: &'static str;
    /// Ordered import identifier fields.
    const IMPORT_FIELDS: &'static [&'static str];
    const READ_POLICY: ReadPolicy;
    const UPDATE_POLICY: UpdatePolicy = UpdatePolicy::InPlace;

    /// Parent the object is created under.
    fn parent(state: &Self::State, scope: Scope<'_>) -> Result<String>;

    /// Server or user assigned id, if known.
    fn id(state: &Self::State) -> Option<&str>;

    /// Location of an existing object described by `state`.
    fn locate(state: &Self::State, scope: Scope<'_>) -> Result<Locator> {
        let parent = Self::parent(state, scope)?;
        let id = Self::id(state)
            .ok_or_else(|| ReconcileError::invalid_state(Self::KIND, "id is not known"))?;
        Ok(Locator {
            parent,
            id: id.to_string(),
        })
    }

    /// Location named by a parsed import identifier.
    fn import_locator(fields: &ImportFields, scope: Scope<'_>) -> Result<Locator>;

    /// Desired state to request body.
    fn to_remote(state: &Self::State) -> std::result::Result<Self::Payload, ApiError>;

    /// Server response to observed state. Write-only fields come from `prior`.
    fn from_remote(
        remote: Self::Remote,
        prior: Option<&Self::State>,
    ) -> std::result::Result<Self::State, ApiError>;

    fn remote_id(remote: &Self::Remote) -> &str;

    /// Fill in state the response leaves out but the location implies.
    fn adopt_parent(_state: &mut Self::State, _parent: &str) {}

    /// A listed object that no longer counts as existing (a revoked key).
    fn is_retired(_remote: &Self::Remote) -> bool {
        false
    }

    async fn create(
        api: &dyn ControlApi,
        parent: &str,
        payload: &Self::Payload,
    ) -> rtcontrol_api::Result<Self::Remote>;

    async fn list(api: &dyn ControlApi, parent: &str) -> rtcontrol_api::Result<Vec<Self::Remote>>;

    /// Fetch one object. Only called for [`ReadPolicy::FetchById`] kinds.
    async fn fetch(_api: &dyn ControlApi, _at: &Locator) -> rtcontrol_api::Result<Self::Remote> {
        Err(ApiError::Config(format!(
            "{} cannot be fetched by id",
            Self::KIND
        )))
    }

    /// Update in place. Only called for [`UpdatePolicy::InPlace`] kinds.
    async fn update(
        _api: &dyn ControlApi,
        _at: &Locator,
        _payload: &Self::Payload,
    ) -> rtcontrol_api::Result<Self::Remote> {
        Err(ApiError::Config(format!("{} cannot be updated", Self::KIND)))
    }

    async fn delete(api: &dyn ControlApi, at: &Locator) -> rtcontrol_api::Result<()>;
}

/// Locator for app-scoped kinds importing `"<app_id>,<id>"`.
pub(crate) fn app_scoped_locator(kind: &'static str, fields: &ImportFields) -> Result<Locator> {
    match (fields.get("app_id"), fields.get("id")) {
        (Some(app_id), Some(id)) => Ok(Locator {
            parent: app_id.to_string(),
            id: id.to_string(),
        }),
        _ => Err(ReconcileError::invalid_state(
            kind,
            "import identifier needs app_id and id",
        )),
    }
}

/// Parent of an app-scoped state.
pub(crate) fn app_parent(kind: &'static str, app_id: Option<&str>) -> Result<String> {
    app_id
        .map(str::to_string)
        .ok_or_else(|| ReconcileError::invalid_state(kind, "app_id is not set"))
}
