// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Create/read/update/delete/import lifecycle over any [`ResourceKind`].

use std::future::Future;
use std::sync::Arc;

use rtcontrol_api::{ApiError, ControlApi};
use tracing::{info, instrument, warn};

use crate::error::{Operation, ReconcileError, Result};
use crate::import;
use crate::resource::{
    Deletion, Locator, Observation, ReadPolicy, ResourceKind, Scope, UpdatePolicy,
};
use crate::retry::{self, RetryContext, RetryError, RetryPolicy};

/// Reconciles desired state against the Control API.
///
/// Holds the injected client, the retry policy and the account the token
/// belongs to. Immutable once built; share it freely across tasks.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use rtcontrol_api::HttpControlApi;
/// use rtcontrol_reconcile::{Engine, RetryContext, RetryPolicy};
/// use rtcontrol_reconcile::resources::{AppKind, AppState};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = Arc::new(HttpControlApi::from_env()?);
/// let ctx = RetryContext::new();
/// let engine = Engine::connect(api, RetryPolicy::default(), &ctx).await?;
///
/// let desired = AppState { name: "demo".to_string(), ..AppState::default() };
/// let observed = engine.create::<AppKind>(&ctx, &desired).await?;
/// println!("created app {:?}", observed.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Engine {
    api: Option<Arc<dyn ControlApi>>,
    policy: RetryPolicy,
    account_id: Option<String>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("configured", &self.api.is_some())
            .field("policy", &self.policy)
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::unconfigured()
    }
}

impl Engine {
    /// Engine with a client and a known account.
    pub fn new(api: Arc<dyn ControlApi>, account_id: Option<String>, policy: RetryPolicy) -> Self {
        Self {
            api: Some(api),
            policy,
            account_id,
        }
    }

    /// Engine without a client. Every operation fails with a configuration
    /// error.
    pub fn unconfigured() -> Self {
        Self {
            api: None,
            policy: RetryPolicy::default(),
            account_id: None,
        }
    }

    /// Build an engine, resolving the token's account through `GET /me`.
    pub async fn connect(
        api: Arc<dyn ControlApi>,
        policy: RetryPolicy,
        ctx: &RetryContext,
    ) -> Result<Self> {
        let me = retry::execute(&policy, ctx, || api.me())
            .await
            .map_err(|e| map_retry_error("account", Operation::Read, e))?;
        info!(account_id = %me.account.id, "Resolved account");
        Ok(Self::new(api, Some(me.account.id), policy))
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api.is_some()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn api(&self) -> Result<&dyn ControlApi> {
        self.api
            .as_deref()
            .ok_or_else(|| ReconcileError::config("engine has no Control API client configured"))
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            account_id: self.account_id.as_deref(),
        }
    }

    /// Run one remote call through the retry executor.
    async fn call<K, T, F, Fut>(&self, ctx: &RetryContext, operation: Operation, f: F) -> Result<T>
    where
        K: ResourceKind,
        F: FnMut() -> Fut,
        Fut: Future<Output = rtcontrol_api::Result<T>>,
    {
        retry::execute(&self.policy, ctx, f)
            .await
            .map_err(|e| map_retry_error(K::KIND, operation, e))
    }

    /// Create the object described by `desired` and return its observed state.
    #[instrument(skip_all, fields(kind = K::KIND))]
    pub async fn create<K: ResourceKind>(
        &self,
        ctx: &RetryContext,
        desired: &K::State,
    ) -> Result<K::State> {
        let api = self.api()?;
        let parent = K::parent(desired, self.scope())?;
        let payload = K::to_remote(desired).map_err(remote_failure::<K>(Operation::Create))?;

        info!(%parent, "Creating {}", K::KIND);
        let created = self
            .call::<K, _, _, _>(ctx, Operation::Create, || K::create(api, &parent, &payload))
            .await?;
        info!(id = K::remote_id(&created), "Created {}", K::KIND);

        K::from_remote(created, Some(desired)).map_err(remote_failure::<K>(Operation::Create))
    }

    /// Refresh `prior` from the server.
    #[instrument(skip_all, fields(kind = K::KIND))]
    pub async fn read<K: ResourceKind>(
        &self,
        ctx: &RetryContext,
        prior: &K::State,
    ) -> Result<Observation<K::State>> {
        let api = self.api()?;
        let at = K::locate(prior, self.scope())?;
        self.read_at::<K>(api, ctx, &at, Some(prior), Operation::Read)
            .await
    }

    async fn read_at<K: ResourceKind>(
        &self,
        api: &dyn ControlApi,
        ctx: &RetryContext,
        at: &Locator,
        prior: Option<&K::State>,
        operation: Operation,
    ) -> Result<Observation<K::State>> {
        let found = match K::READ_POLICY {
            ReadPolicy::FetchById => {
                match self
                    .call::<K, _, _, _>(ctx, operation, || K::fetch(api, at))
                    .await
                {
                    Ok(remote) => Some(remote),
                    Err(ReconcileError::Remote { source, .. }) if source.is_not_found() => None,
                    Err(e) => return Err(e),
                }
            }
            ReadPolicy::ScanList => self
                .call::<K, _, _, _>(ctx, operation, || K::list(api, &at.parent))
                .await?
                .into_iter()
                .find(|remote| K::remote_id(remote) == at.id),
        };

        match found {
            Some(remote) if K::is_retired(&remote) => {
                warn!(id = %at.id, parent = %at.parent, "{} is retired remotely", K::KIND);
                Ok(Observation::Absent)
            }
            Some(remote) => {
                let mut state =
                    K::from_remote(remote, prior).map_err(remote_failure::<K>(operation))?;
                K::adopt_parent(&mut state, &at.parent);
                Ok(Observation::Present(state))
            }
            None => {
                warn!(id = %at.id, parent = %at.parent, "{} not found remotely", K::KIND);
                Ok(Observation::Absent)
            }
        }
    }

    /// Apply `desired` to the object recorded in `prior`.
    #[instrument(skip_all, fields(kind = K::KIND))]
    pub async fn update<K: ResourceKind>(
        &self,
        ctx: &RetryContext,
        prior: &K::State,
        desired: &K::State,
    ) -> Result<K::State> {
        if K::UPDATE_POLICY == UpdatePolicy::RequiresReplace {
            return Err(ReconcileError::UpdateNotSupported { kind: K::KIND });
        }

        let api = self.api()?;
        let at = K::locate(prior, self.scope())?;
        let payload = K::to_remote(desired).map_err(remote_failure::<K>(Operation::Update))?;

        info!(id = %at.id, "Updating {}", K::KIND);
        let updated = self
            .call::<K, _, _, _>(ctx, Operation::Update, || K::update(api, &at, &payload))
            .await?;

        K::from_remote(updated, Some(desired)).map_err(remote_failure::<K>(Operation::Update))
    }

    /// Delete the object recorded in `prior`. Already gone is success.
    #[instrument(skip_all, fields(kind = K::KIND))]
    pub async fn delete<K: ResourceKind>(
        &self,
        ctx: &RetryContext,
        prior: &K::State,
    ) -> Result<Deletion> {
        let api = self.api()?;
        let at = K::locate(prior, self.scope())?;

        info!(id = %at.id, "Deleting {}", K::KIND);
        match self
            .call::<K, _, _, _>(ctx, Operation::Delete, || K::delete(api, &at))
            .await
        {
            Ok(()) => Ok(Deletion::Deleted),
            Err(ReconcileError::Remote { source, .. }) if source.is_not_found() => {
                warn!(id = %at.id, "{} already deleted", K::KIND);
                Ok(Deletion::AlreadyAbsent)
            }
            Err(e) => Err(e),
        }
    }

    /// Attach to an existing object named by a composite identifier.
    #[instrument(skip_all, fields(kind = K::KIND, identifier = %identifier))]
    pub async fn import<K: ResourceKind>(
        &self,
        ctx: &RetryContext,
        identifier: &str,
    ) -> Result<Observation<K::State>> {
        let fields = import::parse(identifier, K::IMPORT_FIELDS)?;
        let api = self.api()?;
        let at = K::import_locator(&fields, self.scope())?;

        info!(id = %at.id, parent = %at.parent, "Importing {}", K::KIND);
        self.read_at::<K>(api, ctx, &at, None, Operation::Import)
            .await
    }
}

fn map_retry_error(
    kind: &'static str,
    operation: Operation,
    err: RetryError<ApiError>,
) -> ReconcileError {
    match err {
        RetryError::Operation(source) => ReconcileError::Remote {
            kind,
            operation,
            source,
        },
        RetryError::Cancelled => ReconcileError::Cancelled { kind, operation },
        RetryError::DeadlineExceeded => ReconcileError::DeadlineExceeded { kind, operation },
    }
}

fn remote_failure<K: ResourceKind>(
    operation: Operation,
) -> impl FnOnce(ApiError) -> ReconcileError {
    move |source| ReconcileError::Remote {
        kind: K::KIND,
        operation,
        source,
    }
}
