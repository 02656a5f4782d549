// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Integration rules. The only kind read by id: a 404 on fetch means the rule
//! is gone.

use async_trait::async_trait;
use rtcontrol_api::{
    ApiError, ControlApi, RequestMode, Rule, RulePayload, RuleSource, RuleStatus,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::import::ImportFields;
use crate::resource::{
    Locator, ReadPolicy, ResourceKind, Scope, app_parent, app_scoped_locator,
};
use crate::targets::{self, Target};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default)]
    pub request_mode: RequestMode,
    /// Channel events that trigger the rule. Ingress rules have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RuleSource>,
    pub target: Target,
}

pub struct RuleKind;

#[async_trait]
impl ResourceKind for RuleKind {
    type State = RuleState;
    type Payload = RulePayload;
    type Remote = Rule;

    const KIND: &'static str = "rule";
    const IMPORT_FIELDS: &'static [&'static str] = &["app_id", "id"];
    const READ_POLICY: ReadPolicy = ReadPolicy::FetchById;

    fn parent(state: &RuleState, _scope: Scope<'_>) -> Result<String> {
        app_parent(Self::KIND, state.app_id.as_deref())
    }

    fn id(state: &RuleState) -> Option<&str> {
        state.id.as_deref()
    }

    fn import_locator(fields: &ImportFields, _scope: Scope<'_>) -> Result<Locator> {
        app_scoped_locator(Self::KIND, fields)
    }

    fn to_remote(state: &RuleState) -> std::result::Result<RulePayload, ApiError> {
        let target = targets::to_remote(&state.target);
        debug!(rule_type = target.rule_type(), target = ?target.redacted(), "Encoded rule target");
        RulePayload::new(
            state.status,
            state.request_mode,
            state.source.clone(),
            &target,
        )
    }

    fn from_remote(
        rule: Rule,
        prior: Option<&RuleState>,
    ) -> std::result::Result<RuleState, ApiError> {
        let remote_target = rule.typed_target()?;
        Ok(RuleState {
            id: Some(rule.id),
            app_id: Some(rule.app_id),
            status: rule.status,
            request_mode: rule.request_mode,
            source: rule.source,
            target: targets::from_remote(remote_target, prior.map(|p| &p.target)),
        })
    }

    fn remote_id(rule: &Rule) -> &str {
        &rule.id
    }

    async fn create(
        api: &dyn ControlApi,
        app_id: &str,
        payload: &RulePayload,
    ) -> rtcontrol_api::Result<Rule> {
        api.create_rule(app_id, payload).await
    }

    async fn list(api: &dyn ControlApi, app_id: &str) -> rtcontrol_api::Result<Vec<Rule>> {
        api.list_rules(app_id).await
    }

    async fn fetch(api: &dyn ControlApi, at: &Locator) -> rtcontrol_api::Result<Rule> {
        api.get_rule(&at.parent, &at.id).await
    }

    async fn update(
        api: &dyn ControlApi,
        at: &Locator,
        payload: &RulePayload,
    ) -> rtcontrol_api::Result<Rule> {
        api.update_rule(&at.parent, &at.id, payload).await
    }

    async fn delete(api: &dyn ControlApi, at: &Locator) -> rtcontrol_api::Result<()> {
        api.delete_rule(&at.parent, &at.id).await
    }
}
