// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Queues. There is no update endpoint; any change means replacing the queue.

use async_trait::async_trait;
use rtcontrol_api::{ApiError, ControlApi, Queue, QueueAmqp, QueuePayload, QueueStomp};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::import::ImportFields;
use crate::resource::{
    Locator, ReadPolicy, ResourceKind, Scope, UpdatePolicy, app_parent, app_scoped_locator,
};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueState {
    pub id: Option<String>,
    pub app_id: Option<String>,
    pub name: String,
    /// Message TTL in minutes.
    pub ttl: u32,
    pub max_length: u32,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amqp: Option<QueueAmqp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stomp: Option<QueueStomp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

pub struct QueueKind;

#[async_trait]
impl ResourceKind for QueueKind {
    type State = QueueState;
    type Payload = QueuePayload;
    type Remote = Queue;

    const KIND: &'static str = "queue";
    const IMPORT_FIELDS: &'static [&'static str] = &["app_id", "id"];
    const READ_POLICY: ReadPolicy = ReadPolicy::ScanList;
    const UPDATE_POLICY: UpdatePolicy = UpdatePolicy::RequiresReplace;

    fn parent(state: &QueueState, _scope: Scope<'_>) -> Result<String> {
        app_parent(Self::KIND, state.app_id.as_deref())
    }

    fn id(state: &QueueState) -> Option<&str> {
        state.id.as_deref()
    }

    fn import_locator(fields: &ImportFields, _scope: Scope<'_>) -> Result<Locator> {
        app_scoped_locator(Self::KIND, fields)
    }

    fn to_remote(state: &QueueState) -> std::result::Result<QueuePayload, ApiError> {
        Ok(QueuePayload {
            name: state.name.clone(),
            ttl: state.ttl,
            max_length: state.max_length,
            region: state.region.clone(),
        })
    }

    fn from_remote(
        queue: Queue,
        _prior: Option<&QueueState>,
    ) -> std::result::Result<QueueState, ApiError> {
        Ok(QueueState {
            id: Some(queue.id),
            app_id: Some(queue.app_id),
            name: queue.name,
            ttl: queue.ttl,
            max_length: queue.max_length,
            region: queue.region,
            amqp: queue.amqp,
            stomp: queue.stomp,
            state: queue.state,
        })
    }

    fn remote_id(queue: &Queue) -> &str {
        &queue.id
    }

    async fn create(
        api: &dyn ControlApi,
        app_id: &str,
        payload: &QueuePayload,
    ) -> rtcontrol_api::Result<Queue> {
        api.create_queue(app_id, payload).await
    }

    async fn list(api: &dyn ControlApi, app_id: &str) -> rtcontrol_api::Result<Vec<Queue>> {
        api.list_queues(app_id).await
    }

    async fn delete(api: &dyn ControlApi, at: &Locator) -> rtcontrol_api::Result<()> {
        api.delete_queue(&at.parent, &at.id).await
    }
}
