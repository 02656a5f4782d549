// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Managed resource kinds.

mod app;
mod key;
mod namespace;
mod queue;
mod rule;

pub use app::{AppKind, AppState};
pub use key::{KeyKind, KeyState};
pub use namespace::{NamespaceKind, NamespaceState};
pub use queue::{QueueKind, QueueState};
pub use rule::{RuleKind, RuleState};
