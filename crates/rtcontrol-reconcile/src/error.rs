// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for rtcontrol-reconcile.

use std::fmt;

use rtcontrol_api::ApiError;
use thiserror::Error;

use crate::import::ImportError;

/// Result type using ReconcileError.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Lifecycle operation an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
        };
        f.write_str(s)
    }
}

/// Errors surfaced by the reconciliation engine.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Engine used before it was given a client, or required settings missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote call failed permanently or after exhausting retries.
    #[error("{operation} {kind} failed: {source}")]
    Remote {
        kind: &'static str,
        operation: Operation,
        #[source]
        source: ApiError,
    },

    /// Caller cancelled while a retry was pending.
    #[error("{operation} {kind} cancelled")]
    Cancelled {
        kind: &'static str,
        operation: Operation,
    },

    /// Deadline passed while a retry was pending.
    #[error("{operation} {kind} deadline exceeded")]
    DeadlineExceeded {
        kind: &'static str,
        operation: Operation,
    },

    /// The kind cannot be changed in place; it has to be replaced.
    #[error("update of {kind} is not supported; the resource must be replaced")]
    UpdateNotSupported { kind: &'static str },

    /// Malformed import identifier.
    #[error("invalid import identifier: {0}")]
    Import(#[from] ImportError),

    /// Prior state lacks what the operation needs (usually an identifier).
    #[error("invalid {kind} state: {message}")]
    InvalidState { kind: &'static str, message: String },
}

impl ReconcileError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        ReconcileError::Config(message.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(kind: &'static str, message: impl Into<String>) -> Self {
        ReconcileError::InvalidState {
            kind,
            message: message.into(),
        }
    }

    /// The underlying API error, if this is a remote failure.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ReconcileError::Remote { source, .. } => Some(source),
            _ => None,
        }
    }

    /// True when the caller gave up (cancellation or deadline) rather than the
    /// operation failing.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            ReconcileError::Cancelled { .. } | ReconcileError::DeadlineExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display_keeps_cause() {
        let err = ReconcileError::Remote {
            kind: "rule",
            operation: Operation::Create,
            source: ApiError::server(400, "invalid target"),
        };
        let display = err.to_string();
        assert!(display.contains("create rule failed"));
        assert!(display.contains("invalid target"));
        assert_eq!(err.api_error().and_then(|e| e.status()), Some(400));
    }

    #[test]
    fn test_cancellation_is_distinct() {
        let err = ReconcileError::Cancelled {
            kind: "app",
            operation: Operation::Read,
        };
        assert!(err.is_cancellation());
        assert!(err.api_error().is_none());
        assert_eq!(err.to_string(), "read app cancelled");
    }

    #[test]
    fn test_update_not_supported_display() {
        let err = ReconcileError::UpdateNotSupported { kind: "queue" };
        assert!(err.to_string().contains("must be replaced"));
    }
}
