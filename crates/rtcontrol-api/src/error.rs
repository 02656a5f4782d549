// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for rtcontrol-api.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Result type using ApiError.
pub type Result<T> = std::result::Result<T, ApiError>;

/// What went wrong below the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The connection could not be established.
    Connect,
    /// The request timed out.
    Timeout,
    /// The connection was reset or aborted mid-request.
    Reset,
    /// Any other failure while sending the request or reading the body.
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportKind::Connect => "connect",
            TransportKind::Timeout => "timeout",
            TransportKind::Reset => "reset",
            TransportKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Errors returned by the Control API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never produced an HTTP response.
    #[error("transport error ({kind}): {message}")]
    Transport { kind: TransportKind, message: String },

    /// Server returned an error response.
    #[error("server error [{status}]: {message}")]
    Status {
        /// HTTP status (or the `statusCode` reported in the error body).
        status: u16,
        /// Control API error code, when present.
        code: Option<u32>,
        message: String,
        /// Help link returned alongside the error.
        href: Option<String>,
    },

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Build a server error with just a status and message.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            code: None,
            message: message.into(),
            href: None,
        }
    }

    /// Build a 404 error for the given object.
    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::server(404, format!("{} not found", what.into()))
    }

    /// Numeric status of the failure.
    ///
    /// Transport failures report 0 (no response received). Errors that are not
    /// tied to a request outcome report `None`.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { .. } => Some(0),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 404-class errors.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_builder() {
            return ApiError::Config(message);
        }
        if err.is_decode() {
            return ApiError::UnexpectedResponse(message);
        }
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else if is_reset(&err) {
            TransportKind::Reset
        } else {
            TransportKind::Other
        };
        ApiError::Transport { kind, message }
    }
}

fn is_reset(err: &(dyn StdError + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            );
        }
        source = cause.source();
    }
    false
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::Config(format!("invalid url: {}", err))
    }
}
