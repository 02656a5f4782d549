// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Transient/permanent classification of remote call failures.

use std::error::Error as StdError;
use std::io;

use rtcontrol_api::ApiError;

/// Whether a failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to go away on its own: network failures, 0, 429 and 5xx.
    Transient,
    /// Retrying will not help.
    Permanent,
}

impl ErrorClass {
    pub fn is_transient(self) -> bool {
        self == ErrorClass::Transient
    }
}

/// Errors that know their own retry class.
pub trait Classify {
    fn classify(&self) -> ErrorClass;
}

/// Classify a numeric remote status. 0 means no response was received.
pub fn classify_status(status: u16) -> ErrorClass {
    match status {
        0 | 429 | 500..=599 => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

impl Classify for ApiError {
    fn classify(&self) -> ErrorClass {
        match self {
            ApiError::Transport { .. } => ErrorClass::Transient,
            ApiError::Status { status, .. } => classify_status(*status),
            ApiError::Config(_)
            | ApiError::UnexpectedResponse(_)
            | ApiError::Serialization(_) => ErrorClass::Permanent,
        }
    }
}

impl Classify for io::Error {
    fn classify(&self) -> ErrorClass {
        match self.kind() {
            io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::Interrupted => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }
}

/// Classify an arbitrary error.
///
/// Walks the `source()` chain looking for a recognised shape ([`ApiError`] or
/// [`io::Error`]); the first one found decides. Unrecognised errors and `None`
/// are permanent.
pub fn classify_error(error: Option<&(dyn StdError + 'static)>) -> ErrorClass {
    let mut current = error;
    while let Some(err) = current {
        if let Some(api) = err.downcast_ref::<ApiError>() {
            return api.classify();
        }
        if let Some(io) = err.downcast_ref::<io::Error>() {
            return io.classify();
        }
        current = err.source();
    }
    ErrorClass::Permanent
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcontrol_api::TransportKind;

    #[test]
    fn test_transient_statuses() {
        for status in [0u16, 429, 500, 502, 503, 599] {
            assert_eq!(
                ApiError::server(status, "x").classify(),
                ErrorClass::Transient,
                "status {}",
                status
            );
        }
    }

    #[test]
    fn test_permanent_statuses() {
        for status in [400u16, 401, 403, 404, 409, 422, 600] {
            assert_eq!(
                ApiError::server(status, "x").classify(),
                ErrorClass::Permanent,
                "status {}",
                status
            );
        }
    }

    #[test]
    fn test_transport_errors_are_transient() {
        for kind in [
            TransportKind::Connect,
            TransportKind::Timeout,
            TransportKind::Reset,
            TransportKind::Other,
        ] {
            let err = ApiError::Transport {
                kind,
                message: "boom".to_string(),
            };
            assert!(err.classify().is_transient());
        }
    }

    #[test]
    fn test_unrecognized_api_shapes_are_permanent() {
        assert_eq!(
            ApiError::UnexpectedResponse("x".to_string()).classify(),
            ErrorClass::Permanent
        );
        assert_eq!(
            ApiError::Serialization("x".to_string()).classify(),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn test_absent_error_is_permanent() {
        assert_eq!(classify_error(None), ErrorClass::Permanent);
    }

    #[test]
    fn test_generic_error_is_permanent() {
        let err = std::fmt::Error;
        assert_eq!(classify_error(Some(&err)), ErrorClass::Permanent);
    }

    #[test]
    fn test_io_timeout_is_transient() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "deadline elapsed");
        assert_eq!(classify_error(Some(&err)), ErrorClass::Transient);
    }

    #[test]
    fn test_io_not_found_is_permanent() {
        let err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        assert_eq!(classify_error(Some(&err)), ErrorClass::Permanent);
    }

    #[test]
    fn test_chain_is_walked() {
        #[derive(Debug, thiserror::Error)]
        #[error("wrapped")]
        struct Wrapper(#[source] ApiError);

        let err = Wrapper(ApiError::server(503, "unavailable"));
        assert_eq!(classify_error(Some(&err)), ErrorClass::Transient);
    }
}
