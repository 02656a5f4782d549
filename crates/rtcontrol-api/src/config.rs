// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the Control API client.

use std::time::Duration;

use crate::error::{ApiError, Result};

/// Default Control API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://control.ably.net/v1";

/// Configuration for [`HttpControlApi`](crate::HttpControlApi).
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL of the Control API, without trailing slash.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: String,
    /// Account that owns the apps. Resolved through `/me` when unset.
    pub account_id: Option<String>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("account_id", &self.account_id)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            account_id: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    /// Create a configuration for the default endpoint with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RTCONTROL_TOKEN`: Control API access token (required)
    /// - `RTCONTROL_URL`: API base URL (default: "https://control.ably.net/v1")
    /// - `RTCONTROL_ACCOUNT_ID`: Account ID (default: resolved via `/me`)
    /// - `RTCONTROL_CONNECT_TIMEOUT_MS`: Connection timeout in milliseconds (default: 10000)
    /// - `RTCONTROL_REQUEST_TIMEOUT_MS`: Request timeout in milliseconds (default: 30000)
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("RTCONTROL_TOKEN")
            .map_err(|_| ApiError::Config("RTCONTROL_TOKEN is not set".to_string()))?;

        let base_url =
            std::env::var("RTCONTROL_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let account_id = std::env::var("RTCONTROL_ACCOUNT_ID")
            .ok()
            .filter(|v| !v.is_empty());

        let connect_timeout_ms: u64 = std::env::var("RTCONTROL_CONNECT_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .map_err(|e| ApiError::Config(format!("invalid RTCONTROL_CONNECT_TIMEOUT_MS: {}", e)))?;

        let request_timeout_ms: u64 = std::env::var("RTCONTROL_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse()
            .map_err(|e| ApiError::Config(format!("invalid RTCONTROL_REQUEST_TIMEOUT_MS: {}", e)))?;

        Ok(Self {
            base_url,
            token,
            account_id,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the account ID, skipping `/me` resolution.
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(ApiError::Config("access token is empty".to_string()));
        }
        url::Url::parse(&self.base_url)?;
        Ok(())
    }
}
