// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP implementation of [`ControlApi`].

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::api::ControlApi;
use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::types::{
    App, AppPayload, Key, KeyPayload, Me, Namespace, NamespacePayload, Queue, QueuePayload, Rule,
    RulePayload,
};

/// Error body returned by the Control API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    href: Option<String>,
}

/// Control API client over HTTPS.
///
/// Every method performs exactly one request. The client holds no mutable
/// state and can be shared behind an `Arc` by concurrent callers.
pub struct HttpControlApi {
    http: reqwest::Client,
    base_url: Url,
    config: ApiConfig,
}

impl HttpControlApi {
    /// Create a client with the given configuration.
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(concat!("rtcontrol/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ApiConfig::from_env()?)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Build the URL for the given path segments. Segments are percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Config("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        debug!(%method, %url, "Sending request");
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    /// Send a request and decode a JSON response.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = check_status(request.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::UnexpectedResponse(format!("invalid response body: {}", e)))
    }

    /// Send a request whose response body is ignored.
    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        check_status(request.send().await?).await?;
        Ok(())
    }
}

/// Turn non-2xx responses into [`ApiError::Status`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body: Option<ErrorBody> = serde_json::from_str(&text).ok();
    let (message, code, href) = match body {
        Some(body) => (
            body.message.unwrap_or_else(|| status.to_string()),
            body.code,
            body.href,
        ),
        None if text.is_empty() => (status.to_string(), None, None),
        None => (text, None, None),
    };

    Err(ApiError::Status {
        status: status.as_u16(),
        code,
        message,
        href,
    })
}

#[async_trait]
impl ControlApi for HttpControlApi {
    #[instrument(skip(self))]
    async fn me(&self) -> Result<Me> {
        self.send(self.request(Method::GET, &["me"])?).await
    }

    // =========================================================================
    // Apps
    // =========================================================================

    #[instrument(skip(self))]
    async fn list_apps(&self, account_id: &str) -> Result<Vec<App>> {
        self.send(self.request(Method::GET, &["accounts", account_id, "apps"])?)
            .await
    }

    #[instrument(skip(self, payload))]
    async fn create_app(&self, account_id: &str, payload: &AppPayload) -> Result<App> {
        let request = self.request(Method::POST, &["accounts", account_id, "apps"])?;
        self.send(request.json(payload)).await
    }

    #[instrument(skip(self, payload))]
    async fn update_app(&self, app_id: &str, payload: &AppPayload) -> Result<App> {
        let request = self.request(Method::PATCH, &["apps", app_id])?;
        self.send(request.json(payload)).await
    }

    #[instrument(skip(self))]
    async fn delete_app(&self, app_id: &str) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, &["apps", app_id])?)
            .await
    }

    // =========================================================================
    // Namespaces
    // =========================================================================

    #[instrument(skip(self))]
    async fn list_namespaces(&self, app_id: &str) -> Result<Vec<Namespace>> {
        self.send(self.request(Method::GET, &["apps", app_id, "namespaces"])?)
            .await
    }

    #[instrument(skip(self, payload))]
    async fn create_namespace(
        &self,
        app_id: &str,
        payload: &NamespacePayload,
    ) -> Result<Namespace> {
        let request = self.request(Method::POST, &["apps", app_id, "namespaces"])?;
        self.send(request.json(payload)).await
    }

    #[instrument(skip(self, payload))]
    async fn update_namespace(
        &self,
        app_id: &str,
        namespace_id: &str,
        payload: &NamespacePayload,
    ) -> Result<Namespace> {
        let request =
            self.request(Method::PATCH, &["apps", app_id, "namespaces", namespace_id])?;
        self.send(request.json(payload)).await
    }

    #[instrument(skip(self))]
    async fn delete_namespace(&self, app_id: &str, namespace_id: &str) -> Result<()> {
        let request =
            self.request(Method::DELETE, &["apps", app_id, "namespaces", namespace_id])?;
        self.send_empty(request).await
    }

    // =========================================================================
    // Keys
    // =========================================================================

    #[instrument(skip(self))]
    async fn list_keys(&self, app_id: &str) -> Result<Vec<Key>> {
        self.send(self.request(Method::GET, &["apps", app_id, "keys"])?)
            .await
    }

    #[instrument(skip(self, payload))]
    async fn create_key(&self, app_id: &str, payload: &KeyPayload) -> Result<Key> {
        let request = self.request(Method::POST, &["apps", app_id, "keys"])?;
        self.send(request.json(payload)).await
    }

    #[instrument(skip(self, payload))]
    async fn update_key(&self, app_id: &str, key_id: &str, payload: &KeyPayload) -> Result<Key> {
        let request = self.request(Method::PATCH, &["apps", app_id, "keys", key_id])?;
        self.send(request.json(payload)).await
    }

    #[instrument(skip(self))]
    async fn revoke_key(&self, app_id: &str, key_id: &str) -> Result<()> {
        let request = self.request(Method::POST, &["apps", app_id, "keys", key_id, "revoke"])?;
        self.send_empty(request).await
    }

    // =========================================================================
    // Queues
    // =========================================================================

    #[instrument(skip(self))]
    async fn list_queues(&self, app_id: &str) -> Result<Vec<Queue>> {
        self.send(self.request(Method::GET, &["apps", app_id, "queues"])?)
            .await
    }

    #[instrument(skip(self, payload))]
    async fn create_queue(&self, app_id: &str, payload: &QueuePayload) -> Result<Queue> {
        let request = self.request(Method::POST, &["apps", app_id, "queues"])?;
        self.send(request.json(payload)).await
    }

    #[instrument(skip(self))]
    async fn delete_queue(&self, app_id: &str, queue_id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &["apps", app_id, "queues", queue_id])?;
        self.send_empty(request).await
    }

    // =========================================================================
    // Rules
    // =========================================================================

    #[instrument(skip(self))]
    async fn list_rules(&self, app_id: &str) -> Result<Vec<Rule>> {
        self.send(self.request(Method::GET, &["apps", app_id, "rules"])?)
            .await
    }

    #[instrument(skip(self))]
    async fn get_rule(&self, app_id: &str, rule_id: &str) -> Result<Rule> {
        self.send(self.request(Method::GET, &["apps", app_id, "rules", rule_id])?)
            .await
    }

    #[instrument(skip(self, payload), fields(rule_type = %payload.rule_type))]
    async fn create_rule(&self, app_id: &str, payload: &RulePayload) -> Result<Rule> {
        let request = self.request(Method::POST, &["apps", app_id, "rules"])?;
        self.send(request.json(payload)).await
    }

    #[instrument(skip(self, payload), fields(rule_type = %payload.rule_type))]
    async fn update_rule(
        &self,
        app_id: &str,
        rule_id: &str,
        payload: &RulePayload,
    ) -> Result<Rule> {
        let request = self.request(Method::PATCH, &["apps", app_id, "rules", rule_id])?;
        self.send(request.json(payload)).await
    }

    #[instrument(skip(self))]
    async fn delete_rule(&self, app_id: &str, rule_id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &["apps", app_id, "rules", rule_id])?;
        self.send_empty(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpControlApi {
        HttpControlApi::new(ApiConfig::new("tok").with_base_url(base)).unwrap()
    }

    #[test]
    fn test_url_joins_segments() {
        let api = client("https://control.example.com/v1");
        let url = api.url(&["apps", "app1", "rules"]).unwrap();
        assert_eq!(url.as_str(), "https://control.example.com/v1/apps/app1/rules");
    }

    #[test]
    fn test_url_tolerates_trailing_slash() {
        let api = client("https://control.example.com/v1/");
        let url = api.url(&["me"]).unwrap();
        assert_eq!(url.as_str(), "https://control.example.com/v1/me");
    }

    #[test]
    fn test_url_encodes_segments() {
        let api = client("https://control.example.com/v1");
        let url = api.url(&["apps", "a b", "namespaces", "x/y"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://control.example.com/v1/apps/a%20b/namespaces/x%2Fy"
        );
    }

    #[test]
    fn test_new_rejects_empty_token() {
        let result = HttpControlApi::new(ApiConfig::new(""));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }
}
