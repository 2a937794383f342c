//! HTTP client for communicating with the catalyst backend API
//!
//! The single choke point for backend calls. It attaches the bearer token,
//! serialises JSON bodies, parses JSON responses and turns non-2xx statuses
//! into [`Error::HttpStatus`]. It never retries, caches or deduplicates.

use catalyst_core::{AccessToken, ApiConfig, Error, Result};
use reqwest::{Client, Method, StatusCode, header::AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, error};

/// API client for making HTTP requests to the backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl ApiClient {
    /// Create a new API client with default timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(&ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        })
    }

    /// Create a new API client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.request_timeout.saturating_mul(1000),
        })
    }

    /// Base URL every path is appended to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a request path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// `GET` a path
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, path: &str, token: &AccessToken) -> Result<Option<Value>> {
        self.request(Method::GET, path, token, None).await
    }

    /// `POST` a path, with an optional JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post(
        &self,
        path: &str,
        token: &AccessToken,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        self.request(Method::POST, path, token, body).await
    }

    /// `PATCH` a path, with an optional JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch(
        &self,
        path: &str,
        token: &AccessToken,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        self.request(Method::PATCH, path, token, body).await
    }

    /// `DELETE` a path
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str, token: &AccessToken) -> Result<Option<Value>> {
        self.request(Method::DELETE, path, token, None).await
    }

    /// Issue a request and parse its response
    ///
    /// Returns `Ok(None)` for `204 No Content` (the body is never read) and
    /// for a literal JSON `null`.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if the backend cannot be reached
    /// - [`Error::Timeout`] if the configured request timeout elapses
    /// - [`Error::HttpStatus`] for any non-2xx status, carrying the body's
    ///   `message` or `HTTP error: status <code>`
    /// - [`Error::Parse`] if a success body is not valid JSON
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: &AccessToken,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let result = self.send(method.clone(), path, token, body).await;

        if let Err(ref e) = result {
            error!(method = %method, path, error = %e, "API request failed");
        }

        result
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: &AccessToken,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let url = self.url(path);
        debug!(method = %method, %url, has_body = body.is_some(), "Sending API request");

        let mut request = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, token.bearer());

        // `json` also sets `Content-Type: application/json`
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.map_reqwest(&e))?;
        let status = response.status();

        if !status.is_success() {
            let bytes = response.bytes().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), error_message(status, &bytes)));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = response.bytes().await.map_err(|e| self.map_reqwest(&e))?;
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    fn map_reqwest(&self, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                duration_ms: self.timeout_ms,
            }
        } else {
            Error::transport(err.to_string())
        }
    }
}

/// Human-readable message for a failed response
///
/// Uses the body's `message` member when the body is a JSON object carrying a
/// non-empty string there; otherwise the generic status fallback.
#[must_use]
pub fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| format!("HTTP error: status {}", status.as_u16()))
}
