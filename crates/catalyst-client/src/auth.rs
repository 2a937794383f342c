//! Access-token acquisition
//!
//! Every backend request needs a fresh bearer token. Providers hand one out
//! per call; the client-credentials provider caches its token until shortly
//! before expiry.

use async_trait::async_trait;
use catalyst_core::{AccessToken, ApiConfig, AuthConfig, Error, Result};
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Seconds shaved off `expires_in` before a cached token is refreshed
pub const DEFAULT_EXPIRY_LEEWAY: Duration = Duration::from_secs(60);

/// Source of bearer tokens for backend requests
#[async_trait]
pub trait TokenProvider: Send + Sync + fmt::Debug {
    /// Obtain a token valid for the next request
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when no token can be obtained. Callers must
    /// not issue the request in that case.
    async fn acquire_token(&self) -> Result<AccessToken>;
}

/// Provider that always returns the same pre-issued token
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Wrap a pre-issued token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn acquire_token(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    audience: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug)]
struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

/// OAuth2 client-credentials provider
///
/// Posts to `https://<domain>/oauth/token` and keeps the returned token until
/// `expires_in` minus the leeway has elapsed.
pub struct ClientCredentialsProvider {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    audience: Option<String>,
    leeway: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for ClientCredentialsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl ClientCredentialsProvider {
    /// Create a provider for an identity-provider domain
    ///
    /// A bare domain gets `https://` prepended; a full URL is used as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        domain: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        audience: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {e}")))?;

        let base = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", domain.trim_end_matches('/'))
        };

        Ok(Self {
            http,
            token_url: format!("{base}/oauth/token"),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            audience,
            leeway: DEFAULT_EXPIRY_LEEWAY,
            cached: Mutex::new(None),
        })
    }

    /// Override the expiry leeway
    #[must_use]
    pub const fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Token endpoint URL
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    fn cached_token(&self) -> Option<AccessToken> {
        let cached = self.cached.lock();
        cached
            .as_ref()
            .filter(|c| Instant::now() < c.expires_at)
            .map(|c| c.token.clone())
    }

    async fn fetch_token(&self) -> Result<TokenResponse> {
        let request = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            audience: self.audience.as_deref(),
        };

        let response = self
            .http
            .post(&self.token_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::auth(format!("Token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::auth(format!("Token response unreadable: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error_description")
                        .or_else(|| v.get("error"))
                        .and_then(Value::as_str)
                        .map(ToString::to_string)
                })
                .unwrap_or_else(|| format!("status {}", status.as_u16()));
            return Err(Error::auth(format!("Token request rejected: {detail}")));
        }

        serde_json::from_slice(&body)
            .map_err(|e| Error::auth(format!("Invalid token response: {e}")))
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn acquire_token(&self) -> Result<AccessToken> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        debug!(token_url = %self.token_url, "Requesting access token");
        let response = match self.fetch_token().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Access token acquisition failed");
                return Err(e);
            }
        };

        let token = AccessToken::new(response.access_token);

        if let Some(expires_in) = response.expires_in.map(Duration::from_secs) {
            if let Some(lifetime) = expires_in.checked_sub(self.leeway) {
                *self.cached.lock() = Some(CachedToken {
                    token: token.clone(),
                    expires_at: Instant::now() + lifetime,
                });
            }
        }

        Ok(token)
    }
}

/// Build the provider described by configuration
///
/// A pre-issued `auth.token` wins over client credentials.
///
/// # Errors
///
/// Returns [`Error::Auth`] if neither is configured.
pub fn provider_from_config(auth: &AuthConfig, api: &ApiConfig) -> Result<Arc<dyn TokenProvider>> {
    if let Some(token) = auth.token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(Arc::new(StaticTokenProvider::new(token)));
    }

    match (&auth.domain, &auth.client_id, &auth.client_secret) {
        (Some(domain), Some(client_id), Some(client_secret)) => {
            Ok(Arc::new(ClientCredentialsProvider::new(
                domain,
                client_id.clone(),
                client_secret.clone(),
                auth.audience.clone(),
                api.request_timeout(),
            )?))
        }
        _ => Err(Error::auth(
            "No credentials configured; set auth.token or \
             auth.domain, auth.client_id and auth.client_secret",
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> ClientCredentialsProvider {
        ClientCredentialsProvider::new(
            &server.uri(),
            "client-id",
            "client-secret",
            Some("https://catalyst/api".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_static_provider_returns_token() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.acquire_token().await.unwrap().as_str(), "abc");
    }

    #[test]
    fn test_bare_domain_gets_https() {
        let provider = ClientCredentialsProvider::new(
            "tenant.auth0.com/",
            "id",
            "secret",
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.token_url(), "https://tenant.auth0.com/oauth/token");
    }

    #[test]
    fn test_debug_hides_secret() {
        let provider = ClientCredentialsProvider::new(
            "tenant.auth0.com",
            "id",
            "super-secret",
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(!format!("{provider:?}").contains("super-secret"));
    }

    #[tokio::test]
    async fn test_client_credentials_token_is_cached() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_partial_json(json!({
                "grant_type": "client_credentials",
                "client_id": "client-id",
                "audience": "https://catalyst/api"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "issued",
                "token_type": "Bearer",
                "expires_in": 86400
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server);
        assert_eq!(provider.acquire_token().await.unwrap().as_str(), "issued");
        assert_eq!(provider.acquire_token().await.unwrap().as_str(), "issued");
    }

    #[tokio::test]
    async fn test_short_lived_token_is_not_cached() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "brief",
                "expires_in": 30
            })))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider(&server);
        provider.acquire_token().await.unwrap();
        provider.acquire_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "access_denied",
                "error_description": "Unauthorized"
            })))
            .mount(&server)
            .await;

        let err = provider(&server).acquire_token().await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "Authentication failed: Token request rejected: Unauthorized");
    }

    #[test]
    fn test_provider_from_config() {
        let api = ApiConfig::default();

        let none = provider_from_config(&AuthConfig::default(), &api);
        assert!(matches!(none, Err(Error::Auth(_))));

        let with_token = AuthConfig {
            token: Some("abc".to_string()),
            ..AuthConfig::default()
        };
        assert!(provider_from_config(&with_token, &api).is_ok());

        let with_credentials = AuthConfig {
            domain: Some("tenant.auth0.com".to_string()),
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            ..AuthConfig::default()
        };
        assert!(provider_from_config(&with_credentials, &api).is_ok());
    }
}
