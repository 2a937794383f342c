//! Integration tests for token acquisition and record access together

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use catalyst_client::{ApiClient, ClientCredentialsProvider, RecordApi, TokenProvider};
use catalyst_core::{FieldChanges, ResourceDescriptor, Result};
use serde_json::json;
use std::sync::Once;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT_LOGGER: Once = Once::new();

fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "issued-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Every request carries the token issued by the identity provider, which is
/// fetched once and reused
#[tokio::test]
async fn test_issued_token_is_attached_to_requests() -> Result<()> {
    init_test_logging();

    let idp = MockServer::start().await;
    let backend = MockServer::start().await;
    mount_token_endpoint(&idp).await;

    Mock::given(method("GET"))
        .and(path("/api/insurance/claims"))
        .and(header("authorization", "Bearer issued-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "claim_id": "CLM-0001", "business_status": "Submitted"}
        ])))
        .expect(1)
        .mount(&backend)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/insurance/claims/1"))
        .and(header("authorization", "Bearer issued-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend)
        .await;

    let provider = ClientCredentialsProvider::new(
        &idp.uri(),
        "client-id",
        "client-secret",
        None,
        Duration::from_secs(5),
    )?;
    let api = RecordApi::new(ApiClient::new(backend.uri())?, ResourceDescriptor::claims());

    let token = provider.acquire_token().await?;
    let records = api.list(&token).await?;
    assert_eq!(records.len(), 1);

    let mut changes = FieldChanges::new();
    changes.insert("business_status".to_string(), json!("Approved"));
    let token = provider.acquire_token().await?;
    assert!(api.update(&token, 1, &changes).await?.is_none());

    Ok(())
}

/// A rejected token request never reaches the backend
#[tokio::test]
async fn test_failed_token_acquisition_sends_nothing() -> Result<()> {
    init_test_logging();

    let idp = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "access_denied"})))
        .mount(&idp)
        .await;

    let provider = ClientCredentialsProvider::new(
        &idp.uri(),
        "client-id",
        "wrong-secret",
        None,
        Duration::from_secs(5),
    )?;
    let api = RecordApi::new(ApiClient::new(backend.uri())?, ResourceDescriptor::claims());

    let outcome = match provider.acquire_token().await {
        Ok(token) => api.list(&token).await.map(|_| ()),
        Err(e) => Err(e),
    };

    let err = outcome.expect_err("token acquisition should fail");
    assert!(err.is_auth());
    assert!(backend.received_requests().await.unwrap_or_default().is_empty());

    Ok(())
}
