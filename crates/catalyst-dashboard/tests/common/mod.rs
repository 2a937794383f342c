//! Common test utilities and fixtures for integration tests

#![allow(dead_code, clippy::unwrap_used)]

use catalyst_client::{StaticTokenProvider, TokenProvider};
use catalyst_core::{Config, Record};
use catalyst_dashboard::{Console, NotificationCenter, RecordScreen};
use serde_json::{Value, json};
use std::sync::{Arc, Once};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT_LOGGER: Once = Once::new();

/// Initialize test logging once per test binary
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Claims collection path
pub const CLAIMS_PATH: &str = "/api/insurance/claims";

/// Configuration pointing at a mock backend
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.request_timeout = 2;
    config.api.connect_timeout = 1;
    config
}

/// Console with a static token and an in-memory notification center
pub fn test_console(server: &MockServer) -> (Console, Arc<NotificationCenter>) {
    test_console_with_tokens(server, Arc::new(StaticTokenProvider::new("test-token")))
}

/// Console with a custom token provider
pub fn test_console_with_tokens(
    server: &MockServer,
    tokens: Arc<dyn TokenProvider>,
) -> (Console, Arc<NotificationCenter>) {
    let notifier = Arc::new(NotificationCenter::new());
    let console = Console::new(&test_config(server), tokens, notifier.clone()).unwrap();
    (console, notifier)
}

/// Claims screen against a mock backend
pub fn claims_screen(server: &MockServer) -> (RecordScreen, Arc<NotificationCenter>) {
    let (console, notifier) = test_console(server);
    (console.screen("claims").unwrap(), notifier)
}

/// A claim as the backend returns it
pub fn claim_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "claim_id": format!("CLM-{id:04}"),
        "policy_number": format!("P-{id}"),
        "claim_type": "Auto",
        "claim_amount": 1000.0 * f64::from(u32::try_from(id).unwrap()),
        "business_status": status
    })
}

/// Parse a backend record
pub fn record(value: Value) -> Record {
    serde_json::from_value(value).unwrap()
}

/// Mount a collection response
pub async fn mount_claims(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(CLAIMS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
