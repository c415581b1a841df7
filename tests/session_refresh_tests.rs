//! Integration tests for refresh-on-401 behavior.
//!
//! These tests drive several requests concurrently against a mock server and
//! verify that an expired access token is refreshed exactly once.

use std::sync::Arc;
use std::time::Duration;

use phantom_banking::auth::{MemoryStorage, Route, Storage, TokenStore};
use phantom_banking::{
    AuthTokens, AuthUser, BaseUrl, ClientConfig, HttpError, MerchantError, PhantomClient, Session,
    UserRole,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONCURRENT_REQUESTS: usize = 5;

/// Creates a client whose storage already holds a merchant session.
fn signed_in_client(server: &MockServer, access: &str, refresh: &str) -> PhantomClient {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    TokenStore::new(Arc::clone(&storage))
        .save(&Session::new(
            AuthUser::new("u-1", UserRole::Merchant),
            AuthTokens::new(access, refresh),
        ))
        .unwrap();

    let config = ClientConfig::builder()
        .base_url(BaseUrl::new(server.uri()).unwrap())
        .build()
        .unwrap();
    PhantomClient::new(&config, storage)
}

async fn run_concurrent_dashboards(
    client: &PhantomClient,
) -> Vec<Result<serde_json::Value, MerchantError>> {
    let handles: Vec<_> = (0..CONCURRENT_REQUESTS)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.merchant().dashboard().await })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

// ============================================================================
// Single-flight refresh
// ============================================================================

#[tokio::test]
async fn test_concurrent_401s_trigger_exactly_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/merchant/dashboard/"))
        .and(header("Authorization", "Bearer a1"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Given token not valid for any token type"})),
        )
        .expect(CONCURRENT_REQUESTS as u64)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/merchant/dashboard/"))
        .and(header("Authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": "150.00"})))
        .expect(CONCURRENT_REQUESTS as u64)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "a2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server, "a1", "r1");
    let results = run_concurrent_dashboards(&client).await;

    for result in results {
        assert_eq!(result.unwrap()["balance"], "150.00");
    }

    let tokens = client.token_store().session().unwrap().tokens;
    assert_eq!(tokens.access, "a2");
    assert_eq!(tokens.refresh, "r1");
    assert!(client.session().is_authenticated());
    assert!(client.session().last_redirect().is_none());
}

#[tokio::test]
async fn test_concurrent_401s_with_failed_refresh_end_the_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/merchant/dashboard/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(CONCURRENT_REQUESTS as u64)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Token is invalid or expired"}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server, "a1", "r1");
    let mut rx = client.session().subscribe();

    let results = run_concurrent_dashboards(&client).await;

    for result in results {
        match result {
            Err(MerchantError::Http(HttpError::Response(e))) => {
                assert_eq!(e.code, 401);
                assert_eq!(e.message, "expired");
            }
            other => panic!("Expected the original 401, got {other:?}"),
        }
    }

    assert!(client.token_store().read().is_empty());
    assert!(!client.session().is_authenticated());
    assert_eq!(client.session().last_redirect(), Some(Route::Login));
    assert!(rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_replays_follow_the_order_requests_failed() {
    let server = MockServer::start().await;

    // Spawn order differs from the order the 401s come back in.
    let failures = [
        ("/merchant/dashboard/", 300),
        ("/merchant/transactions/", 0),
        ("/merchant/generate_api_credentials/", 150),
    ];
    for (endpoint, delay_ms) in failures {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(header("Authorization", "Bearer a1"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": "expired"}))
                    .set_delay(Duration::from_millis(delay_ms)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(header("Authorization", "Bearer a2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "a2"}))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server, "a1", "r1");
    let dashboard = {
        let client = client.clone();
        tokio::spawn(async move { client.merchant().dashboard().await })
    };
    let transactions = {
        let client = client.clone();
        tokio::spawn(async move { client.merchant().transactions().await })
    };
    let credentials = {
        let client = client.clone();
        tokio::spawn(async move { client.merchant().generate_api_credentials().await })
    };

    assert!(dashboard.await.unwrap().is_ok());
    assert!(transactions.await.unwrap().is_ok());
    assert!(credentials.await.unwrap().is_ok());

    let received = server.received_requests().await.unwrap();
    let paths: Vec<&str> = received.iter().map(|request| request.url.path()).collect();
    let refresh_at = paths
        .iter()
        .position(|p| *p == "/auth/token/refresh/")
        .unwrap();

    assert_eq!(
        &paths[refresh_at + 1..],
        &[
            "/merchant/transactions/",
            "/merchant/generate_api_credentials/",
            "/merchant/dashboard/",
        ]
    );
}

// ============================================================================
// Explicit refresh
// ============================================================================

#[tokio::test]
async fn test_explicit_refresh_keeps_refresh_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a9"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server, "a1", "r1");
    let access = client.auth().refresh_token().await.unwrap();

    assert_eq!(access, "a9");
    let tokens = client.token_store().session().unwrap().tokens;
    assert_eq!(tokens, AuthTokens::new("a9", "r1"));
}

#[tokio::test]
async fn test_explicit_refresh_without_session_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a9"})))
        .expect(0)
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(BaseUrl::new(server.uri()).unwrap())
        .build()
        .unwrap();
    let client = PhantomClient::new(&config, Arc::new(MemoryStorage::new()));

    let error = client.auth().refresh_token().await.unwrap_err();
    assert_eq!(error.to_string(), "No refresh token available");
}

#[tokio::test]
async fn test_request_after_rotation_uses_new_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/merchant/transactions/"))
        .and(header("Authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server, "a1", "r1");
    client.auth().refresh_token().await.unwrap();

    let transactions = client.merchant().transactions().await.unwrap();
    assert_eq!(transactions, json!([]));
}
