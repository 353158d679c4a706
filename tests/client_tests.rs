//! Integration tests for the request pipeline and token refresh

use futures::future::join_all;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use supertry_client::{
    AllowRefreshRetry, ApiClient, ApiRequest, ClientError, FileTokenStorage, MemoryTokenStorage,
    SignInData, TokenStorage,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn profile_json() -> Value {
    json!({
        "id": "user-1",
        "email": "tester@example.com",
        "role": "USER",
        "firstName": "Tess",
        "isActive": true,
        "isVerified": true
    })
}

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::builder()
        .base_url(server.uri())
        .token_storage(Arc::new(MemoryTokenStorage::new()))
        .build()
        .unwrap()
}

fn client_with_tokens(server: &MockServer, access: &str, refresh: &str) -> ApiClient {
    let client = client_for(server);
    client.set_access_token(Some(access.to_string()));
    client.set_refresh_token(Some(refresh.to_string()));
    client
}

fn refreshed(access: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 3600
    }))
}

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized", "statusCode": 401}))
}

#[tokio::test]
async fn test_request_sends_json_and_bearer_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "access-1", "refresh-1");
    let profile = client.get_me().await.unwrap();

    assert_eq!(profile.id, "user-1");
    assert_eq!(profile.first_name.as_deref(), Some("Tess"));
}

#[tokio::test]
async fn test_request_without_token_has_no_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/procedure-templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let templates = client.get_procedure_templates().await.unwrap();
    assert!(templates.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_header_overrides_are_applied() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("x-client", "dashboard"))
        .and(header("authorization", "Bearer override"))
        .and(body_json(json!({"hello": "world"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "stored", "refresh");
    let request = ApiRequest::post("/echo")
        .json(&json!({"hello": "world"}))
        .unwrap()
        .header(
            HeaderName::from_static("x-client"),
            HeaderValue::from_static("dashboard"),
        )
        .header(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer override"),
        );

    let body: Value = client.request(request, AllowRefreshRetry::Yes).await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_api_error_carries_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Campaign not found"})),
        )
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "access", "refresh");
    let err = client.get_campaign("missing").await.unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Campaign not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_api_error_falls_back_to_status_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "access", "refresh");
    let err = client.get_sessions().await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Api { status: 500, ref message } if message == "Internal Server Error"
    ));
}

#[tokio::test]
async fn test_network_failure_is_distinct_from_api_error() {
    let client = ApiClient::builder()
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();

    let err = client.get_me().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}

#[tokio::test]
async fn test_request_timeout_surfaces_as_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wallets/me/balance"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"balance": 1.0, "currency": "EUR"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    match client.get_wallet_balance().await {
        Err(ClientError::Network(e)) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_expired_access_token_refreshes_once_and_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refresh_token": "valid-refresh"})))
        .respond_with(refreshed("fresh"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "expired", "valid-refresh");
    let profile = client.get_me().await.unwrap();

    assert_eq!(profile.email, "tester@example.com");
    assert_eq!(client.access_token().as_deref(), Some("fresh"));
    assert_eq!(client.refresh_token().as_deref(), Some("valid-refresh"));
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(unauthorized())
        .expect(5)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(5)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("fresh").set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "expired", "valid-refresh");
    let results = join_all((0..5).map(|_| client.get_me())).await;

    for result in results {
        assert_eq!(result.unwrap().id, "user-1");
    }
    assert_eq!(client.access_token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_waiting_request_survives_cancelled_refresh_leader() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(1)
        .mount(&server)
        .await;

    // Slow enough that the first caller is cancelled while its refresh is in flight
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("fresh").set_delay(Duration::from_millis(500)))
        .expect(1..=2)
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "expired", "valid-refresh");

    let (first, second) = tokio::join!(
        tokio::time::timeout(Duration::from_millis(150), client.get_me()),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            client.get_me().await
        },
    );

    assert!(first.is_err(), "first caller should have been cancelled");
    assert_eq!(second.unwrap().id, "user-1");
    assert_eq!(client.access_token().as_deref(), Some("fresh"));
    assert_eq!(client.refresh_token().as_deref(), Some("valid-refresh"));
}

#[tokio::test]
async fn test_concurrent_401s_all_fail_when_refresh_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(unauthorized().set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "expired", "revoked-refresh");
    let results = join_all((0..4).map(|_| client.get_me())).await;

    for result in results {
        assert!(matches!(result, Err(ClientError::AuthExpired)));
    }
    assert!(client.access_token().is_none());
    assert!(client.refresh_token().is_none());
}

#[tokio::test]
async fn test_retried_request_is_not_refreshed_twice() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("still-rejected"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "expired", "valid-refresh");
    let err = client.get_me().await.unwrap_err();

    assert!(err.is_auth_expired());
    // The refresh itself succeeded, so the session is kept
    assert_eq!(client.access_token().as_deref(), Some("still-rejected"));
}

#[tokio::test]
async fn test_refresh_failure_clears_tokens_and_next_call_fails_fast() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "Refresh token revoked"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let storage = MemoryTokenStorage::new();
    let client = ApiClient::builder()
        .base_url(server.uri())
        .token_storage(Arc::new(storage.clone()))
        .build()
        .unwrap();
    client.set_access_token(Some("expired".to_string()));
    client.set_refresh_token(Some("revoked".to_string()));

    assert!(client.get_me().await.unwrap_err().is_auth_expired());
    assert!(client.access_token().is_none());
    assert!(client.refresh_token().is_none());
    assert!(!storage.contains("access_token"));
    assert!(!storage.contains("refresh_token"));

    // No refresh token left: fails without another refresh call
    assert!(client.get_me().await.unwrap_err().is_auth_expired());
}

#[tokio::test]
async fn test_refresh_transport_failure_clears_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;

    // Undecodable success body counts as a failed refresh
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "expired", "valid-refresh");
    assert!(client.get_me().await.unwrap_err().is_auth_expired());
    assert!(client.access_token().is_none());
    assert!(client.refresh_token().is_none());
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wallets/me/balance"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wallets/me/balance"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"balance": 9.5, "currency": "EUR"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "refresh_token": "rotated",
            "token_type": "bearer",
            "expires_in": 900
        })))
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "expired", "old-refresh");
    let balance = client.get_wallet_balance().await.unwrap();

    assert_eq!(balance.balance, 9.5);
    assert_eq!(client.refresh_token().as_deref(), Some("rotated"));
}

#[tokio::test]
async fn test_401_without_refresh_token_is_auth_expired() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_access_token(Some("expired".to_string()));

    assert!(client.get_me().await.unwrap_err().is_auth_expired());
}

#[tokio::test]
async fn test_no_retry_request_surfaces_401_as_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with_tokens(&server, "old-access", "old-refresh");
    let err = client
        .sign_in(&SignInData {
            email: "tester@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Api { status: 401, ref message } if message == "Invalid credentials"
    ));
    assert_eq!(client.refresh_token().as_deref(), Some("old-refresh"));
}

#[tokio::test]
async fn test_sign_in_stores_session_and_sign_out_clears_it() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "tester@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "profile": profile_json()
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .sign_in(&SignInData {
            email: "tester@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.profile.id, "user-1");
    assert_eq!(client.access_token().as_deref(), Some("access-1"));
    assert_eq!(client.refresh_token().as_deref(), Some("refresh-1"));
    client.get_me().await.unwrap();

    client.sign_out();
    assert!(client.access_token().is_none());
    assert!(client.refresh_token().is_none());
}

#[tokio::test]
async fn test_tokens_persist_to_file_across_clients() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("tokens.json");

    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "profile": profile_json()
        })))
        .mount(&server)
        .await;

    let first = ApiClient::builder()
        .base_url(server.uri())
        .token_storage(Arc::new(FileTokenStorage::new(&token_file)))
        .build()
        .unwrap();
    first
        .sign_up(&supertry_client::SignUpData {
            email: "tester@example.com".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let second = ApiClient::builder()
        .base_url(server.uri())
        .token_storage(Arc::new(FileTokenStorage::new(&token_file)))
        .build()
        .unwrap();
    assert_eq!(second.access_token().as_deref(), Some("access-1"));
    assert_eq!(second.refresh_token().as_deref(), Some("refresh-1"));

    second.set_access_token(None);
    let storage = FileTokenStorage::new(&token_file);
    assert!(storage.load("access_token").unwrap().is_none());
    assert_eq!(
        storage.load("refresh_token").unwrap().as_deref(),
        Some("refresh-1")
    );
}
