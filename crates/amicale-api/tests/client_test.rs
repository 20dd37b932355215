#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use amicale_api::{ApiClient, ApiCode, ApiRejection, Method, RequestStatus};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Envelope unwrapping ─────────────────────────────────────────────

#[tokio::test]
async fn test_success_envelope_unwrapped() {
    let (server, client) = setup().await;

    let envelope = json!({
        "status": 0,
        "data": { "name": "Club Robot", "member_count": 42 }
    });

    Mock::given(method("GET"))
        .and(path("/clubs/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let data: serde_json::Value = client.get("clubs/info", None).await.unwrap();

    assert_eq!(data["name"], "Club Robot");
    assert_eq!(data["member_count"], 42);
}

#[tokio::test]
async fn test_bearer_token_and_body_forwarded() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/clubs/info"))
        .and(header("Authorization", "Bearer T"))
        .and(body_json(json!({ "id": 5 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": 0, "data": {} })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let _: serde_json::Value = client
        .post("clubs/info", &json!({ "id": 5 }), Some("T"))
        .await
        .unwrap();
}

// ── Domain rejections ───────────────────────────────────────────────

#[tokio::test]
async fn test_domain_rejection_carries_code_and_message() {
    let (server, client) = setup().await;

    let envelope = json!({ "status": 1, "message": "wrong email or password" });

    Mock::given(method("POST"))
        .and(path("/password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, ApiRejection> =
        client.post("password", &json!({}), None).await;

    let rejection = result.unwrap_err();
    assert_eq!(rejection.status, RequestStatus::Success);
    assert_eq!(rejection.code, Some(ApiCode::BadCredentials));
    assert_eq!(rejection.message.as_deref(), Some("wrong email or password"));
    assert!(!rejection.is_retryable());
}

#[tokio::test]
async fn test_bad_token_rejection_is_critical() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/clubs/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 2 })))
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, ApiRejection> =
        client.post("clubs/info", &json!({ "id": 5 }), Some("expired")).await;

    let rejection = result.unwrap_err();
    assert_eq!(rejection.code, Some(ApiCode::BadToken));
    assert!(rejection.is_critical());
}

// ── Malformed responses ─────────────────────────────────────────────

#[tokio::test]
async fn test_unparseable_body_is_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/clubs/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, ApiRejection> = client.get("clubs/list", None).await;

    let rejection = result.unwrap_err();
    assert_eq!(rejection.status, RequestStatus::ServerError);
    assert_eq!(rejection.code, None);
    assert!(rejection.is_retryable());
}

#[tokio::test]
async fn test_success_without_data_is_invalid_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/clubs/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 0 })))
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, ApiRejection> = client.get("clubs/list", None).await;

    let rejection = result.unwrap_err();
    assert_eq!(rejection.status, RequestStatus::ServerError);
    assert_eq!(
        rejection.message.as_deref(),
        Some("invalid server response")
    );
}

#[tokio::test]
async fn test_unknown_domain_code_is_invalid_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/clubs/list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": 42, "data": {} })),
        )
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, ApiRejection> = client.get("clubs/list", None).await;

    assert_eq!(result.unwrap_err().status, RequestStatus::ServerError);
}

#[tokio::test]
async fn test_non_ascii_body_longer_than_preview_still_rejects() {
    let (server, client) = setup().await;

    // a multi-byte character straddles the 200-byte mark, like an
    // accented French error page would
    let body = format!("{}é oops, une erreur est survenue", "x".repeat(199));

    Mock::given(method("GET"))
        .and(path("/clubs/list"))
        .respond_with(ResponseTemplate::new(500).set_body_string(body))
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, ApiRejection> = client.get("clubs/list", None).await;

    let rejection = result.unwrap_err();
    assert_eq!(rejection.status, RequestStatus::ServerError);
    assert_eq!(rejection.code, None);
}

#[tokio::test]
async fn test_http_error_status_preserved_on_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/clubs/list"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let result: Result<serde_json::Value, ApiRejection> = client.get("clubs/list", None).await;

    assert_eq!(result.unwrap_err().status, RequestStatus::NotFound);
}

// ── Transport failures ──────────────────────────────────────────────

#[tokio::test]
async fn test_connection_refused_is_connection_error() {
    // Nothing listens on this port; the rejection must be exactly the
    // connection-error status regardless of the transport error content.
    let base_url = Url::parse("http://127.0.0.1:9/").unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base_url);

    let result: Result<serde_json::Value, ApiRejection> =
        client.request("clubs/list", Method::Get, None, None).await;

    assert_eq!(result.unwrap_err(), ApiRejection::connection_error());
}
