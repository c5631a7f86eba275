// Integration tests for `MetricsClient` using wiremock.
#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use snmpdash_api::models::SignUpRequest;
use snmpdash_api::{Error, MetricsClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, MetricsClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&format!("{}/api/v1", server.uri())).unwrap();
    let client = MetricsClient::new(base, &TransportConfig::default()).unwrap();
    (server, client)
}

// ── Telemetry ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_all_metrics() {
    let (server, client) = setup().await;

    let body = json!([
        { "id": "1", "metricType": "tcp_curr_estab", "value": "5", "deviceIp": "10.0.0.1",
          "timestamp": "2025-03-01T10:00:00Z" },
        { "id": "2", "metricType": "ip_default_ttl", "value": 128 },
    ]);

    Mock::given(method("GET"))
        .and(path("/api/v1/all-metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let records = client.all_metrics().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].metric_type.as_deref(), Some("tcp_curr_estab"));
    assert_eq!(records[0].timestamp.as_deref(), Some("2025-03-01T10:00:00Z"));
    assert_eq!(records[1].value.as_deref(), Some("128"));
}

#[tokio::test]
async fn test_all_metrics_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/all-metrics"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let err = client.all_metrics().await.unwrap_err();
    match err {
        Error::Api { status, ref message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "down");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_all_metrics_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/all-metrics"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.all_metrics().await.unwrap_err();
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn test_all_metrics_bad_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/all-metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client.all_metrics().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { ref body, .. } if body == "<html>"));
}

// ── Session auth ────────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_stores_session_cookie() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/signin"))
        .and(body_json(json!({ "username": "admin", "password": "hunter22" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=abc123; Path=/")
                .set_body_json(json!({ "message": "ok" })),
        )
        .mount(&server)
        .await;

    assert!(client.cookie_header().is_none());
    client
        .sign_in("admin", &SecretString::from("hunter22"))
        .await
        .unwrap();
    assert_eq!(client.cookie_header().as_deref(), Some("JSESSIONID=abc123"));
}

#[tokio::test]
async fn test_sign_in_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/signin"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let err = client
        .sign_in("admin", &SecretString::from("wrong"))
        .await
        .unwrap_err();
    assert!(err.is_auth_expired());
    assert!(err.to_string().contains("bad credentials"));
}

#[tokio::test]
async fn test_sign_up() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/signup"))
        .and(body_json(json!({
            "username": "ops",
            "email": "ops@example.com",
            "password": "secret1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("User registered"))
        .mount(&server)
        .await;

    let response = client
        .sign_up(&SignUpRequest {
            username: "ops".into(),
            email: "ops@example.com".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
    assert_eq!(response, json!("User registered"));
}

#[tokio::test]
async fn test_sign_out() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/signout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.sign_out().await.unwrap();
}

#[tokio::test]
async fn test_check_auth() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "authenticated": true })))
        .mount(&server)
        .await;

    assert!(client.check_auth().await);
}

#[tokio::test]
async fn test_check_auth_failure_reads_false() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/check"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!client.check_auth().await);
}

#[tokio::test]
async fn test_ip_address() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/ip-address"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ipAddress": "192.168.1.20" })))
        .mount(&server)
        .await;

    assert_eq!(client.ip_address().await.unwrap(), "192.168.1.20");
}
