// Integration tests for `Monitor` against a wiremock backend.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use futures_util::StreamExt;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use snmpdash_core::{
    Credentials, DisplayStatus, Monitor, MonitorConfig, SnapshotSource, current_status,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> MonitorConfig {
    MonitorConfig {
        api_base: Url::parse(&format!("{}/api/v1", server.uri())).unwrap(),
        // Nothing listens on the discard port; the channel just retries.
        ws_url: Url::parse("ws://127.0.0.1:9/ws/snmp-data").unwrap(),
        reconnect_delay: Duration::from_millis(50),
        ..MonitorConfig::default()
    }
}

async fn mount_metrics(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v1/all-metrics"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_current_normalizes_pull() {
    let server = MockServer::start().await;
    mount_metrics(
        &server,
        200,
        json!([
            { "metricType": "tcp_curr_estab", "value": "5", "timestamp": "2025-03-01T10:00:00Z" },
            { "metricType": "arp_table_entry", "value": "0" },
            { "metricType": "ip_default_ttl", "value": "128" },
        ]),
    )
    .await;

    let monitor = Monitor::new(config(&server)).unwrap();
    let snap = monitor.current().await;

    assert_eq!(snap.source, SnapshotSource::Pull);
    assert_eq!(snap.connections.tcp, 5);
    assert_eq!(snap.device_info.ttl, 128);
    assert_eq!(snap.device_status.online(), 1);
    assert_eq!(snap.device_status.warning(), 1);
    assert_eq!(snap.device_status.offline(), 0);
    assert_eq!(snap.last_update, "2025-03-01T10:00:00Z");
}

#[tokio::test]
async fn test_pull_with_numeric_ids_still_normalizes() {
    let server = MockServer::start().await;
    mount_metrics(
        &server,
        200,
        json!([
            { "id": 1, "metricType": "tcp_curr_estab", "value": "5", "createdAt": 1_740_823_200_000_i64 },
            { "id": 2, "metricType": "arp_table_entry", "value": "0", "deviceIp": null },
        ]),
    )
    .await;

    let monitor = Monitor::new(config(&server)).unwrap();
    let snap = monitor.current().await;

    assert_eq!(snap.connections.tcp, 5);
    assert_eq!(snap.device_info.ttl, 0, "a real pull, not the fallback");
    assert_eq!(snap.device_status.online(), 1);
    assert_eq!(snap.device_status.warning(), 1);
}

#[tokio::test]
async fn test_pull_failure_yields_fallback_first() {
    let server = MockServer::start().await;
    mount_metrics(&server, 500, json!({ "error": "db down" })).await;

    let monitor = Monitor::new(config(&server)).unwrap();
    monitor.start().await.unwrap();

    let mut snapshots = Box::pin(monitor.snapshots());
    let first = snapshots.next().await.unwrap();
    assert_eq!(first.device_info.ttl, 64);
    assert_eq!(first.connections.tcp, 0);
    assert_eq!(first.source, SnapshotSource::Pull);
    assert_eq!(first.device_status.warning(), 0);

    assert!(!monitor.is_connected());
    assert_eq!(
        current_status(monitor.is_connected(), Some(first.source)),
        DisplayStatus::Pull
    );

    monitor.shutdown();
    let rest = tokio::time::timeout(Duration::from_secs(5), snapshots.next())
        .await
        .unwrap();
    assert!(rest.is_none(), "shutdown ends the stream");
}

#[tokio::test]
async fn test_start_signs_in_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/signin"))
        .respond_with(ResponseTemplate::new(200).insert_header("Set-Cookie", "JSESSIONID=s1; Path=/"))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.credentials = Some(Credentials {
        username: "admin".into(),
        password: SecretString::from("hunter22"),
    });
    let monitor = Monitor::new(cfg).unwrap();

    monitor.start().await.unwrap();
    monitor.start().await.unwrap();
    assert_eq!(monitor.client().cookie_header().as_deref(), Some("JSESSIONID=s1"));

    monitor.shutdown();
    assert!(monitor.is_shut_down());
}

#[tokio::test]
async fn test_start_reports_rejected_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/signin"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.credentials = Some(Credentials {
        username: "admin".into(),
        password: SecretString::from("nope"),
    });
    let monitor = Monitor::new(cfg).unwrap();

    let err = monitor.start().await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_snapshots_before_start_end_after_pull() {
    let server = MockServer::start().await;
    mount_metrics(&server, 200, json!([{ "metricType": "udp_in_datagrams", "value": "900" }])).await;

    let monitor = Monitor::new(config(&server)).unwrap();
    let all: Vec<_> = monitor.snapshots().collect().await;

    assert_eq!(all.len(), 1);
    assert_eq!(all[0].connections.udp, 900);
}
