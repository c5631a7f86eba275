// Wire types for the backend's JSON payloads.
//
// Field names follow the backend's camelCase. Every telemetry field is
// optional so a half-populated record never fails the whole batch.

use serde::{Deserialize, Deserializer, Serialize};

/// One named reading from a monitored device, as stored by the backend.
///
/// Every field is read leniently, so a number or an object
/// where a string is expected degrades that field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelemetryRecord {
    #[serde(deserialize_with = "de_lenient_string")]
    pub id: Option<String>,
    /// SNMP object identifier the reading was taken from.
    #[serde(deserialize_with = "de_lenient_string")]
    pub oid: Option<String>,
    /// Logical metric name, e.g. `"tcp_curr_estab"`.
    #[serde(deserialize_with = "de_lenient_string")]
    pub metric_type: Option<String>,
    /// Numeric-encoded reading.
    #[serde(deserialize_with = "de_lenient_string")]
    pub value: Option<String>,
    #[serde(deserialize_with = "de_lenient_string")]
    pub device_ip: Option<String>,
    #[serde(deserialize_with = "de_lenient_string")]
    pub timestamp: Option<String>,
    #[serde(deserialize_with = "de_lenient_string")]
    pub readable_value: Option<String>,
    #[serde(deserialize_with = "de_lenient_string")]
    pub created_at: Option<String>,
    /// Polling tier the backend collected this under (high/medium/low).
    #[serde(deserialize_with = "de_lenient_string")]
    pub frequency_type: Option<String>,
}

impl TelemetryRecord {
    /// Convenience constructor used by tests and fixtures.
    pub fn reading(metric_type: &str, value: &str) -> Self {
        Self {
            metric_type: Some(metric_type.to_owned()),
            value: Some(value.to_owned()),
            ..Self::default()
        }
    }
}

/// Strings pass through, numbers and booleans are stringified, anything
/// else reads as absent.
fn de_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

// ── Auth payloads ───────────────────────────────────────────────────

/// Body for `POST /auth/signup`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Response of `GET /auth/check`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
}

/// Response of `GET /auth/ip-address`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddressResponse {
    pub ip_address: String,
}
