//! Inbound push envelopes.
//!
//! Every STOMP `MESSAGE` body is a JSON document with optional `type`,
//! `data`, and `timestamp` fields. [`InboundEnvelope::from_body`] fills the
//! gaps the same way for every topic: a missing type falls back to the
//! topic's default, a missing `data` means the whole body is the payload,
//! and a missing timestamp is stamped with the local clock.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::models::TelemetryRecord;

// ── MessageType ──────────────────────────────────────────────────────

/// Envelope type as announced by the backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    LatestMetrics,
    DeviceMetrics,
    BandwidthData,
    SnmpUpdate,
    Pong,
    TestPing,
    /// Default for `/topic/high-frequency-data` frames without a `type`.
    HighMetrics,
    /// Default for `/topic/medium-frequency-data` frames without a `type`.
    MediumMetrics,
    /// Default for `/topic/low-frequency-data` frames without a `type`.
    LowMetrics,
    #[serde(other)]
    Unknown,
}

impl MessageType {
    /// Parse a backend type name, mapping anything unrecognized to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(Self::Unknown)
    }
}

// ── Topic ────────────────────────────────────────────────────────────

/// The three broker destinations the channel subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    HighFrequency,
    MediumFrequency,
    LowFrequency,
}

impl Topic {
    pub const ALL: [Self; 3] = [Self::HighFrequency, Self::MediumFrequency, Self::LowFrequency];

    /// Broker destination path.
    pub fn destination(self) -> &'static str {
        match self {
            Self::HighFrequency => "/topic/high-frequency-data",
            Self::MediumFrequency => "/topic/medium-frequency-data",
            Self::LowFrequency => "/topic/low-frequency-data",
        }
    }

    /// Envelope type assumed when a frame on this topic omits `type`.
    pub fn default_type(self) -> MessageType {
        match self {
            Self::HighFrequency => MessageType::HighMetrics,
            Self::MediumFrequency => MessageType::MediumMetrics,
            Self::LowFrequency => MessageType::LowMetrics,
        }
    }

    /// Stable subscription id used in `SUBSCRIBE` / `MESSAGE` frames.
    pub fn subscription_id(self) -> &'static str {
        match self {
            Self::HighFrequency => "sub-0",
            Self::MediumFrequency => "sub-1",
            Self::LowFrequency => "sub-2",
        }
    }

    /// Resolve a topic from a `MESSAGE` frame's `subscription` or
    /// `destination` header.
    pub fn from_header(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.subscription_id() == value || t.destination() == value)
    }
}

// ── EnvelopeData ─────────────────────────────────────────────────────

/// Payload carried by an envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnvelopeData {
    /// A flat list of telemetry records (the common case).
    Records(Vec<TelemetryRecord>),
    /// Anything else: pongs, test pings, aggregated shapes.
    Opaque(Value),
}

impl EnvelopeData {
    fn from_value(value: Value) -> Self {
        if value.is_array() {
            match serde_json::from_value::<Vec<TelemetryRecord>>(value.clone()) {
                Ok(records) => return Self::Records(records),
                Err(e) => {
                    tracing::debug!(error = %e, "array payload is not a record list");
                }
            }
        }
        Self::Opaque(value)
    }

    /// The record list, if this payload is one.
    pub fn records(&self) -> Option<&[TelemetryRecord]> {
        match self {
            Self::Records(records) => Some(records),
            Self::Opaque(_) => None,
        }
    }
}

// ── InboundEnvelope ──────────────────────────────────────────────────

/// One message received from the push channel, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub data: EnvelopeData,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl InboundEnvelope {
    /// Build an envelope from a raw frame body.
    ///
    /// Fails when the body is not JSON or is a bare `null`; every other gap
    /// is filled with a default.
    pub fn from_body(body: &str, default_type: MessageType) -> Result<Self, serde_json::Error> {
        let parsed: Value = serde_json::from_str(body)?;
        if parsed.is_null() {
            return Err(serde::de::Error::custom("message body is null"));
        }
        Ok(Self::from_value(parsed, default_type, chrono::Utc::now().timestamp_millis()))
    }

    fn from_value(parsed: Value, default_type: MessageType, now_ms: i64) -> Self {
        let kind = parsed
            .get("type")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map_or(default_type, MessageType::from_name);

        let timestamp = parsed
            .get("timestamp")
            .and_then(|t| t.as_i64().or_else(|| t.as_f64().map(truncate_millis)))
            .filter(|&t| t != 0)
            .unwrap_or(now_ms);

        let data = match parsed.get("data") {
            Some(d) if is_truthy(d) => d.clone(),
            _ => parsed,
        };

        Self {
            kind,
            data: EnvelopeData::from_value(data),
            timestamp,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn truncate_millis(value: f64) -> i64 {
    value as i64
}

/// JSON truthiness: `null`, `false`, `0`, and `""` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
