// ── Domain snapshot model ──
//
// The typed view of one moment of device telemetry, as consumed by every
// rendering sink. Built by `normalize::from_telemetry` or taken verbatim
// from `NetworkMetricsSnapshot::fallback`.

use serde::Serialize;
use strum::{AsRefStr, Display};

/// Packet counters (IP-MIB / ICMP-MIB).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Packets {
    pub ip_in: u64,
    pub ip_out: u64,
    pub icmp_in: u64,
    pub icmp_out: u64,
}

/// Transport-layer connection counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connections {
    /// Currently established TCP connections.
    pub tcp: u64,
    /// UDP datagrams received.
    pub udp: u64,
    /// TCP active opens.
    pub tcp_active: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub arp_entries: u64,
    pub ttl: u64,
}

/// Coarse device health flags, each 0 or 1.
///
/// Not independently settable: the only constructors are
/// [`DeviceStatus::derive`] and the all-zero [`Default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    online: u8,
    warning: u8,
    offline: u8,
}

impl DeviceStatus {
    /// `online` iff TCP connections exist, `warning` iff the ARP table is
    /// empty. `offline` has no rule and stays 0.
    pub fn derive(connections: &Connections, device_info: &DeviceInfo) -> Self {
        Self {
            online: u8::from(connections.tcp > 0),
            warning: u8::from(device_info.arp_entries == 0),
            offline: 0,
        }
    }

    pub fn online(self) -> u8 {
        self.online
    }

    pub fn warning(self) -> u8 {
        self.warning
    }

    pub fn offline(self) -> u8 {
        self.offline
    }
}

/// Which source produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SnapshotSource {
    /// One-shot HTTP pull, or push data while the channel is down.
    Pull,
    /// Live push channel.
    Push,
}

/// One normalized telemetry snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMetricsSnapshot {
    pub packets: Packets,
    pub connections: Connections,
    pub device_info: DeviceInfo,
    pub device_status: DeviceStatus,
    /// ISO-8601 timestamp of the batch's first record, or the local clock
    /// when that record has none.
    pub last_update: String,
    pub source: SnapshotSource,
}

impl NetworkMetricsSnapshot {
    /// Default TTL shown when the pull fails.
    pub const FALLBACK_TTL: u64 = 64;

    /// The zero-valued snapshot substituted for a failed pull.
    ///
    /// A literal, not a normalized value: every status flag is 0 and the
    /// TTL is 64, where normalizing an empty record list would give
    /// `warning = 1` and `ttl = 0`.
    pub fn fallback() -> Self {
        Self {
            packets: Packets::default(),
            connections: Connections::default(),
            device_info: DeviceInfo {
                arp_entries: 0,
                ttl: Self::FALLBACK_TTL,
            },
            device_status: DeviceStatus::default(),
            last_update: now_iso(),
            source: SnapshotSource::Pull,
        }
    }
}

/// Current wall clock as RFC 3339 with millisecond precision (`...Z`).
pub(crate) fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ── Display status ───────────────────────────────────────────────────

/// Connection label shown by the UI. See [`crate::feed::current_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DisplayStatus {
    Push,
    Pull,
    Disconnected,
}
