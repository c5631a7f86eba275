// ── Telemetry → snapshot normalization ──
//
// Turns a flat list of backend readings into a `NetworkMetricsSnapshot`.
// Total over its input: unknown, missing, or garbled readings become 0.

use snmpdash_api::TelemetryRecord;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::model::{
    Connections, DeviceInfo, DeviceStatus, NetworkMetricsSnapshot, Packets, SnapshotSource,
    now_iso,
};

/// The metric names the snapshot is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum MetricKind {
    IpInReceives,
    IpOutRequests,
    TcpCurrEstab,
    TcpActiveOpens,
    UdpInDatagrams,
    IcmpInMsgs,
    IcmpOutMsgs,
    ArpTableEntry,
    IpDefaultTtl,
}

/// Value of the first record whose `metric_type` is exactly `kind`.
///
/// 0 when no record matches or its value has no leading integer.
pub fn metric_value(records: &[TelemetryRecord], kind: MetricKind) -> u64 {
    let name = kind.as_ref();
    records
        .iter()
        .find(|r| r.metric_type.as_deref() == Some(name))
        .and_then(|r| r.value.as_deref())
        .map_or(0, parse_leading_int)
}

/// Lenient integer parse: optional leading whitespace and sign, then the
/// leading run of ASCII digits. `"12abc"` → 12, `"3.7"` → 3, `"-4"` → 0,
/// `""` → 0. Overflow saturates.
fn parse_leading_int(raw: &str) -> u64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: u64 = 0;
    let mut any = false;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        any = true;
        value = value.saturating_mul(10).saturating_add(u64::from(b - b'0'));
    }

    if !any || negative { 0 } else { value }
}

/// Build a snapshot from one batch of readings.
///
/// `last_update` is the first record's timestamp, or now when the batch is
/// empty or that record carries none.
pub fn from_telemetry(records: &[TelemetryRecord], source: SnapshotSource) -> NetworkMetricsSnapshot {
    let value = |kind| metric_value(records, kind);

    let packets = Packets {
        ip_in: value(MetricKind::IpInReceives),
        ip_out: value(MetricKind::IpOutRequests),
        icmp_in: value(MetricKind::IcmpInMsgs),
        icmp_out: value(MetricKind::IcmpOutMsgs),
    };
    let connections = Connections {
        tcp: value(MetricKind::TcpCurrEstab),
        udp: value(MetricKind::UdpInDatagrams),
        tcp_active: value(MetricKind::TcpActiveOpens),
    };
    let device_info = DeviceInfo {
        arp_entries: value(MetricKind::ArpTableEntry),
        ttl: value(MetricKind::IpDefaultTtl),
    };
    let device_status = DeviceStatus::derive(&connections, &device_info);

    let last_update = records
        .first()
        .and_then(|r| r.timestamp.as_deref())
        .filter(|t| !t.is_empty())
        .map_or_else(now_iso, str::to_owned);

    NetworkMetricsSnapshot {
        packets,
        connections,
        device_info,
        device_status,
        last_update,
        source,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn reading(kind: &str, value: &str) -> TelemetryRecord {
        TelemetryRecord::reading(kind, value)
    }

    #[test]
    fn end_to_end_example() {
        let records = vec![reading("tcp_curr_estab", "5"), reading("arp_table_entry", "0")];
        let snap = from_telemetry(&records, SnapshotSource::Push);

        assert_eq!(snap.connections.tcp, 5);
        assert_eq!(snap.device_info.arp_entries, 0);
        assert_eq!(snap.device_status.online(), 1);
        assert_eq!(snap.device_status.warning(), 1);
        assert_eq!(snap.device_status.offline(), 0);
        assert_eq!(snap.source, SnapshotSource::Push);
    }

    #[test]
    fn every_kind_maps_to_its_field() {
        let records: Vec<_> = MetricKind::iter()
            .zip(1..)
            .map(|(kind, n)| reading(kind.as_ref(), &n.to_string()))
            .collect();
        let snap = from_telemetry(&records, SnapshotSource::Pull);

        assert_eq!(
            snap.packets,
            Packets {
                ip_in: 1,
                ip_out: 2,
                icmp_in: 6,
                icmp_out: 7,
            }
        );
        assert_eq!(
            snap.connections,
            Connections {
                tcp: 3,
                udp: 5,
                tcp_active: 4,
            }
        );
        assert_eq!(snap.device_info, DeviceInfo { arp_entries: 8, ttl: 9 });
    }

    #[test]
    fn missing_metrics_are_zero_including_ttl() {
        let snap = from_telemetry(&[reading("tcp_curr_estab", "0")], SnapshotSource::Pull);
        assert_eq!(snap.packets, Packets::default());
        assert_eq!(snap.device_info.ttl, 0);
        assert_eq!(snap.device_status.online(), 0);
        assert_eq!(snap.device_status.warning(), 1);
    }

    #[test]
    fn first_match_wins() {
        let records = vec![reading("tcp_curr_estab", "2"), reading("tcp_curr_estab", "9")];
        assert_eq!(metric_value(&records, MetricKind::TcpCurrEstab), 2);
    }

    #[test]
    fn lenient_parse() {
        assert_eq!(parse_leading_int("42"), 42);
        assert_eq!(parse_leading_int("  12abc"), 12);
        assert_eq!(parse_leading_int("3.7"), 3);
        assert_eq!(parse_leading_int("+8"), 8);
        assert_eq!(parse_leading_int("-4"), 0);
        assert_eq!(parse_leading_int("abc"), 0);
        assert_eq!(parse_leading_int(""), 0);
        assert_eq!(parse_leading_int("99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn unparseable_value_is_zero() {
        let records = vec![TelemetryRecord {
            metric_type: Some("udp_in_datagrams".into()),
            value: None,
            ..TelemetryRecord::default()
        }];
        assert_eq!(metric_value(&records, MetricKind::UdpInDatagrams), 0);
    }

    #[test]
    fn last_update_from_first_record() {
        let mut first = reading("ip_in_receives", "1");
        first.timestamp = Some("2025-03-01T10:00:00Z".into());
        let mut second = reading("ip_out_requests", "1");
        second.timestamp = Some("2025-03-01T11:00:00Z".into());

        let snap = from_telemetry(&[first, second], SnapshotSource::Pull);
        assert_eq!(snap.last_update, "2025-03-01T10:00:00Z");

        let snap = from_telemetry(&[], SnapshotSource::Pull);
        assert!(chrono::DateTime::parse_from_rfc3339(&snap.last_update).is_ok());
    }
}
