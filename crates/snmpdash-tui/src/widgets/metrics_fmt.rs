//! Scaling helpers for the chart views.

use snmpdash_core::Packets;

/// Floor of the IP gauge scale, in thousands of packets.
pub const GAUGE_FLOOR_K: u64 = 10_000;
/// Headroom added above the current total, in thousands of packets.
pub const GAUGE_HEADROOM_K: u64 = 1_000;

/// `n / divisor`, rounded half up.
pub fn div_round(n: u64, divisor: u64) -> u64 {
    n.saturating_add(divisor / 2) / divisor
}

/// IP in/out gauge values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketGauges {
    pub in_k: u64,
    pub out_k: u64,
    pub total_k: u64,
    /// Scale both gauges share: `max(10000, total_k + 1000)`.
    pub scale_k: u64,
    pub in_percent: u16,
    pub out_percent: u16,
}

impl PacketGauges {
    pub fn new(packets: &Packets) -> Self {
        let in_k = div_round(packets.ip_in, 1_000);
        let out_k = div_round(packets.ip_out, 1_000);
        let total_k = in_k.saturating_add(out_k);
        let scale_k = GAUGE_FLOOR_K.max(total_k.saturating_add(GAUGE_HEADROOM_K));

        Self {
            in_k,
            out_k,
            total_k,
            scale_k,
            in_percent: percent(in_k, scale_k),
            out_percent: percent(out_k, scale_k),
        }
    }
}

fn percent(part: u64, whole: u64) -> u16 {
    let pct = div_round(part.saturating_mul(100), whole).min(100);
    u16::try_from(pct).unwrap_or(100)
}

/// UDP datagrams as plotted on the protocol chart (hundreds).
pub fn udp_hundreds(udp: u64) -> u64 {
    div_round(udp, 100)
}

/// Age of an RFC 3339 timestamp relative to `now`, e.g. `"3s"`.
///
/// `None` when the timestamp does not parse. Future instants read as `0s`.
pub fn age(last_update: &str, now: chrono::DateTime<chrono::Utc>) -> Option<String> {
    let then = chrono::DateTime::parse_from_rfc3339(last_update).ok()?;
    let secs = (now - then.with_timezone(&chrono::Utc)).num_seconds().max(0);
    let secs = u64::try_from(secs).unwrap_or(0);
    Some(humantime::format_duration(std::time::Duration::from_secs(secs)).to_string())
}
