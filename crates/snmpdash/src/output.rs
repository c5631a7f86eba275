//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders snapshots in the format selected by `--output`. Tables use
//! `tabled`, structured formats use serde, plain emits `key=value` pairs.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use snmpdash_core::{DisplayStatus, NetworkMetricsSnapshot};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn paint_status(status: DisplayStatus, color: bool) -> String {
    let label = status.as_ref();
    if !color {
        return label.to_owned();
    }
    match status {
        DisplayStatus::Push => label.green().to_string(),
        DisplayStatus::Pull => label.yellow().to_string(),
        DisplayStatus::Disconnected => label.red().to_string(),
    }
}

fn health(snapshot: &NetworkMetricsSnapshot) -> &'static str {
    let status = snapshot.device_status;
    if status.offline() == 1 {
        "offline"
    } else if status.warning() == 1 {
        "warning"
    } else if status.online() == 1 {
        "online"
    } else {
        "unknown"
    }
}

/// `1234` → `1.2K`, `5_600_000` → `5.6M`.
pub fn format_count(n: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "G"), (1_000_000, "M"), (1_000, "K")];
    for (scale, suffix) in UNITS {
        if n >= scale {
            let whole = n / scale;
            let tenth = (n % scale) * 10 / scale;
            return format!("{whole}.{tenth}{suffix}");
        }
    }
    n.to_string()
}

// ── Snapshot rendering ───────────────────────────────────────────────

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusedSnapshot<'a> {
    status: DisplayStatus,
    #[serde(flatten)]
    snapshot: &'a NetworkMetricsSnapshot,
}

fn detail_rows(snapshot: &NetworkMetricsSnapshot, status: DisplayStatus, color: bool) -> Vec<MetricRow> {
    let s = snapshot;
    let row = |metric, value: String| MetricRow { metric, value };
    vec![
        row("Connection", paint_status(status, color)),
        row("Source", s.source.to_string()),
        row("Last update", s.last_update.clone()),
        row("IP packets in", s.packets.ip_in.to_string()),
        row("IP packets out", s.packets.ip_out.to_string()),
        row("ICMP in", s.packets.icmp_in.to_string()),
        row("ICMP out", s.packets.icmp_out.to_string()),
        row("TCP established", s.connections.tcp.to_string()),
        row("TCP active opens", s.connections.tcp_active.to_string()),
        row("UDP datagrams", s.connections.udp.to_string()),
        row("ARP entries", s.device_info.arp_entries.to_string()),
        row("Default TTL", s.device_info.ttl.to_string()),
        row("Online", s.device_status.online().to_string()),
        row("Warning", s.device_status.warning().to_string()),
        row("Offline", s.device_status.offline().to_string()),
    ]
}

fn plain_line(snapshot: &NetworkMetricsSnapshot, status: DisplayStatus) -> String {
    let s = snapshot;
    format!(
        "status={status} source={} last_update={} ip_in={} ip_out={} icmp_in={} icmp_out={} \
         tcp={} tcp_active={} udp={} arp_entries={} ttl={} online={} warning={} offline={}",
        s.source,
        s.last_update,
        s.packets.ip_in,
        s.packets.ip_out,
        s.packets.icmp_in,
        s.packets.icmp_out,
        s.connections.tcp,
        s.connections.tcp_active,
        s.connections.udp,
        s.device_info.arp_entries,
        s.device_info.ttl,
        s.device_status.online(),
        s.device_status.warning(),
        s.device_status.offline(),
    )
}

/// Full rendering of one snapshot (the `snapshot` command).
pub fn render_snapshot(
    format: &OutputFormat,
    snapshot: &NetworkMetricsSnapshot,
    status: DisplayStatus,
    color: bool,
) -> String {
    let data = StatusedSnapshot { status, snapshot };
    match format {
        OutputFormat::Table => render_table(&detail_rows(snapshot, status, color)),
        OutputFormat::Json => render_json(&data, false),
        OutputFormat::JsonCompact => render_json(&data, true),
        OutputFormat::Yaml => render_yaml(&data),
        OutputFormat::Plain => plain_line(snapshot, status),
    }
}

/// One-line rendering for the `watch` stream.
///
/// JSON formats emit one compact document per line; YAML emits one
/// `---`-separated document per snapshot.
pub fn render_watch_line(
    format: &OutputFormat,
    snapshot: &NetworkMetricsSnapshot,
    status: DisplayStatus,
    color: bool,
) -> String {
    let data = StatusedSnapshot { status, snapshot };
    let s = snapshot;
    match format {
        OutputFormat::Table => format!(
            "{}  {:<12}  ip {}/{}  tcp {}  udp {}  icmp {}  arp {}  ttl {}  {}",
            s.last_update,
            paint_status(status, color),
            format_count(s.packets.ip_in),
            format_count(s.packets.ip_out),
            s.connections.tcp,
            format_count(s.connections.udp),
            s.packets.icmp_in,
            s.device_info.arp_entries,
            s.device_info.ttl,
            health(s),
        ),
        OutputFormat::Json | OutputFormat::JsonCompact => render_json(&data, true),
        OutputFormat::Yaml => format!("---\n{}", render_yaml(&data).trim_end()),
        OutputFormat::Plain => plain_line(snapshot, status),
    }
}

// ── Generic dispatchers ──────────────────────────────────────────────

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`; plain uses `id_fn`.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: {e}\n"))
}
