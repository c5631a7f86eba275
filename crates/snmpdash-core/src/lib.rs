// snmpdash-core: Telemetry normalization and pull/push aggregation between
// snmpdash-api and its consumers (CLI/TUI).

pub mod config;
pub mod error;
pub mod feed;
pub mod model;
pub mod monitor;
pub mod normalize;
pub mod sink;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Credentials, MonitorConfig};
pub use error::CoreError;
pub use feed::{MetricsFeed, PullSource, current_status};
pub use model::{
    Connections, DeviceInfo, DeviceStatus, DisplayStatus, NetworkMetricsSnapshot, Packets,
    SnapshotSource,
};
pub use monitor::Monitor;
pub use normalize::{MetricKind, from_telemetry, metric_value};
pub use sink::{SnapshotSink, drive};

pub use snmpdash_api::{SignUpRequest, TelemetryRecord, TlsMode};
