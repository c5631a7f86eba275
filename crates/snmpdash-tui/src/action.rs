//! UI actions. Actions are the sole mechanism for state mutation.

use snmpdash_core::NetworkMetricsSnapshot;

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    ToggleHelp,

    /// A new snapshot from the merged pull + push stream.
    SnapshotUpdated(Box<NetworkMetricsSnapshot>),
    /// Push channel connection flag changed.
    ConnectionChanged(bool),
    /// Client address as reported by the backend.
    IpAddress(String),
    /// One-line error for the status bar.
    Notify(String),
}
