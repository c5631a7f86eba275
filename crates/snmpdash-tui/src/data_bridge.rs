//! Data bridge: connects the [`Monitor`] snapshot stream to TUI actions.
//!
//! Runs as a background task. Starts the monitor, forwards every snapshot
//! and connection-flag change as an [`Action`], and shuts the monitor down
//! on cancellation.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use snmpdash_core::{Monitor, NetworkMetricsSnapshot, SnapshotSink, drive};

use crate::action::Action;

/// Forwards each snapshot into the action channel.
struct ActionSink {
    tx: mpsc::UnboundedSender<Action>,
}

impl SnapshotSink for ActionSink {
    fn update_snapshot(&mut self, snapshot: &NetworkMetricsSnapshot) {
        let _ = self
            .tx
            .send(Action::SnapshotUpdated(Box::new(snapshot.clone())));
    }
}

pub async fn spawn_data_bridge(
    monitor: Monitor,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let started = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            monitor.shutdown();
            return;
        }
        started = monitor.start() => started,
    };
    if let Err(e) = started {
        // Keep going: the pull still populates the views.
        warn!(error = %e, "failed to start push channel");
        let _ = action_tx.send(Action::Notify(format!("push channel unavailable: {e}")));
    }

    let ip_task = {
        let client = monitor.client().clone();
        let tx = action_tx.clone();
        tokio::spawn(async move {
            match client.ip_address().await {
                Ok(ip) => {
                    let _ = tx.send(Action::IpAddress(ip));
                }
                Err(e) => debug!(error = %e, "client address unavailable"),
            }
        })
    };

    let mut connection = monitor.connection_state();
    let _ = action_tx.send(Action::ConnectionChanged(*connection.borrow_and_update()));

    let mut sink = ActionSink {
        tx: action_tx.clone(),
    };
    let snapshots = drive(monitor.snapshots(), &mut sink);
    tokio::pin!(snapshots);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = connection.changed() => {
                let connected = *connection.borrow_and_update();
                debug!(connected, "connection flag changed");
                let _ = action_tx.send(Action::ConnectionChanged(connected));
            }

            delivered = &mut snapshots => {
                debug!(delivered, "snapshot stream finished");
                break;
            }
        }
    }

    ip_task.abort();
    monitor.shutdown();
    debug!("data bridge shut down");
}
