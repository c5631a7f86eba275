//! `snmpdash watch`: follow the merged snapshot stream line by line.

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::info;

use snmpdash_core::{Monitor, NetworkMetricsSnapshot, SnapshotSink, current_status, drive};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::with_profile;

/// Prints one line per snapshot, labelled with the live connection state.
struct LinePrinter {
    format: OutputFormat,
    color: bool,
    quiet: bool,
    connection: watch::Receiver<bool>,
}

impl SnapshotSink for LinePrinter {
    fn update_snapshot(&mut self, snapshot: &NetworkMetricsSnapshot) {
        let connected = *self.connection.borrow();
        let status = current_status(connected, Some(snapshot.source));
        let line = output::render_watch_line(&self.format, snapshot, status, self.color);
        output::print_output(&line, self.quiet);
    }
}

pub async fn handle(
    monitor: &Monitor,
    args: WatchArgs,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    monitor
        .start()
        .await
        .map_err(|e| with_profile(e, profile_name))?;

    let mut printer = LinePrinter {
        format: global.output.clone(),
        color: output::should_color(&global.color),
        quiet: global.quiet,
        connection: monitor.connection_state(),
    };

    let stream = monitor.snapshots();
    let stream = match args.count {
        Some(n) => stream.take(n).left_stream(),
        None => stream.right_stream(),
    };

    let interrupted = tokio::select! {
        _ = drive(stream, &mut printer) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        info!("interrupted, closing push channel");
    }
    Ok(())
}
