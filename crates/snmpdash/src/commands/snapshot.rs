//! `snmpdash snapshot`: one pull, normalized and printed.

use snmpdash_core::{Monitor, current_status};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(monitor: &Monitor, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = monitor.current().await;
    // No push session: the label reflects the pulled data only.
    let status = current_status(false, Some(snapshot.source));

    let color = output::should_color(&global.color);
    let out = output::render_snapshot(&global.output, &snapshot, status, color);
    output::print_output(&out, global.quiet);
    Ok(())
}
