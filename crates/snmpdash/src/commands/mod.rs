//! Command dispatch: bridges CLI args to the monitor and output formatting.

pub mod auth;
pub mod config_cmd;
pub mod snapshot;
pub mod watch;

use snmpdash_core::Monitor;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    monitor: &Monitor,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Snapshot => snapshot::handle(monitor, global).await,
        Command::Watch(args) => watch::handle(monitor, args, profile_name, global).await,
        Command::Auth(args) => auth::handle(monitor, args, profile_name, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Attach the active profile name to authentication failures.
pub(crate) fn with_profile(err: snmpdash_core::CoreError, profile_name: &str) -> CliError {
    match CliError::from(err) {
        CliError::AuthFailed { message, .. } => CliError::AuthFailed {
            profile: profile_name.into(),
            message,
        },
        other => other,
    }
}
