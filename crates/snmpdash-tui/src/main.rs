//! `snmpdash-tui`: live terminal dashboard for SNMP network metrics.
//!
//! Shows one HTTP pull followed by the backend's STOMP push stream in four
//! views: IP packet gauges, TCP connections, protocol counters, and device
//! status. Logs go to a file (default `/tmp/snmpdash-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use snmpdash_config::{Profile, load_config, profile_to_monitor_config};
use snmpdash_core::{Monitor, MonitorConfig};

use crate::app::App;

/// Terminal dashboard for live network metrics.
#[derive(Parser, Debug)]
#[command(name = "snmpdash-tui", version, about)]
struct Cli {
    /// Backend profile to use
    #[arg(short = 'p', long, env = "SNMPDASH_PROFILE")]
    profile: Option<String>,

    /// REST API base URL (overrides profile)
    #[arg(long, env = "SNMPDASH_API_BASE")]
    api_base: Option<String>,

    /// Push channel WebSocket URL (overrides profile)
    #[arg(long, env = "SNMPDASH_WS_URL")]
    ws_url: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/snmpdash-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. Hold the guard for the life of the app so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "snmpdash_tui={log_level},snmpdash_core={log_level},snmpdash_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("snmpdash-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

fn apply_overrides(mut profile: Profile, cli: &Cli) -> Profile {
    if let Some(ref api_base) = cli.api_base {
        profile.api_base.clone_from(api_base);
    }
    if let Some(ref ws_url) = cli.ws_url {
        profile.ws_url.clone_from(ws_url);
    }
    if cli.insecure {
        profile.insecure = Some(true);
    }
    profile
}

/// Config file profile plus CLI overrides.
fn build_monitor_config(cli: &Cli) -> Result<MonitorConfig> {
    let cfg = load_config()?;
    let (name, profile) = cfg.profile(cli.profile.as_deref())?;
    let profile = apply_overrides(profile, cli);
    info!(profile = %name, api_base = %profile.api_base, ws_url = %profile.ws_url, "resolved profile");
    Ok(profile_to_monitor_config(&profile, &name, &cfg.defaults)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);
    info!("starting snmpdash-tui");

    let config = build_monitor_config(&cli)?;
    let monitor = Monitor::new(config)?;

    let mut app = App::new(monitor);
    app.run().await?;

    Ok(())
}
