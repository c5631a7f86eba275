//! CLI flag overrides on top of snmpdash-config profiles.
//!
//! Core never sees these types: it receives a pre-built `MonitorConfig`.

use snmpdash_config::{Config, Profile, load_config, profile_to_monitor_config};
use snmpdash_core::MonitorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Active profile name: `--profile`, else the config's default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Apply `--api-base`, `--ws-url`, `--username`, `--insecure`, and
/// `--timeout` to a profile.
pub fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref api_base) = global.api_base {
        profile.api_base.clone_from(api_base);
    }
    if let Some(ref ws_url) = global.ws_url {
        profile.ws_url.clone_from(ws_url);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    profile
}

/// Build a `MonitorConfig` from the config file, active profile, and flags.
pub fn resolve(global: &GlobalOpts) -> Result<(String, MonitorConfig), CliError> {
    let cfg = load_config()?;
    let (name, profile) = cfg.profile(global.profile.as_deref()).map_err(|e| match e {
        snmpdash_config::ConfigError::UnknownProfile { name } => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            }
        }
        other => other.into(),
    })?;

    let profile = apply_overrides(profile, global);
    let monitor = profile_to_monitor_config(&profile, &name, &cfg.defaults)?;
    Ok((name, monitor))
}
