//! Shared configuration for the snmpdash CLI and TUI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `snmpdash_core::MonitorConfig`. Both binaries depend on
//! this crate; the CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use snmpdash_core::{Credentials, MonitorConfig, TlsMode};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "snmpdash";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SNMPDASH_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// REST base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// STOMP-over-WebSocket endpoint.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Username for session sign-in. No username means no sign-in.
    pub username: Option<String>,

    /// Password (plaintext; prefer the keyring or `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Heart-beat interval in milliseconds, both directions.
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,

    /// Delay between push-channel reconnect attempts.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// HTTP timeout override, seconds.
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            ws_url: default_ws_url(),
            username: None,
            password: None,
            password_env: None,
            heartbeat_ms: default_heartbeat_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:8090/api/v1".into()
}
fn default_ws_url() -> String {
    "ws://localhost:8090/ws/snmp-data".into()
}
fn default_heartbeat_ms() -> u64 {
    4000
}
fn default_reconnect_delay_ms() -> u64 {
    5000
}

impl Config {
    /// The profile to use: `requested`, else `default_profile`, else
    /// `"default"`. A missing `"default"` falls back to built-in defaults
    /// so the tool works with no config file at all.
    pub fn profile(&self, requested: Option<&str>) -> Result<(String, Profile), ConfigError> {
        let name = requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());

        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile.clone())),
            None if requested.is_none() => Ok((name, Profile::default())),
            None => Err(ConfigError::UnknownProfile { name }),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$SNMPDASH_CONFIG`, else the platform
/// config dir.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "snmpdash", "snmpdash").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("snmpdash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if present), then
/// `SNMPDASH_*` environment variables (`__` separates nested keys).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SNMPDASH_").split("__").ignore(&["config", "password", "username"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve sign-in credentials without CLI flags.
///
/// No username (in the profile or `SNMPDASH_USERNAME`) means no sign-in.
/// With a username, the password comes from the profile's `password_env`,
/// then `SNMPDASH_PASSWORD`, then the keyring, then plaintext.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<Credentials>, ConfigError> {
    let Some(username) = profile
        .username
        .clone()
        .or_else(|| std::env::var("SNMPDASH_USERNAME").ok())
    else {
        return Ok(None);
    };

    let password = resolve_password(profile, profile_name)?;
    Ok(Some(Credentials { username, password }))
}

fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(pw) = std::env::var("SNMPDASH_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the OS keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Profile → MonitorConfig ─────────────────────────────────────────

fn parse_url(field: &str, value: &str) -> Result<url::Url, ConfigError> {
    value.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {value}"),
    })
}

/// Build a `MonitorConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_monitor_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<MonitorConfig, ConfigError> {
    let api_base = parse_url("api_base", &profile.api_base)?;
    let ws_url = parse_url("ws_url", &profile.ws_url)?;
    if !matches!(ws_url.scheme(), "ws" | "wss") {
        return Err(ConfigError::Validation {
            field: "ws_url".into(),
            reason: format!("expected ws:// or wss://, got {ws_url}"),
        });
    }
    if profile.reconnect_delay_ms == 0 {
        return Err(ConfigError::Validation {
            field: "reconnect_delay_ms".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let credentials = resolve_credentials(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    Ok(MonitorConfig {
        api_base,
        ws_url,
        credentials,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        heartbeat: Duration::from_millis(profile.heartbeat_ms),
        reconnect_delay: Duration::from_millis(profile.reconnect_delay_ms),
    })
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        Jail::expect_with(|jail| {
            let cfg = load_config_from(&jail.directory().join("absent.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.default_profile.as_deref(), Some("default"));
            assert!(cfg.profiles.is_empty());

            let (name, profile) = cfg.profile(None).map_err(|e| e.to_string())?;
            assert_eq!(name, "default");
            assert_eq!(profile.api_base, "http://localhost:8090/api/v1");
            assert_eq!(profile.ws_url, "ws://localhost:8090/ws/snmp-data");
            Ok(())
        });
    }

    #[test]
    fn profile_from_file_with_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "lab"

                [profiles.lab]
                api_base = "https://lab.example.com/api/v1"
                ws_url = "wss://lab.example.com/ws/snmp-data"
                username = "ops"
                password = "plain"
                heartbeat_ms = 10000
                "#,
            )?;
            jail.set_env("SNMPDASH_DEFAULTS__TIMEOUT", "5");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.defaults.timeout, 5);

            let (name, profile) = cfg.profile(None).map_err(|e| e.to_string())?;
            assert_eq!(name, "lab");
            assert_eq!(profile.reconnect_delay_ms, 5000);

            let monitor = profile_to_monitor_config(&profile, &name, &cfg.defaults)
                .map_err(|e| e.to_string())?;
            assert_eq!(monitor.api_base.as_str(), "https://lab.example.com/api/v1");
            assert_eq!(monitor.heartbeat, Duration::from_secs(10));
            assert_eq!(monitor.timeout, Duration::from_secs(5));
            let creds = monitor.credentials.ok_or("credentials missing")?;
            assert_eq!(creds.username, "ops");
            Ok(())
        });
    }

    #[test]
    fn password_env_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("LAB_PW", "from-env");
            let profile = Profile {
                username: Some("ops".into()),
                password: Some("plain".into()),
                password_env: Some("LAB_PW".into()),
                ..Profile::default()
            };
            let creds = resolve_credentials(&profile, "lab")
                .map_err(|e| e.to_string())?
                .ok_or("credentials missing")?;
            assert_eq!(creds.password.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn no_username_means_no_sign_in() {
        let creds = resolve_credentials(&Profile::default(), "default").unwrap();
        assert!(creds.is_none());
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.profile(Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn http_ws_url_is_rejected() {
        let profile = Profile {
            ws_url: "http://localhost:8090/ws".into(),
            ..Profile::default()
        };
        let err = profile_to_monitor_config(&profile, "default", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "ws_url"));
    }

    #[test]
    fn round_trips_through_toml() {
        Jail::expect_with(|jail| {
            let mut cfg = Config::default();
            cfg.profiles.insert(
                "default".into(),
                Profile {
                    username: Some("admin".into()),
                    ..Profile::default()
                },
            );
            let path = jail.directory().join("nested").join("config.toml");
            save_config_to(&cfg, &path).map_err(|e| e.to_string())?;

            let loaded = load_config_from(&path).map_err(|e| e.to_string())?;
            let (_, profile) = loaded.profile(None).map_err(|e| e.to_string())?;
            assert_eq!(profile.username.as_deref(), Some("admin"));
            Ok(())
        });
    }
}
