// ── Runtime monitor configuration ──
//
// Describes *where* the backend lives and how the push channel behaves.
// Carries credentials but never touches disk: the CLI/TUI build a
// `MonitorConfig` (usually through snmpdash-config) and hand it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use snmpdash_api::TlsMode;

/// Session credentials for `POST /auth/signin`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Configuration for one monitored backend.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// REST base, e.g. `http://localhost:8090/api/v1`.
    pub api_base: Url,
    /// STOMP broker endpoint, e.g. `ws://localhost:8090/ws/snmp-data`.
    pub ws_url: Url,
    /// Sign in before connecting. `None` relies on an existing session or
    /// an unauthenticated backend.
    pub credentials: Option<Credentials>,
    pub tls: TlsMode,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Heart-beat interval offered in both directions.
    pub heartbeat: Duration,
    /// Flat delay between push-channel reconnect attempts.
    pub reconnect_delay: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse(snmpdash_api::http::DEFAULT_API_BASE)
                .expect("default API base is a valid URL"),
            ws_url: Url::parse(snmpdash_api::channel::DEFAULT_ENDPOINT)
                .expect("default endpoint is a valid URL"),
            credentials: None,
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            heartbeat: Duration::from_millis(4000),
            reconnect_delay: Duration::from_millis(5000),
        }
    }
}
