// ── Core error types ──
//
// User-facing errors from snmpdash-core. Consumers never match on HTTP
// status codes or socket errors directly; `From<snmpdash_api::Error>`
// folds them into the variants below.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Push channel error: {message}")]
    Channel { message: String },

    // ── Backend errors ───────────────────────────────────────────────
    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    #[error("Unexpected response from backend: {message}")]
    InvalidResponse { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// `true` when signing in again could fix this.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<snmpdash_api::Error> for CoreError {
    fn from(err: snmpdash_api::Error) -> Self {
        use snmpdash_api::Error as Api;

        match err {
            Api::Authentication { message } => CoreError::AuthenticationFailed { message },
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            Api::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            Api::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            Api::WebSocketConnect(reason) => CoreError::Channel {
                message: format!("connection failed: {reason}"),
            },
            Api::WebSocketClosed { code, reason } => CoreError::Channel {
                message: format!("closed (code {code}): {reason}"),
            },
            Api::Stomp { message } => CoreError::Channel { message },
            Api::Deserialization { message, body: _ } => CoreError::InvalidResponse { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_stay_auth_errors() {
        let err = CoreError::from(snmpdash_api::Error::Authentication {
            message: "expired".into(),
        });
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "Authentication failed: expired");
    }

    #[test]
    fn api_status_is_kept() {
        let err = CoreError::from(snmpdash_api::Error::Api {
            status: 502,
            message: "bad gateway".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(502), .. }));
    }

    #[test]
    fn stomp_errors_map_to_channel() {
        let err = CoreError::from(snmpdash_api::Error::Stomp {
            message: "session closed".into(),
        });
        assert_eq!(err.to_string(), "Push channel error: session closed");
    }
}
