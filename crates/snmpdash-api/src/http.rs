// HTTP client for the backend's REST surface
//
// One reqwest client with a shared cookie jar serves the telemetry pull
// and the session-auth endpoints. The session cookie set by sign-in is
// also exported as a `Cookie` header for the WebSocket upgrade.

use reqwest::cookie::CookieStore;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{AuthStatus, IpAddressResponse, SignUpRequest, TelemetryRecord};
use crate::transport::TransportConfig;

/// Default REST base of the backend.
pub const DEFAULT_API_BASE: &str = "http://localhost:8090/api/v1";

/// Client for `{api_base}/all-metrics` and `{api_base}/auth/*`.
#[derive(Clone)]
pub struct MetricsClient {
    http: reqwest::Client,
    api_base: Url,
    transport: TransportConfig,
}

impl MetricsClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// A cookie jar is added if the config has none; session auth needs it.
    pub fn new(api_base: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let transport = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = transport.build_client()?;
        Ok(Self {
            http,
            api_base: normalize_base(api_base),
            transport,
        })
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{api_base}/{path}`, keeping any path prefix on the base.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.api_base.join(path.trim_start_matches('/'))?)
    }

    // ── Telemetry ────────────────────────────────────────────────────

    /// `GET /all-metrics`: every latest reading the backend holds.
    pub async fn all_metrics(&self) -> Result<Vec<TelemetryRecord>, Error> {
        let url = self.url("all-metrics")?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        parse_json(resp).await
    }

    // ── Session auth ─────────────────────────────────────────────────

    /// `POST /auth/signin`. On success the session cookie lands in the jar.
    pub async fn sign_in(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.url("auth/signin")?;
        debug!("signing in at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });
        let resp = self.http.post(url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("sign-in failed (HTTP {status}): {body}"),
            });
        }

        debug!("sign-in successful");
        Ok(())
    }

    /// `POST /auth/signup`. Returns the backend's response body verbatim.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<serde_json::Value, Error> {
        let url = self.url("auth/signup")?;
        debug!("POST {}", url);
        let resp = self.http.post(url).json(request).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        // Some backends answer sign-up with plain text.
        Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body)))
    }

    /// `POST /auth/signout`. The backend clears the session cookie.
    pub async fn sign_out(&self) -> Result<(), Error> {
        let url = self.url("auth/signout")?;
        debug!("signing out at {}", url);
        let resp = self.http.post(url).json(&json!({})).send().await?;
        check_status(resp).await?;
        debug!("sign-out complete");
        Ok(())
    }

    /// `GET /auth/check`. Any failure reads as "not authenticated".
    pub async fn check_auth(&self) -> bool {
        let outcome = async {
            let url = self.url("auth/check")?;
            let resp = self.http.get(url).send().await?;
            parse_json::<AuthStatus>(resp).await
        }
        .await;

        match outcome {
            Ok(status) => status.authenticated,
            Err(e) => {
                debug!(error = %e, "auth check failed");
                false
            }
        }
    }

    /// `GET /auth/ip-address`: the backend's view of our address.
    pub async fn ip_address(&self) -> Result<String, Error> {
        let url = self.url("auth/ip-address")?;
        let resp = self.http.get(url).send().await?;
        let body: IpAddressResponse = parse_json(resp).await?;
        Ok(body.ip_address)
    }

    /// The jar's cookies for the backend origin, formatted as a `Cookie`
    /// header value. `None` before sign-in.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.transport.cookie_jar.as_ref()?;
        let value = jar.cookies(&self.api_base)?;
        value.to_str().ok().map(str::to_owned)
    }
}

/// Ensure the base ends with `/` so `join` appends instead of replacing.
fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Map non-success statuses to typed errors.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("session rejected (HTTP {status})"),
        });
    }
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(resp)
}

async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let resp = check_status(resp).await?;
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
