// ── Monitor facade ──
//
// Owns the HTTP client, the push channel, and the root cancellation token
// for one backend. Consumers (CLI/TUI) build a `MonitorConfig`, call
// `start()`, and drain `snapshots()` into a sink.

use std::sync::{Arc, OnceLock};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use snmpdash_api::{ChannelConfig, MetricsClient, StompChannel, TransportConfig};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::feed::{MetricsFeed, pull_snapshot};
use crate::model::NetworkMetricsSnapshot;

/// Entry point for consumers.
///
/// Cheaply cloneable. Does nothing on construction; [`start`](Self::start)
/// signs in and connects the push channel.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    client: MetricsClient,
    channel: OnceLock<StompChannel>,
    /// Stands in for the channel's flag until `start()` runs.
    idle_state: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
            cookie_jar: None,
        }
        .with_cookie_jar();
        let client = MetricsClient::new(config.api_base.clone(), &transport)?;
        let (idle_state, _) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(MonitorInner {
                config,
                client,
                channel: OnceLock::new(),
                idle_state,
                cancel: CancellationToken::new(),
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// The HTTP client, for the auth and address endpoints.
    pub fn client(&self) -> &MetricsClient {
        &self.inner.client
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Sign in (when credentials are configured) and start the push
    /// channel. Calling it again is a no-op.
    ///
    /// Only sign-in failures are reported; the channel connects and
    /// reconnects in the background.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.channel.get().is_some() {
            debug!("monitor already started");
            return Ok(());
        }

        let config = &self.inner.config;
        if let Some(ref creds) = config.credentials {
            self.inner
                .client
                .sign_in(&creds.username, &creds.password)
                .await?;
            info!(username = %creds.username, "signed in");
        }

        let channel_config = ChannelConfig {
            endpoint: config.ws_url.clone(),
            heartbeat_outgoing: config.heartbeat,
            heartbeat_incoming: config.heartbeat,
            reconnect_delay: config.reconnect_delay,
            cookie: self.inner.client.cookie_header(),
        };
        let channel = StompChannel::new(channel_config, self.inner.cancel.child_token());

        if self.inner.channel.set(channel.clone()).is_err() {
            debug!("monitor started concurrently");
            return Ok(());
        }
        channel.connect();
        Ok(())
    }

    /// Cancel everything: pending pulls, every snapshot stream, the push
    /// session, and any armed reconnect timer.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    // ── Data access ──────────────────────────────────────────────────

    /// The merged pull + push snapshot stream.
    ///
    /// Before `start()` only the pull snapshot is produced.
    pub fn snapshots(&self) -> impl Stream<Item = NetworkMetricsSnapshot> + Send + 'static {
        let cancel = self.inner.cancel.child_token();
        let client = self.inner.client.clone();
        let feed = if let Some(channel) = self.inner.channel.get() {
            MetricsFeed::new(client, channel.subscribe(), channel.connection_state())
        } else {
            // A sender-less receiver: the feed ends right after the pull.
            let (_, envelopes) = tokio::sync::broadcast::channel(1);
            MetricsFeed::new(client, envelopes, self.inner.idle_state.subscribe())
        };
        feed.into_stream(cancel)
    }

    /// One pull, normalized, with the fallback on failure.
    pub async fn current(&self) -> NetworkMetricsSnapshot {
        pull_snapshot(&self.inner.client).await
    }

    /// Read-only view of the push channel's connection flag.
    pub fn connection_state(&self) -> watch::Receiver<bool> {
        match self.inner.channel.get() {
            Some(channel) => channel.connection_state(),
            None => self.inner.idle_state.subscribe(),
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.connection_state().borrow()
    }
}
