//! STOMP-over-WebSocket push channel with auto-reconnect.
//!
//! Connects to the backend's broker endpoint, subscribes to the three
//! frequency-tier topics, and streams parsed [`InboundEnvelope`]s through a
//! [`tokio::sync::broadcast`] channel. Connection liveness is published as a
//! boolean through a [`tokio::sync::watch`] cell.
//!
//! # Example
//!
//! ```rust,ignore
//! use snmpdash_api::channel::{ChannelConfig, StompChannel};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let channel = StompChannel::new(ChannelConfig::default(), cancel.clone());
//! let mut rx = channel.subscribe();
//! channel.connect();
//!
//! while let Ok(envelope) = rx.recv().await {
//!     println!("{}: {:?}", envelope.kind, envelope.data);
//! }
//!
//! channel.shutdown();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder, Message};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::envelope::{InboundEnvelope, MessageType, Topic};
use crate::error::Error;
use crate::reconnect::ReconnectTimer;
use crate::stomp::{Command, Frame, HEARTBEAT_EOL, HeartBeat};

// ── Broadcast channel capacity ───────────────────────────────────────

const ENVELOPE_CHANNEL_CAPACITY: usize = 1024;

/// Default broker endpoint of the backend.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8090/ws/snmp-data";

// ── ChannelConfig ────────────────────────────────────────────────────

/// Connection settings for the push channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Broker WebSocket URL.
    pub endpoint: Url,

    /// How often we promise to send heart-beats. Default: 4s.
    pub heartbeat_outgoing: Duration,

    /// How often we ask the broker to send heart-beats. Default: 4s.
    pub heartbeat_incoming: Duration,

    /// Flat delay before each reconnect attempt. Default: 5s.
    pub reconnect_delay: Duration,

    /// `Cookie` header for the WebSocket upgrade (session auth).
    pub cookie: Option<String>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            heartbeat_outgoing: Duration::from_millis(4000),
            heartbeat_incoming: Duration::from_millis(4000),
            reconnect_delay: Duration::from_millis(5000),
            cookie: None,
        }
    }
}

// ── StompChannel ─────────────────────────────────────────────────────

/// Handle to the push channel.
///
/// Cheaply cloneable. The first [`connect`](Self::connect) spawns the
/// background driver; [`shutdown`](Self::shutdown) (or cancelling the token
/// passed to [`new`](Self::new)) tears down the live session and any
/// pending reconnect timer.
#[derive(Clone)]
pub struct StompChannel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    config: ChannelConfig,
    envelope_tx: broadcast::Sender<Arc<InboundEnvelope>>,
    connected: watch::Sender<bool>,
    started: AtomicBool,
    cancel: CancellationToken,
}

impl ChannelInner {
    /// Publish a connection-state transition. Unchanged values do not wake
    /// watchers.
    fn set_connected(&self, value: bool) {
        self.connected.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }
}

impl StompChannel {
    pub fn new(config: ChannelConfig, cancel: CancellationToken) -> Self {
        let (envelope_tx, _) = broadcast::channel(ENVELOPE_CHANNEL_CAPACITY);
        let (connected, _) = watch::channel(false);
        Self {
            inner: Arc::new(ChannelInner {
                config,
                envelope_tx,
                connected,
                started: AtomicBool::new(false),
                cancel,
            }),
        }
    }

    /// Start the background driver. Later calls are no-ops.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously. Subscribe before calling this to see every envelope.
    pub fn connect(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("push channel already started");
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(drive(inner));
    }

    /// Get a new broadcast receiver for the envelope sequence.
    ///
    /// The sequence survives reconnects. Envelopes missed while the
    /// channel was down are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<InboundEnvelope>> {
        self.inner.envelope_tx.subscribe()
    }

    /// The envelope sequence as a `Stream`. Lagged envelopes are skipped.
    pub fn envelopes(&self) -> impl Stream<Item = Arc<InboundEnvelope>> + Send + 'static {
        let mut rx = self.subscribe();
        async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(envelope) => yield envelope,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "envelope consumer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    /// Read-only view of the connection flag.
    pub fn connection_state(&self) -> watch::Receiver<bool> {
        self.inner.connected.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.connected.borrow()
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.inner.config
    }

    /// Signal the background driver to shut down.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }
}

// ── Background driver ────────────────────────────────────────────────

/// Main loop: session → on failure, wait for the reconnect timer → session.
async fn drive(inner: Arc<ChannelInner>) {
    let (timer, mut fired) = ReconnectTimer::new(inner.config.reconnect_delay, inner.cancel.clone());

    loop {
        match run_session(&inner, &timer).await {
            Ok(()) => break,
            Err(e) => {
                tracing::warn!(error = %e, "push channel session ended");
                inner.set_connected(false);
                timer.schedule();
            }
        }

        tokio::select! {
            biased;
            () = inner.cancel.cancelled() => break,
            tick = fired.recv() => {
                if tick.is_none() {
                    break;
                }
                tracing::info!("reconnecting push channel");
            }
        }
    }

    inner.set_connected(false);
    tracing::debug!("push channel driver exiting");
}

// ── Single session lifecycle ─────────────────────────────────────────

/// Run one WebSocket + STOMP session until it fails or is cancelled.
///
/// `Ok(())` means cancellation; every other exit is an error that should
/// lead to a reconnect.
#[allow(clippy::too_many_lines)]
async fn run_session(inner: &ChannelInner, timer: &ReconnectTimer) -> Result<(), Error> {
    let config = &inner.config;
    tracing::info!(url = %config.endpoint, "connecting push channel");

    let uri: tungstenite::http::Uri = config
        .endpoint
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(ref cookie) = config.cookie {
        request = request.with_header("Cookie", cookie.clone());
    }

    let ws_stream = tokio::select! {
        biased;
        () = inner.cancel.cancelled() => return Ok(()),
        result = tokio_tungstenite::connect_async(request) => {
            result.map_err(|e| Error::WebSocketConnect(e.to_string()))?.0
        }
    };
    let (mut write, mut read) = ws_stream.split();

    // ── STOMP handshake ──
    let offer = HeartBeat::new(config.heartbeat_outgoing, config.heartbeat_incoming);
    let connect = Frame::connect(&host_header(&config.endpoint), offer);
    write
        .send(Message::text(connect.encode()))
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let connected = loop {
        let message = tokio::select! {
            biased;
            () = inner.cancel.cancelled() => return Ok(()),
            message = read.next() => message,
        };
        let text = match message {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            Some(Ok(Message::Close(frame))) => return Err(closed(frame.as_ref())),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
            None => return Err(closed(None)),
        };
        let frames = Frame::decode_all(&text)?;
        if let Some(frame) = frames.into_iter().find(|f| {
            matches!(f.command, Command::Connected | Command::Error)
        }) {
            if frame.command == Command::Error {
                let message = frame.get("message").unwrap_or("broker refused connection");
                inner.set_connected(false);
                timer.schedule();
                return Err(Error::Stomp {
                    message: message.to_owned(),
                });
            }
            break frame;
        }
    };

    let server_beat = connected.get("heart-beat").map(HeartBeat::parse).unwrap_or_default();
    let (send_every, expect_within) = HeartBeat::negotiate(offer, server_beat);
    tracing::info!(
        version = connected.get("version").unwrap_or("1.2"),
        send_every_ms = send_every.map(|d| d.as_millis()),
        expect_within_ms = expect_within.map(|d| d.as_millis()),
        "push channel connected"
    );
    inner.set_connected(true);

    for topic in Topic::ALL {
        let subscribe = Frame::subscribe(topic.subscription_id(), topic.destination());
        write
            .send(Message::text(subscribe.encode()))
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
        tracing::debug!(destination = topic.destination(), "subscribed");
    }

    // ── Read loop ──
    let mut heartbeat = send_every.map(|every| {
        let mut interval = tokio::time::interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval
    });
    // Twice the negotiated interval before the broker is considered gone.
    let grace = expect_within.map(|d| d * 2);
    let liveness = tokio::time::sleep(grace.unwrap_or(Duration::MAX));
    tokio::pin!(liveness);

    loop {
        tokio::select! {
            biased;

            () = inner.cancel.cancelled() => {
                let _ = write.send(Message::text(Frame::disconnect().encode())).await;
                let _ = write.close().await;
                return Ok(());
            }

            message = read.next() => {
                if let Some(grace) = grace {
                    liveness.as_mut().reset(Instant::now() + grace);
                }
                match message {
                    Some(Ok(Message::Text(text))) => handle_text(inner, timer, text.as_str())?,
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => handle_text(inner, timer, text)?,
                        Err(e) => tracing::warn!(error = %e, "dropping non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Ping(_))) => {
                        // tungstenite queues the pong reply itself
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(Message::Close(frame))) => return Err(closed(frame.as_ref())),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                    None => return Err(closed(None)),
                }
            }

            _ = next_tick(heartbeat.as_mut()) => {
                write
                    .send(Message::text(HEARTBEAT_EOL))
                    .await
                    .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                tracing::trace!("heart-beat sent");
            }

            () = &mut liveness, if grace.is_some() => {
                return Err(Error::WebSocketClosed {
                    code: 1006,
                    reason: "no heart-beat from broker".into(),
                });
            }
        }
    }
}

async fn next_tick(interval: Option<&mut tokio::time::Interval>) -> Instant {
    match interval {
        Some(interval) => interval.tick().await,
        None => std::future::pending().await,
    }
}

fn closed(frame: Option<&tungstenite::protocol::CloseFrame>) -> Error {
    match frame {
        Some(cf) => {
            tracing::info!(code = %cf.code, reason = %cf.reason, "WebSocket close frame received");
            Error::WebSocketClosed {
                code: u16::from(cf.code),
                reason: cf.reason.to_string(),
            }
        }
        None => Error::WebSocketClosed {
            code: 1006,
            reason: "stream ended".into(),
        },
    }
}

/// `host` header for `CONNECT`: the endpoint's authority.
fn host_header(endpoint: &Url) -> String {
    let host = endpoint.host_str().unwrap_or("localhost");
    match endpoint.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    }
}

// ── Frame handling ───────────────────────────────────────────────────

/// Decode one text message and dispatch every frame in it.
fn handle_text(inner: &ChannelInner, timer: &ReconnectTimer, text: &str) -> Result<(), Error> {
    let frames = match Frame::decode_all(text) {
        Ok(frames) => frames,
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable STOMP frame");
            return Ok(());
        }
    };
    for frame in frames {
        handle_frame(inner, timer, &frame)?;
    }
    Ok(())
}

fn handle_frame(inner: &ChannelInner, timer: &ReconnectTimer, frame: &Frame) -> Result<(), Error> {
    match frame.command {
        Command::Message => {
            let topic = frame
                .get("subscription")
                .and_then(Topic::from_header)
                .or_else(|| frame.get("destination").and_then(Topic::from_header));
            let default_type = topic.map_or(MessageType::Unknown, Topic::default_type);

            match InboundEnvelope::from_body(&frame.body, default_type) {
                Ok(envelope) => {
                    tracing::debug!(kind = %envelope.kind, "envelope received");
                    inner.set_connected(true);
                    // No receivers is fine: nobody is rendering right now.
                    let _ = inner.envelope_tx.send(Arc::new(envelope));
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        destination = frame.get("destination").unwrap_or(""),
                        "dropping malformed message body"
                    );
                }
            }
            Ok(())
        }
        Command::Error => {
            let message = frame.get("message").unwrap_or("broker error").to_owned();
            tracing::error!(message = %message, body = %frame.body, "STOMP error frame");
            inner.set_connected(false);
            timer.schedule();
            Err(Error::Stomp { message })
        }
        Command::Receipt => {
            tracing::debug!(receipt = frame.get("receipt-id").unwrap_or(""), "receipt");
            Ok(())
        }
        other => {
            tracing::trace!(command = %other, "ignoring frame");
            Ok(())
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
