// ── Pull + push aggregation ──
//
// Merges the one-shot HTTP pull with the push channel's envelope sequence
// into a single ordered stream of snapshots. The pull result (or its
// fallback) is always first; push snapshots follow in arrival order with
// no deduplication.

use std::future::Future;
use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use snmpdash_api::{InboundEnvelope, MetricsClient, TelemetryRecord};

use crate::error::CoreError;
use crate::model::{DisplayStatus, NetworkMetricsSnapshot, SnapshotSource};
use crate::normalize::from_telemetry;

// ── PullSource ───────────────────────────────────────────────────────

/// Something that can fetch the full current telemetry list once.
pub trait PullSource: Send + Sync + 'static {
    fn fetch_all_metrics(
        &self,
    ) -> impl Future<Output = Result<Vec<TelemetryRecord>, CoreError>> + Send;
}

impl PullSource for MetricsClient {
    async fn fetch_all_metrics(&self) -> Result<Vec<TelemetryRecord>, CoreError> {
        Ok(self.all_metrics().await?)
    }
}

/// One pull, normalized. Failures yield [`NetworkMetricsSnapshot::fallback`].
pub async fn pull_snapshot<P: PullSource>(pull: &P) -> NetworkMetricsSnapshot {
    match pull.fetch_all_metrics().await {
        Ok(records) => {
            debug!(records = records.len(), "pull succeeded");
            from_telemetry(&records, SnapshotSource::Pull)
        }
        Err(e) => {
            warn!(error = %e, "pull failed, using fallback snapshot");
            NetworkMetricsSnapshot::fallback()
        }
    }
}

/// Normalize one push envelope.
///
/// `None` for payloads that are not a record list (pongs, test pings,
/// aggregated shapes). The snapshot is tagged `Push` only while the
/// channel is up.
pub fn push_snapshot(envelope: &InboundEnvelope, connected: bool) -> Option<NetworkMetricsSnapshot> {
    let records = envelope.data.records()?;
    let source = if connected {
        SnapshotSource::Push
    } else {
        SnapshotSource::Pull
    };
    Some(from_telemetry(records, source))
}

/// UI label for the connection flag and the newest snapshot's source.
///
/// A live channel always reads as `push`. A dead one reads as `pull` while
/// pulled (or degraded) data is on screen, else as `disconnected`.
pub fn current_status(connected: bool, latest: Option<SnapshotSource>) -> DisplayStatus {
    match (connected, latest) {
        (true, _) => DisplayStatus::Push,
        (false, Some(SnapshotSource::Pull)) => DisplayStatus::Pull,
        (false, Some(SnapshotSource::Push) | None) => DisplayStatus::Disconnected,
    }
}

// ── MetricsFeed ──────────────────────────────────────────────────────

/// The merged snapshot source handed to a rendering sink.
pub struct MetricsFeed<P> {
    pull: P,
    envelopes: broadcast::Receiver<Arc<InboundEnvelope>>,
    connection: watch::Receiver<bool>,
}

impl<P: PullSource> MetricsFeed<P> {
    /// Envelopes received between construction and the end of the pull are
    /// buffered and delivered right after the pull snapshot.
    pub fn new(
        pull: P,
        envelopes: broadcast::Receiver<Arc<InboundEnvelope>>,
        connection: watch::Receiver<bool>,
    ) -> Self {
        Self {
            pull,
            envelopes,
            connection,
        }
    }

    /// Consume the feed as a stream.
    ///
    /// Ends when `cancel` fires (a pending pull is abandoned) or when the
    /// push channel is dropped.
    pub fn into_stream(
        self,
        cancel: CancellationToken,
    ) -> impl Stream<Item = NetworkMetricsSnapshot> + Send + 'static {
        let Self {
            pull,
            mut envelopes,
            connection,
        } = self;

        async_stream::stream! {
            let first = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                snapshot = pull_snapshot(&pull) => Some(snapshot),
            };
            let Some(first) = first else {
                debug!("feed cancelled before pull completed");
                return;
            };
            yield first;

            loop {
                let received = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    received = envelopes.recv() => received,
                };

                match received {
                    Ok(envelope) => {
                        let connected = *connection.borrow();
                        match push_snapshot(&envelope, connected) {
                            Some(snapshot) => yield snapshot,
                            None => debug!(kind = %envelope.kind, "envelope carries no telemetry"),
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "feed lagged behind push channel");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("feed ended");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use snmpdash_api::{EnvelopeData, MessageType};

    use super::*;

    struct StaticPull(Result<Vec<TelemetryRecord>, ()>);

    impl PullSource for StaticPull {
        async fn fetch_all_metrics(&self) -> Result<Vec<TelemetryRecord>, CoreError> {
            self.0.clone().map_err(|()| CoreError::Api {
                message: "boom".into(),
                status: Some(500),
            })
        }
    }

    /// Never resolves.
    struct StuckPull;

    impl PullSource for StuckPull {
        async fn fetch_all_metrics(&self) -> Result<Vec<TelemetryRecord>, CoreError> {
            std::future::pending().await
        }
    }

    fn envelope(data: EnvelopeData) -> Arc<InboundEnvelope> {
        Arc::new(InboundEnvelope {
            kind: MessageType::HighMetrics,
            data,
            timestamp: 0,
        })
    }

    fn records(tcp: &str) -> EnvelopeData {
        EnvelopeData::Records(vec![TelemetryRecord::reading("tcp_curr_estab", tcp)])
    }

    #[tokio::test]
    async fn pull_failure_emits_fallback_first() {
        let (tx, rx) = broadcast::channel(16);
        let (_state_tx, state) = watch::channel(true);
        tx.send(envelope(records("7"))).unwrap();

        let feed = MetricsFeed::new(StaticPull(Err(())), rx, state);
        let mut stream = Box::pin(feed.into_stream(CancellationToken::new()));

        let mut first = stream.next().await.unwrap();
        let mut expected = NetworkMetricsSnapshot::fallback();
        first.last_update.clear();
        expected.last_update.clear();
        assert_eq!(first, expected);

        let second = stream.next().await.unwrap();
        assert_eq!(second.connections.tcp, 7);
        assert_eq!(second.source, SnapshotSource::Push);
    }

    #[tokio::test]
    async fn pull_precedes_buffered_push() {
        let (tx, rx) = broadcast::channel(16);
        let (_state_tx, state) = watch::channel(true);
        tx.send(envelope(records("1"))).unwrap();

        let pulled = vec![TelemetryRecord::reading("tcp_curr_estab", "42")];
        let feed = MetricsFeed::new(StaticPull(Ok(pulled)), rx, state);
        let snapshots: Vec<_> = feed
            .into_stream(CancellationToken::new())
            .take(2)
            .collect()
            .await;

        assert_eq!(snapshots[0].source, SnapshotSource::Pull);
        assert_eq!(snapshots[0].connections.tcp, 42);
        assert_eq!(snapshots[1].source, SnapshotSource::Push);
        assert_eq!(snapshots[1].connections.tcp, 1);
    }

    #[tokio::test]
    async fn push_while_disconnected_is_tagged_pull() {
        let (tx, rx) = broadcast::channel(16);
        let (state_tx, state) = watch::channel(false);
        tx.send(envelope(records("3"))).unwrap();

        let feed = MetricsFeed::new(StaticPull(Ok(vec![])), rx, state);
        let mut stream = Box::pin(feed.into_stream(CancellationToken::new()));
        stream.next().await.unwrap();

        assert_eq!(stream.next().await.unwrap().source, SnapshotSource::Pull);

        state_tx.send(true).unwrap();
        tx.send(envelope(records("4"))).unwrap();
        assert_eq!(stream.next().await.unwrap().source, SnapshotSource::Push);
    }

    #[tokio::test]
    async fn opaque_envelopes_are_skipped() {
        let (tx, rx) = broadcast::channel(16);
        let (_state_tx, state) = watch::channel(true);
        tx.send(envelope(EnvelopeData::Opaque(json!({ "type": "PONG" }))))
            .unwrap();
        tx.send(envelope(records("2"))).unwrap();
        drop(tx);

        let feed = MetricsFeed::new(StaticPull(Ok(vec![])), rx, state);
        let snapshots: Vec<_> = feed.into_stream(CancellationToken::new()).collect().await;

        assert_eq!(snapshots.len(), 2, "pull + one push, stream ends on close");
        assert_eq!(snapshots[1].connections.tcp, 2);
    }

    #[test]
    fn push_batch_with_numeric_ids_normalizes() {
        let body = r#"[{"id":1,"metricType":"tcp_curr_estab","value":"5"},{"metricType":"arp_table_entry","value":"0"}]"#;
        let envelope = InboundEnvelope::from_body(body, MessageType::HighMetrics).unwrap();

        let snap = push_snapshot(&envelope, true).unwrap();
        assert_eq!(snap.connections.tcp, 5);
        assert_eq!(snap.device_status.online(), 1);
        assert_eq!(snap.device_status.warning(), 1);
        assert_eq!(snap.source, SnapshotSource::Push);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_abandons_pending_pull() {
        let (_tx, rx) = broadcast::channel::<Arc<InboundEnvelope>>(16);
        let (_state_tx, state) = watch::channel(false);
        let cancel = CancellationToken::new();

        let feed = MetricsFeed::new(StuckPull, rx, state);
        let mut stream = Box::pin(feed.into_stream(cancel.clone()));

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        });

        assert!(stream.next().await.is_none());
        canceller.await.unwrap();
    }

    #[test]
    fn status_labels() {
        assert_eq!(current_status(true, None), DisplayStatus::Push);
        assert_eq!(current_status(true, Some(SnapshotSource::Pull)), DisplayStatus::Push);
        assert_eq!(current_status(false, Some(SnapshotSource::Pull)), DisplayStatus::Pull);
        assert_eq!(current_status(false, None), DisplayStatus::Disconnected);
    }
}
