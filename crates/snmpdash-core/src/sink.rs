// ── Rendering sink contract ──

use futures_core::Stream;
use futures_util::StreamExt;

use crate::model::NetworkMetricsSnapshot;

/// A consumer of snapshots: a terminal view, a line printer, a test probe.
///
/// Called once per snapshot in delivery order. Implementations must not
/// block; the last snapshot delivered is the one to show.
pub trait SnapshotSink {
    fn update_snapshot(&mut self, snapshot: &NetworkMetricsSnapshot);
}

impl<S: SnapshotSink + ?Sized> SnapshotSink for &mut S {
    fn update_snapshot(&mut self, snapshot: &NetworkMetricsSnapshot) {
        (**self).update_snapshot(snapshot);
    }
}

impl SnapshotSink for Vec<NetworkMetricsSnapshot> {
    fn update_snapshot(&mut self, snapshot: &NetworkMetricsSnapshot) {
        self.push(snapshot.clone());
    }
}

/// Forward every snapshot from `stream` into `sink` until the stream ends.
///
/// Returns the number of snapshots delivered.
pub async fn drive<S, K>(stream: S, sink: &mut K) -> usize
where
    S: Stream<Item = NetworkMetricsSnapshot>,
    K: SnapshotSink + ?Sized,
{
    let mut stream = std::pin::pin!(stream);
    let mut delivered = 0;
    while let Some(snapshot) = stream.next().await {
        sink.update_snapshot(&snapshot);
        delivered += 1;
    }
    tracing::debug!(delivered, "snapshot stream ended");
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SnapshotSource;

    /// Keeps only the latest snapshot, like a real view.
    #[derive(Default)]
    struct Latest(Option<NetworkMetricsSnapshot>);

    impl SnapshotSink for Latest {
        fn update_snapshot(&mut self, snapshot: &NetworkMetricsSnapshot) {
            self.0 = Some(snapshot.clone());
        }
    }

    fn snapshot(tcp: u64, source: SnapshotSource) -> NetworkMetricsSnapshot {
        let mut snap = NetworkMetricsSnapshot::fallback();
        snap.connections.tcp = tcp;
        snap.source = source;
        snap
    }

    #[tokio::test]
    async fn last_write_wins() {
        let stream = futures_util::stream::iter(vec![
            snapshot(1, SnapshotSource::Pull),
            snapshot(2, SnapshotSource::Push),
        ]);
        let mut sink = Latest::default();

        assert_eq!(drive(stream, &mut sink).await, 2);
        let latest = sink.0.unwrap();
        assert_eq!(latest.connections.tcp, 2);
        assert_eq!(latest.source, SnapshotSource::Push);
    }

    #[tokio::test]
    async fn vec_sink_records_in_order() {
        let stream = futures_util::stream::iter(vec![
            snapshot(5, SnapshotSource::Pull),
            snapshot(6, SnapshotSource::Push),
            snapshot(7, SnapshotSource::Push),
        ]);
        let mut seen = Vec::new();
        drive(stream, &mut seen).await;

        let tcp: Vec<_> = seen.iter().map(|s| s.connections.tcp).collect();
        assert_eq!(tcp, [5, 6, 7]);
    }
}
