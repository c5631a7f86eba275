//! Single-shot reconnect timer with a pending guard.
//!
//! Several failure signals can arrive for one broken session (an `ERROR`
//! frame, then the socket error, then the close). Each of them calls
//! [`ReconnectTimer::schedule`], but only the first one arms a timer; the
//! rest are ignored until that timer fires. The delay is flat and attempts
//! are unbounded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct ReconnectTimer {
    delay: Duration,
    pending: Arc<AtomicBool>,
    fire_tx: mpsc::Sender<()>,
    cancel: CancellationToken,
}

impl ReconnectTimer {
    /// Create a timer and the receiver that yields once per fired timer.
    ///
    /// Armed timers stop when `cancel` fires, so teardown never leaves a
    /// reconnect attempt behind.
    pub fn new(delay: Duration, cancel: CancellationToken) -> (Self, mpsc::Receiver<()>) {
        let (fire_tx, fire_rx) = mpsc::channel(1);
        (
            Self {
                delay,
                pending: Arc::new(AtomicBool::new(false)),
                fire_tx,
                cancel,
            },
            fire_rx,
        )
    }

    /// Arm the timer unless one is already pending.
    ///
    /// Returns `true` if this call armed a new timer.
    pub fn schedule(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if self.pending.swap(true, Ordering::SeqCst) {
            tracing::debug!("reconnect already pending");
            return false;
        }

        tracing::info!(
            delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
            "scheduling reconnect"
        );

        let delay = self.delay;
        let pending = Arc::clone(&self.pending);
        let fire_tx = self.fire_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    pending.store(false, Ordering::SeqCst);
                    tracing::debug!("reconnect timer released");
                }
                () = tokio::time::sleep(delay) => {
                    // Cleared before the send: the woken driver may re-arm at once.
                    pending.store(false, Ordering::SeqCst);
                    let _ = fire_tx.try_send(());
                }
            }
        });

        true
    }

    /// Whether a timer is currently armed.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn duplicate_signals_arm_one_timer() {
        let (timer, mut fired) = ReconnectTimer::new(Duration::from_secs(5), CancellationToken::new());

        assert!(timer.schedule());
        assert!(!timer.schedule());
        assert!(!timer.schedule());
        assert!(timer.is_pending());

        // Nothing before the delay elapses.
        let early = tokio::time::timeout(Duration::from_millis(4_999), fired.recv()).await;
        assert!(early.is_err());

        assert_eq!(fired.recv().await, Some(()));
        tokio::task::yield_now().await;
        assert!(fired.try_recv().is_err(), "only one timer should fire");
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_can_be_rearmed_after_firing() {
        let (timer, mut fired) = ReconnectTimer::new(Duration::from_secs(5), CancellationToken::new());

        assert!(timer.schedule());
        assert_eq!(fired.recv().await, Some(()));
        tokio::task::yield_now().await;

        assert!(timer.schedule());
        assert_eq!(fired.recv().await, Some(()));
    }

    #[tokio::test(start_paused = true)]
    async fn fired_timer_is_released_before_the_wake_up() {
        let (timer, mut fired) = ReconnectTimer::new(Duration::from_secs(5), CancellationToken::new());

        assert!(timer.schedule());
        assert_eq!(fired.recv().await, Some(()));
        assert!(!timer.is_pending());
        assert!(timer.schedule(), "a failure right after waking must arm a new timer");
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_releases_pending_timer() {
        let cancel = CancellationToken::new();
        let (timer, mut fired) = ReconnectTimer::new(Duration::from_secs(5), cancel.clone());

        assert!(timer.schedule());
        cancel.cancel();

        let outcome = tokio::time::timeout(Duration::from_secs(10), fired.recv()).await;
        assert!(outcome.is_err(), "a cancelled timer must not fire");
        assert!(!timer.is_pending());
        assert!(!timer.schedule(), "no new timers after teardown");
    }
}
