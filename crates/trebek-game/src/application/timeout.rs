//! Per-question timeouts.
//!
//! A timeout is a pair: the [`TimeoutGuard`] stays with the round state and
//! the [`TimeoutSignal`] goes to the task that waits. Cancelling or dropping
//! the guard wakes the waiting task early; cancelling after the timeout
//! already fired does nothing.

use std::time::Duration;

use tokio::sync::oneshot;

/// Default time allowed to answer a question.
pub const DEFAULT_QUESTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Cancellation side of an armed timeout.
#[derive(Debug)]
pub struct TimeoutGuard {
    cancel: oneshot::Sender<()>,
}

/// Waiting side of an armed timeout.
#[derive(Debug)]
pub struct TimeoutSignal {
    cancelled: oneshot::Receiver<()>,
}

/// Creates a linked guard and signal.
#[must_use]
pub fn timeout_pair() -> (TimeoutGuard, TimeoutSignal) {
    let (cancel, cancelled) = oneshot::channel();
    (TimeoutGuard { cancel }, TimeoutSignal { cancelled })
}

impl TimeoutGuard {
    /// Cancels the timeout. A no-op if it already fired.
    pub fn cancel(self) {
        let _ = self.cancel.send(());
    }

    /// Returns `true` if the waiting side is gone (fired or abandoned).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cancel.is_closed()
    }
}

impl TimeoutSignal {
    /// Waits for `after` to elapse. Returns `true` if the timeout fired and
    /// `false` if it was cancelled first.
    pub async fn expired(mut self, after: Duration) -> bool {
        tokio::select! {
            biased;
            _ = &mut self.cancelled => false,
            () = tokio::time::sleep(after) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_duration() {
        let (_guard, signal) = timeout_pair();

        assert!(signal.expired(Duration::from_secs(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wakes_waiter_early() {
        let (guard, signal) = timeout_pair();
        let waiter = tokio::spawn(signal.expired(Duration::from_secs(30)));

        tokio::time::sleep(Duration::from_secs(1)).await;
        guard.cancel();

        assert!(!waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_guard_cancels() {
        let (guard, signal) = timeout_pair();
        drop(guard);

        assert!(!signal.expired(Duration::from_secs(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_noop() {
        let (guard, signal) = timeout_pair();
        assert!(signal.expired(Duration::from_secs(1)).await);

        assert!(guard.is_finished());
        guard.cancel();
    }
}
