//! Shutdown signalling for servers and their connections.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared shutdown state between a server and its connection tasks.
#[derive(Debug, Default)]
struct ShutdownState {
    /// Flag indicating shutdown has been initiated.
    initiated: AtomicBool,
    /// Wakes every task parked in [`ShutdownSignal::wait`].
    notify: Notify,
}

/// A cloneable signal for stopping a server.
///
/// Triggering it stops the accept loop and interrupts every connection
/// blocked on its next frame. Connections are not drained: a frame that
/// races with shutdown is discarded, not reported as an error.
///
/// Multiple clones of this handle can trigger shutdown - only the first
/// one has effect, subsequent calls are no-ops.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    state: Arc<ShutdownState>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers shutdown. Idempotent.
    pub fn shutdown(&self) {
        if !self.state.initiated.swap(true, Ordering::AcqRel) {
            self.state.notify.notify_waiters();
        }
    }

    /// Returns `true` if shutdown has been initiated.
    pub fn is_shutdown(&self) -> bool {
        self.state.initiated.load(Ordering::Acquire)
    }

    /// Completes once shutdown has been initiated.
    pub async fn wait(&self) {
        loop {
            // Must exist before the flag check; notify_waiters() wakes it
            // even before its first poll.
            let notified = self.state.notify.notified();
            if self.is_shutdown() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_after_shutdown() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();
        let task = tokio::spawn(async move { waiter.wait().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        signal.shutdown();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("waiter not woken")
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let signal = ShutdownSignal::new();
        signal.shutdown();
        signal.shutdown();
        assert!(signal.is_shutdown());
        // Already shut down: wait completes immediately
        signal.wait().await;
    }
}
