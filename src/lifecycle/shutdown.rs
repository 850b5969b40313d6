//! Shutdown coordination.
//!
//! The balancer has two long-running tasks: the HTTP server and the health
//! monitor. The monitor is started from inside the server, after `main` has
//! already triggered or subscribed, so the signal is level-triggered: a
//! receiver created after `trigger` still observes it.

use tokio::sync::watch;

/// Owner side of the shutdown signal.
///
/// Dropping the coordinator counts as a trigger.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a receiver for one task.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Tell the server to drain and the health monitor to stop.
    /// Repeated calls are no-ops.
    pub fn trigger(&self) {
        let fired = self.tx.send_if_modified(|stopped| !std::mem::replace(stopped, true));
        if fired {
            tracing::info!("Shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side, held by the server and the health monitor.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered, immediately if it already
    /// was, or once the coordinator is gone.
    pub async fn recv(&mut self) {
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}
