//! Shutdown coordination for the bridge.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::session::LocalSession;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
/// Clones share the same channel.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        // No subscribers left means nothing to stop.
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Trigger `shutdown` once `session` closes, so the HTTP side stops with it.
pub fn trigger_on_session_close(session: LocalSession, shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        session.closed().await;
        tracing::warn!(realm = %session.realm(), "Session closed, stopping HTTP server");
        shutdown.trigger();
    })
}
