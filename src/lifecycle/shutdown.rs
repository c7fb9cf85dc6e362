//! Stop signal shared by the ping scheduler and the pong server.

use tokio::sync::broadcast;

/// One-shot stop signal fanned out to every long-running task.
///
/// The ping scheduler stops ticking and drains in-flight probes when it fires; the
/// pong server stops accepting and finishes open requests.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for a task started after this call; earlier signals are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Harmless when nothing is listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Tasks still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
