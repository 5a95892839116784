use crate::infrastructure::{TaskManager, Timer};
use std::time::Duration;
use tokio::sync::mpsc;

/// A retry the reconnect watcher should run after `delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectRequest {
    /// Generation of the connection that closed
    pub generation: u64,
    pub delay: Duration,
}

/// Consolidated mutable state for RealtimeConnection
/// Using a single struct reduces lock contention
pub struct ClientState {
    /// Bumped on every connect attempt and on disconnect; stale work compares against it
    pub generation: u64,

    /// Reconnect attempt counter and backoff schedule
    pub timer: Timer,

    /// Background task manager (read task)
    pub task_manager: TaskManager,

    /// Whether the disconnect was manual (prevents auto-reconnect)
    pub was_manual_disconnect: bool,

    /// Sender feeding the reconnect watcher
    pub reconnect_tx: Option<mpsc::UnboundedSender<ReconnectRequest>>,
}

impl ClientState {
    pub fn new(timer: Timer) -> Self {
        Self {
            generation: 0,
            timer,
            task_manager: TaskManager::new(),
            was_manual_disconnect: false,
            reconnect_tx: None,
        }
    }

    /// Hand a retry to the reconnect watcher
    pub fn request_reconnect(&self, request: ReconnectRequest) {
        if let Some(tx) = &self.reconnect_tx
            && tx.send(request).is_err()
        {
            tracing::debug!(
                "Reconnect watcher stopped, dropping retry for generation {}",
                request.generation
            );
        }
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new(Timer::default())
    }
}
