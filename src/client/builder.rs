use super::{ClientState, ConnectionManager, RealtimeConnection};
use crate::config::AriaConfig;
use crate::infrastructure::Timer;
use crate::messaging::EventRouter;
use crate::types::{
    AriaError, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY, EVENTS_WS_PATH, Result,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use url::Url;

#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Delay before the first retry; doubles with every further attempt
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl From<&AriaConfig> for ConnectionOptions {
    fn from(config: &AriaConfig) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay,
            max_reconnect_attempts: config.max_reconnect_attempts,
        }
    }
}

/// Builder for RealtimeConnection that handles initialization
pub struct RealtimeConnectionBuilder {
    endpoint: String,
    options: ConnectionOptions,
}

impl RealtimeConnectionBuilder {
    /// Create a new builder from the WebSocket base URL (`ws://host:port`)
    pub fn new(ws_url: impl Into<String>, options: ConnectionOptions) -> Result<Self> {
        let ws_url = ws_url.into();
        let parsed = Url::parse(&ws_url)?;

        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(AriaError::Connection(format!(
                "Event stream URL must use ws:// or wss://, got '{}'",
                ws_url
            )));
        }

        let endpoint = format!("{}{}", ws_url.trim_end_matches('/'), EVENTS_WS_PATH);
        Ok(Self { endpoint, options })
    }

    /// Build the connection and spawn the reconnect watcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> RealtimeConnection {
        let (reconnect_tx, mut reconnect_rx) = mpsc::unbounded_channel();

        let mut client_state = ClientState::new(Timer::new(
            self.options.reconnect_delay,
            self.options.max_reconnect_attempts,
        ));
        client_state.reconnect_tx = Some(reconnect_tx);

        let client = RealtimeConnection {
            endpoint: self.endpoint,
            options: self.options,
            connection: Arc::new(ConnectionManager::new()),
            state: Arc::new(RwLock::new(client_state)),
            router: Arc::new(EventRouter::new()),
        };

        // The watcher only holds weak references, so dropping every
        // RealtimeConnection clone drops the sender and ends this loop.
        // A newer request replaces the one being waited on; only the latest
        // close can still be current.
        let weak = client.downgrade();
        tokio::spawn(async move {
            let mut next = None;
            loop {
                let request = match next.take() {
                    Some(request) => request,
                    None => match reconnect_rx.recv().await {
                        Some(request) => request,
                        None => break,
                    },
                };

                tokio::select! {
                    _ = tokio::time::sleep(request.delay) => {}
                    newer = reconnect_rx.recv() => {
                        match newer {
                            Some(newer) => {
                                tracing::debug!(
                                    "Retry for generation {} superseded by generation {}",
                                    request.generation,
                                    newer.generation
                                );
                                next = Some(newer);
                                continue;
                            }
                            None => break,
                        }
                    }
                }

                let Some(client) = weak.upgrade() else {
                    break;
                };

                if !client.is_retry_current(request.generation).await {
                    tracing::debug!(
                        "Skipping stale retry for generation {}",
                        request.generation
                    );
                    continue;
                }

                tracing::info!("Attempting to reconnect...");
                match client.connect().await {
                    Ok(()) => tracing::info!("Reconnected successfully"),
                    Err(e) => tracing::error!("Reconnection attempt failed: {}", e),
                }
            }
            tracing::info!("Reconnection watcher task finished");
        });

        client
    }
}
