use super::state::ReconnectRequest;
use super::{
    ClientState, ConnectionManager, ConnectionOptions, ConnectionState, RealtimeConnectionBuilder,
};
use crate::config::AriaConfig;
use crate::messaging::{EventRouter, Listener, Notification, Topic};
use crate::types::Result;
use crate::websocket::{WebSocketFactory, WsStream};
use futures::stream::{SplitStream, StreamExt};
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;

/// Persistent connection to the ARIA event stream.
///
/// `RealtimeConnection` owns a single WebSocket to `<ws_url>/api/events/ws`,
/// reconnects with exponential backoff when the server drops it, and fans
/// incoming envelopes out to listeners registered with [`on`](Self::on).
///
/// Clones share the same underlying connection.
///
/// # Example
///
/// ```no_run
/// use aria_client::{RealtimeConnection, ConnectionOptions, Topic, listener};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let connection = RealtimeConnection::new("ws://localhost:8000", ConnectionOptions::default())?;
///
/// connection.on(Topic::Event, listener(|notification| {
///     println!("home event: {:?}", notification);
/// }));
///
/// connection.connect().await?;
/// // ...
/// connection.disconnect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeConnection {
    pub(crate) endpoint: String,
    pub(crate) options: ConnectionOptions,

    // Connection manager
    pub(crate) connection: Arc<ConnectionManager>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,

    pub(crate) router: Arc<EventRouter>,
}

/// Non-owning handle used by background tasks
pub(crate) struct WeakConnection {
    endpoint: String,
    options: ConnectionOptions,
    connection: Weak<ConnectionManager>,
    state: Weak<RwLock<ClientState>>,
    router: Weak<EventRouter>,
}

impl WeakConnection {
    pub(crate) fn upgrade(&self) -> Option<RealtimeConnection> {
        Some(RealtimeConnection {
            endpoint: self.endpoint.clone(),
            options: self.options.clone(),
            connection: self.connection.upgrade()?,
            state: self.state.upgrade()?,
            router: self.router.upgrade()?,
        })
    }
}

impl RealtimeConnection {
    /// Creates a new connection to the event stream under `ws_url`.
    ///
    /// This does not open the socket; call [`connect()`](Self::connect).
    /// Must be called from within a Tokio runtime since it spawns the
    /// reconnect watcher.
    ///
    /// # Errors
    ///
    /// Returns [`AriaError::UrlParse`](crate::AriaError::UrlParse) for a malformed
    /// URL and [`AriaError::Connection`](crate::AriaError::Connection) for a
    /// non-WebSocket scheme.
    pub fn new(ws_url: impl Into<String>, options: ConnectionOptions) -> Result<Self> {
        RealtimeConnectionBuilder::new(ws_url, options).map(|builder| builder.build())
    }

    pub fn from_config(config: &AriaConfig) -> Result<Self> {
        Self::new(config.ws_url.clone(), ConnectionOptions::from(config))
    }

    pub(crate) fn downgrade(&self) -> WeakConnection {
        WeakConnection {
            endpoint: self.endpoint.clone(),
            options: self.options.clone(),
            connection: Arc::downgrade(&self.connection),
            state: Arc::downgrade(&self.state),
            router: Arc::downgrade(&self.router),
        }
    }

    /// Full event stream URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Register a listener for `topic`
    pub fn on(&self, topic: Topic, listener: Listener) {
        self.router.on(topic, listener);
    }

    /// Remove a listener previously registered for `topic`
    pub fn off(&self, topic: Topic, listener: &Listener) {
        self.router.off(topic, listener);
    }

    /// Opens the event stream.
    ///
    /// Returns immediately if the connection is already open or connecting.
    /// On success the reconnect counter is reset and `Connected(true)` is
    /// emitted. A failed handshake emits `Error` and `Connected(false)`,
    /// schedules a retry, and is returned to the caller for information; no
    /// action is required since the retry runs on its own.
    pub async fn connect(&self) -> Result<()> {
        let generation = {
            let mut state = self.state.write().await;
            let current = self.connection.state().await;
            if current == ConnectionState::Open || current == ConnectionState::Connecting {
                return Ok(());
            }

            self.connection.set_state(ConnectionState::Connecting).await;
            state.was_manual_disconnect = false;
            state.generation += 1;
            state.generation
        };

        tracing::info!("Connecting to {}", self.endpoint);

        let ws_stream = match WebSocketFactory::create(&self.endpoint).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Connection failed: {}", e);
                self.router.emit(Notification::Error(e.to_string()));
                self.handle_closed(generation).await;
                return Err(e);
            }
        };
        let (write_half, read_half) = ws_stream.split();

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::info!("Connection superseded during handshake, dropping it");
            return Ok(());
        }

        self.connection.set_writer(write_half).await;
        self.connection.set_state(ConnectionState::Open).await;
        state.timer.reset();

        tracing::info!("Connected to event stream");
        self.router.emit(Notification::Connected(true));

        let router = Arc::clone(&self.router);
        let weak = self.downgrade();
        state
            .task_manager
            .spawn(read_loop(read_half, router, weak, generation));

        Ok(())
    }

    /// Closes the event stream without triggering reconnection.
    ///
    /// Cancels any pending retry and resets the backoff schedule. Calling it
    /// again, or on a connection that never opened, does nothing.
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        let previous = self.connection.state().await;

        state.was_manual_disconnect = true;
        state.generation += 1;
        state.timer.reset();
        state.task_manager.abort_all();

        if previous == ConnectionState::Idle {
            return;
        }

        tracing::info!("Disconnecting from event stream");
        if let Err(e) = self.connection.close().await {
            tracing::warn!("Close handshake failed: {}", e);
        }
        self.connection.set_state(ConnectionState::Idle).await;

        if previous == ConnectionState::Open {
            self.router.emit(Notification::Connected(false));
        }
        tracing::info!("Disconnected from event stream");
    }

    /// Serializes `data` and sends it if the connection is open.
    ///
    /// Sends while not connected are dropped silently; nothing is queued.
    /// Only a serialization failure is returned as an error.
    pub async fn send<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        let json = serde_json::to_string(data)?;

        if !self.is_connected().await {
            tracing::debug!("Dropping send while not connected");
            return Ok(());
        }

        if let Err(e) = self.connection.send_text(json).await {
            tracing::warn!("Failed to send message: {}", e);
        }
        Ok(())
    }

    pub async fn state(&self) -> ConnectionState {
        self.connection.state().await
    }

    /// Checks whether the event stream is currently open.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Retries scheduled since the last successful connect
    pub async fn reconnect_attempts(&self) -> u32 {
        self.state.read().await.timer.attempts()
    }

    /// Whether a retry scheduled for `generation` should still run
    pub(crate) async fn is_retry_current(&self, generation: u64) -> bool {
        let state = self.state.read().await;
        state.generation == generation
            && !state.was_manual_disconnect
            && self.connection.state().await == ConnectionState::Closed
    }

    /// Transport for `generation` went away: notify and schedule a retry
    pub(crate) async fn handle_closed(&self, generation: u64) {
        let mut state = self.state.write().await;
        if state.generation != generation || state.was_manual_disconnect {
            tracing::debug!("Ignoring close of superseded connection {}", generation);
            return;
        }

        self.connection.clear_writer().await;
        self.connection.set_state(ConnectionState::Closed).await;
        tracing::info!("Disconnected from event stream");
        self.router.emit(Notification::Connected(false));

        self.schedule_reconnect(&mut state, generation).await;
    }

    async fn schedule_reconnect(&self, state: &mut ClientState, generation: u64) {
        match state.timer.next_delay() {
            Some(delay) => {
                tracing::info!(
                    "Reconnecting in {}ms (attempt {})",
                    delay.as_millis(),
                    state.timer.attempts()
                );
                state.request_reconnect(ReconnectRequest { generation, delay });
            }
            None => {
                tracing::info!("Max reconnection attempts reached");
                self.connection.set_state(ConnectionState::Exhausted).await;
            }
        }
    }
}

async fn read_loop(
    mut read_half: SplitStream<WsStream>,
    router: Arc<EventRouter>,
    weak: WeakConnection,
    generation: u64,
) {
    tracing::info!("Starting read task");
    while let Some(msg_result) = read_half.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                tracing::debug!("Received text message: {}", text.as_str());
                router.route_text(text.as_str());
            }
            Ok(Message::Close(frame)) => {
                if let Some(close_frame) = frame {
                    tracing::info!(
                        "Server closed connection: code={:?}, reason='{}'",
                        close_frame.code,
                        close_frame.reason
                    );
                } else {
                    tracing::warn!("Server closed connection without close frame");
                }
                break;
            }
            Ok(Message::Ping(data)) => {
                tracing::debug!("Received ping ({} bytes)", data.len());
            }
            Ok(Message::Pong(data)) => {
                tracing::debug!("Received pong ({} bytes)", data.len());
            }
            Ok(Message::Binary(data)) => {
                tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
            }
            Ok(Message::Frame(_)) => {
                tracing::debug!("Received raw frame (internal)");
            }
            Err(e) => {
                tracing::error!("WebSocket read error: {}", e);
                router.emit(Notification::Error(e.to_string()));
                break;
            }
        }
    }
    tracing::info!("Read task finished");

    if let Some(client) = weak.upgrade() {
        client.handle_closed(generation).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::listener;
    use futures::SinkExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio::time::{Instant, timeout};

    enum ServerMode {
        /// Send these frames, then keep the socket open
        SendThenHold(Vec<String>),
        /// Close the first connection immediately, hold later ones
        CloseFirst,
        /// Close every connection right after the handshake
        CloseAll,
        /// Forward every received text frame
        Record(mpsc::UnboundedSender<String>),
    }

    async fn spawn_server(mode: ServerMode) -> (String, Arc<AtomicUsize>) {
        let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = tcp.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        let mode = Arc::new(mode);

        tokio::spawn(async move {
            while let Ok((stream, _)) = tcp.accept().await {
                let nth = counter.fetch_add(1, Ordering::SeqCst);
                let mode = Arc::clone(&mode);
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    match mode.as_ref() {
                        ServerMode::SendThenHold(frames) => {
                            for frame in frames {
                                let _ = ws.send(Message::Text(frame.clone().into())).await;
                            }
                        }
                        ServerMode::CloseFirst if nth == 0 => {
                            let _ = ws.close(None).await;
                            return;
                        }
                        ServerMode::CloseFirst => {}
                        ServerMode::CloseAll => {
                            let _ = ws.close(None).await;
                            return;
                        }
                        ServerMode::Record(tx) => {
                            while let Some(Ok(msg)) = ws.next().await {
                                if let Message::Text(text) = msg {
                                    let _ = tx.send(text.as_str().to_string());
                                }
                            }
                            return;
                        }
                    }
                    while let Some(Ok(_)) = ws.next().await {}
                });
            }
        });

        (format!("ws://{}", addr), accepted)
    }

    fn options(delay_ms: u64, max_attempts: u32) -> ConnectionOptions {
        ConnectionOptions {
            reconnect_delay: Duration::from_millis(delay_ms),
            max_reconnect_attempts: max_attempts,
        }
    }

    fn record_all(connection: &RealtimeConnection) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        for topic in [Topic::Connected, Topic::Message, Topic::Event, Topic::Error] {
            let tx = tx.clone();
            connection.on(
                topic,
                listener(move |n| {
                    let _ = tx.send(n.clone());
                }),
            );
        }
        rx
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Notification {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("listener channel closed")
    }

    async fn wait_for_state(connection: &RealtimeConnection, wanted: ConnectionState) {
        timeout(Duration::from_secs(5), async {
            while connection.state().await != wanted {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for connection state");
    }

    #[tokio::test]
    async fn test_connect_routes_frames_and_skips_garbage() {
        let payload = json!({"event_type": "door_opened", "source": "sensor.front_door"});
        let (url, _) = spawn_server(ServerMode::SendThenHold(vec![
            "definitely not json".to_string(),
            json!({"type": "event", "payload": payload.clone()}).to_string(),
        ]))
        .await;

        let connection = RealtimeConnection::new(url, options(10, 5)).unwrap();
        let mut rx = record_all(&connection);

        connection.connect().await.unwrap();
        assert_eq!(connection.state().await, ConnectionState::Open);

        assert_eq!(next(&mut rx).await, Notification::Connected(true));
        match next(&mut rx).await {
            Notification::Message(envelope) => {
                assert_eq!(envelope.r#type, "event");
                assert_eq!(envelope.payload, payload);
            }
            other => panic!("expected message, got {:?}", other),
        }
        assert_eq!(next(&mut rx).await, Notification::Event(payload));

        connection.disconnect().await;
        assert_eq!(next(&mut rx).await, Notification::Connected(false));
        assert_eq!(connection.state().await, ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_connect_while_open_is_noop() {
        let (url, accepted) = spawn_server(ServerMode::SendThenHold(vec![])).await;
        let connection = RealtimeConnection::new(url, options(10, 5)).unwrap();

        connection.connect().await.unwrap();
        connection.connect().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        connection.disconnect().await;
    }

    #[tokio::test]
    async fn test_disconnect_does_not_reconnect() {
        let (url, accepted) = spawn_server(ServerMode::SendThenHold(vec![])).await;
        let connection = RealtimeConnection::new(url, options(10, 5)).unwrap();

        connection.connect().await.unwrap();
        connection.disconnect().await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert_eq!(connection.state().await, ConnectionState::Idle);
        assert_eq!(connection.reconnect_attempts().await, 0);

        // idempotent
        connection.disconnect().await;
        assert_eq!(connection.state().await, ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_server_close_triggers_reconnect_and_resets_counter() {
        let (url, accepted) = spawn_server(ServerMode::CloseFirst).await;
        let connection = RealtimeConnection::new(url, options(20, 5)).unwrap();
        let mut rx = record_all(&connection);

        connection.connect().await.unwrap();

        assert_eq!(next(&mut rx).await, Notification::Connected(true));
        assert_eq!(next(&mut rx).await, Notification::Connected(false));
        assert_eq!(next(&mut rx).await, Notification::Connected(true));

        assert_eq!(accepted.load(Ordering::SeqCst), 2);
        assert_eq!(connection.reconnect_attempts().await, 0);
        assert!(connection.is_connected().await);

        connection.disconnect().await;
    }

    async fn next_matching(
        rx: &mut mpsc::UnboundedReceiver<Notification>,
        wanted: &Notification,
    ) -> Instant {
        loop {
            if &next(rx).await == wanted {
                return Instant::now();
            }
        }
    }

    #[tokio::test]
    async fn test_disconnect_during_backoff_cancels_retry() {
        let (url, accepted) = spawn_server(ServerMode::CloseFirst).await;
        let connection = RealtimeConnection::new(url, options(200, 5)).unwrap();
        let mut rx = record_all(&connection);

        connection.connect().await.unwrap();
        assert_eq!(next(&mut rx).await, Notification::Connected(true));
        assert_eq!(next(&mut rx).await, Notification::Connected(false));
        assert_eq!(connection.state().await, ConnectionState::Closed);
        assert_eq!(connection.reconnect_attempts().await, 1);

        connection.disconnect().await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert_eq!(connection.state().await, ConnectionState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancelled_retry_does_not_delay_next_one() {
        let base = Duration::from_millis(400);
        let (url, _) = spawn_server(ServerMode::CloseAll).await;
        let connection = RealtimeConnection::new(url, options(400, 5)).unwrap();
        let mut rx = record_all(&connection);

        connection.connect().await.unwrap();
        next_matching(&mut rx, &Notification::Connected(false)).await;

        // retry #1 is now waiting; replace it with a fresh manual cycle
        connection.disconnect().await;
        connection.connect().await.unwrap();
        let dropped = next_matching(&mut rx, &Notification::Connected(false)).await;
        let reopened = next_matching(&mut rx, &Notification::Connected(true)).await;

        let gap = reopened - dropped;
        assert!(gap >= base - Duration::from_millis(20), "gap {:?}", gap);
        assert!(gap < base + Duration::from_millis(250), "gap {:?}", gap);

        connection.disconnect().await;
    }

    #[tokio::test]
    async fn test_retry_delays_double_per_attempt() {
        let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = dead.local_addr().unwrap();
        drop(dead);

        let base = Duration::from_millis(250);
        let connection = RealtimeConnection::new(format!("ws://{}", addr), options(250, 3)).unwrap();
        let mut rx = record_all(&connection);

        let failure = Notification::Connected(false);
        let _ = connection.connect().await;
        let mut previous = next_matching(&mut rx, &failure).await;

        for attempt in 1..=3u32 {
            let failed = next_matching(&mut rx, &failure).await;
            let expected = base * 2u32.pow(attempt - 1);
            let gap = failed - previous;
            assert!(
                gap >= expected - Duration::from_millis(20),
                "attempt {} waited {:?}, expected {:?}",
                attempt,
                gap,
                expected
            );
            assert!(
                gap < expected + Duration::from_millis(250),
                "attempt {} waited {:?}, expected {:?}",
                attempt,
                gap,
                expected
            );
            previous = failed;
        }

        wait_for_state(&connection, ConnectionState::Exhausted).await;
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_exhausts_retries() {
        let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = dead.local_addr().unwrap();
        drop(dead);

        let connection = RealtimeConnection::new(format!("ws://{}", addr), options(5, 3)).unwrap();
        let mut rx = record_all(&connection);

        assert!(connection.connect().await.is_err());
        wait_for_state(&connection, ConnectionState::Exhausted).await;
        assert_eq!(connection.reconnect_attempts().await, 3);

        // no retry is scheduled past the maximum
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(connection.state().await, ConnectionState::Exhausted);

        let mut dropped = 0;
        let mut errors = 0;
        while let Ok(notification) = rx.try_recv() {
            match notification {
                Notification::Connected(false) => dropped += 1,
                Notification::Error(_) => errors += 1,
                other => panic!("unexpected notification {:?}", other),
            }
        }
        // initial attempt plus three retries
        assert_eq!(dropped, 4);
        assert_eq!(errors, 4);
    }

    #[tokio::test]
    async fn test_manual_connect_after_exhaustion_restarts_cycle() {
        let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = dead.local_addr().unwrap();
        drop(dead);

        let connection = RealtimeConnection::new(format!("ws://{}", addr), options(5, 1)).unwrap();
        let _ = connection.connect().await;
        wait_for_state(&connection, ConnectionState::Exhausted).await;

        // still unreachable: the manual attempt fails and stays exhausted
        assert!(connection.connect().await.is_err());
        assert_eq!(connection.state().await, ConnectionState::Exhausted);
        assert_eq!(connection.reconnect_attempts().await, 1);
    }

    #[tokio::test]
    async fn test_send_only_transmits_while_open() {
        let (tx, mut received) = mpsc::unbounded_channel();
        let (url, _) = spawn_server(ServerMode::Record(tx)).await;
        let connection = RealtimeConnection::new(url, options(10, 5)).unwrap();

        connection.send(&json!({"type": "early"})).await.unwrap();

        connection.connect().await.unwrap();
        connection.send(&json!({"type": "ping"})).await.unwrap();

        let text = timeout(Duration::from_secs(5), received.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(text, r#"{"type":"ping"}"#);

        connection.disconnect().await;
        connection.send(&json!({"type": "late"})).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(received.try_recv().is_err());
    }
}
