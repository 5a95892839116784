use crate::types::{Result, WS_CLOSE_NORMAL};
use crate::websocket::WsStream;
use futures::SinkExt;
use futures::stream::SplitSink;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

/// Lifecycle of the event stream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected, or explicitly disconnected
    Idle,
    Connecting,
    Open,
    /// Dropped; a retry may be pending
    Closed,
    /// Dropped and out of retries until `connect()` is called again
    Exhausted,
}

type WsWriter = SplitSink<WsStream, Message>;

/// Owns the write half of the transport and the connection state
pub struct ConnectionManager {
    ws_write: Arc<RwLock<Option<WsWriter>>>,
    state: Arc<RwLock<ConnectionState>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            ws_write: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(ConnectionState::Idle)),
        }
    }

    /// Sets the WebSocket write sink (called after successful connection)
    pub async fn set_writer(&self, writer: WsWriter) {
        *self.ws_write.write().await = Some(writer);
    }

    /// Gets the current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Sets the connection state
    pub async fn set_state(&self, new_state: ConnectionState) {
        let mut state = self.state.write().await;
        if *state != new_state {
            tracing::debug!("Connection state {:?} -> {:?}", *state, new_state);
        }
        *state = new_state;
    }

    /// Checks if currently connected
    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Open
    }

    /// Writes a text frame if a writer is present
    pub async fn send_text(&self, text: String) -> Result<()> {
        let mut ws_guard = self.ws_write.write().await;
        if let Some(ws) = ws_guard.as_mut() {
            ws.send(Message::Text(text.into())).await?;
        }
        Ok(())
    }

    /// Sends a normal close frame and drops the writer
    pub async fn close(&self) -> Result<()> {
        let mut ws_guard = self.ws_write.write().await;
        if let Some(mut ws) = ws_guard.take() {
            let frame = CloseFrame {
                code: CloseCode::from(WS_CLOSE_NORMAL),
                reason: "client disconnect".into(),
            };
            ws.send(Message::Close(Some(frame))).await?;
        }
        Ok(())
    }

    /// Clears the writer (used when the peer closed the transport)
    pub async fn clear_writer(&self) {
        *self.ws_write.write().await = None;
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
