//! # ARIA client
//!
//! Realtime connection and client-side state for the ARIA home assistant:
//! a reconnecting WebSocket event stream with topic listeners, and a set of
//! state containers (chat, devices, system, settings, memory, event feed)
//! kept in sync over the REST API.
//!
//! ## Example
//!
//! ```no_run
//! use aria_client::{AriaConfig, ClientStateStore, RealtimeConnection, Topic, listener};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AriaConfig::from_env()?;
//!
//!     let connection = RealtimeConnection::from_config(&config)?;
//!     let store = ClientStateStore::from_config(&config)?;
//!     store.bind_realtime(&connection);
//!
//!     connection.on(
//!         Topic::Connected,
//!         listener(|n| println!("connection: {:?}", n)),
//!     );
//!     let _ = connection.connect().await;
//!
//!     store.chat().send_user_message("Turn on the kitchen light").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod infrastructure;
pub mod messaging;
pub mod store;
pub mod types;
pub mod websocket;

pub use client::{ConnectionOptions, ConnectionState, RealtimeConnection};
pub use config::AriaConfig;
pub use infrastructure::ApiClient;
pub use messaging::{EventRouter, Listener, Notification, Topic, listener};
pub use store::{
    Backend, ChatContainer, ClientStateStore, DeviceContainer, EventFeedContainer,
    MemoryContainer, SettingsContainer, SystemContainer,
};
pub use types::{AriaError, Envelope, Result};
