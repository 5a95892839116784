// Module declarations
mod builder;
mod connection;
mod realtime;
mod state;

// Public API exports
pub use builder::{ConnectionOptions, RealtimeConnectionBuilder};
pub use connection::{ConnectionManager, ConnectionState};
pub use realtime::RealtimeConnection;
pub use state::{ClientState, ReconnectRequest};
