// Messaging module - Listener registry and envelope routing
pub mod event;
pub mod router;

pub use event::{Notification, Topic};
pub use router::{EventRouter, Listener, listener};
