pub mod api;
pub mod constants;
pub mod error;
pub mod message;

pub use constants::*;
pub use error::{AriaError, Result};
pub use message::Envelope;
