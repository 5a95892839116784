use crate::types::Envelope;
use crate::types::constants::topics;
use serde::{Deserialize, Serialize};

/// Named channel listeners subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Connection opened (`true`) or dropped (`false`)
    Connected,
    /// Every parsed envelope
    Message,
    /// Payload of envelopes whose type is `event`
    Event,
    /// Non-fatal transport errors
    Error,
}

impl Topic {
    /// Parse a topic name, `None` for unknown names
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            topics::CONNECTED => Some(Self::Connected),
            topics::MESSAGE => Some(Self::Message),
            topics::EVENT => Some(Self::Event),
            topics::ERROR => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => topics::CONNECTED,
            Self::Message => topics::MESSAGE,
            Self::Event => topics::EVENT,
            Self::Error => topics::ERROR,
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a listener receives
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Connected(bool),
    Message(Envelope),
    Event(serde_json::Value),
    Error(String),
}

impl Notification {
    /// The topic this notification is delivered on
    pub fn topic(&self) -> Topic {
        match self {
            Self::Connected(_) => Topic::Connected,
            Self::Message(_) => Topic::Message,
            Self::Event(_) => Topic::Event,
            Self::Error(_) => Topic::Error,
        }
    }
}
