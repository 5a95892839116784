use serde::{Deserialize, Serialize};

use crate::types::constants::envelope_types;

/// Tagged wrapper received over the event stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(r#type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            r#type: r#type.into(),
            payload,
        }
    }

    /// Whether this envelope carries a home event
    pub fn is_event(&self) -> bool {
        self.r#type == envelope_types::EVENT
    }
}
