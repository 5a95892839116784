//! Request and response bodies of the ARIA REST API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<Value>>,
    #[serde(default)]
    pub tool_results: Option<Vec<Value>>,
}

/// Detailed backend status, replaced wholesale on every fetch.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct SystemStatus {
    pub status: String,
    #[serde(default)]
    pub ollama_connected: bool,
    #[serde(default)]
    pub database_connected: bool,
    #[serde(default)]
    pub active_tools: Vec<String>,
    #[serde(default)]
    pub uptime_seconds: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct SystemHealth {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct SystemLogs {
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A smart home device as listed by the backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Device {
    pub entity_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "state_as_string")]
    pub state: String,
    /// Any other fields the backend attaches (type hints, attributes)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            name: None,
            state: state.into(),
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Domain part of the entity id (`light` for `light.kitchen`)
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map(|(domain, _)| domain)
            .unwrap_or(&self.entity_id)
    }
}

// The context-backed listing passes raw home state values through, which are
// not always strings.
fn state_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(state_to_string(Value::deserialize(deserializer)?))
}

pub(crate) fn state_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeviceActionRequest {
    pub entity_id: String,
    pub action: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct DeviceActionResponse {
    #[serde(default)]
    pub entity_id: String,
    #[serde(default)]
    pub action: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A home event, as logged through the REST API and pushed over the stream.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HomeEvent {
    pub event_type: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventRequest {
    pub event_type: String,
    pub source: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct RecentEvents {
    #[serde(default)]
    pub events: Vec<HomeEvent>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MemorySearchRequest {
    pub query: String,
    pub collection: String,
    pub n_results: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MemoryResult {
    pub document: String,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct MemorySearchResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub results: Vec<MemoryResult>,
    #[serde(default)]
    pub count: usize,
}

/// Backend's view of the home: entity id to whatever state it last recorded
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct HomeState {
    #[serde(default)]
    pub home_state: Map<String, Value>,
}

impl HomeState {
    /// State of `entity_id` as a device state string.
    ///
    /// Entries recorded as objects contribute their `state` field.
    pub fn entity_state(&self, entity_id: &str) -> Option<String> {
        match self.home_state.get(entity_id)? {
            Value::Object(fields) => fields.get("state").cloned().map(state_to_string),
            value => Some(state_to_string(value.clone())),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WorkingMemoryEntry {
    pub role: String,
    pub content: String,
}

/// Conversation context the backend currently feeds the model
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct WorkingMemory {
    #[serde(default)]
    pub working_memory: Vec<WorkingMemoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_keeps_unknown_fields() {
        let device: Device = serde_json::from_value(json!({
            "entity_id": "light.living_room",
            "name": "Living Room Light",
            "state": "off",
            "brightness": 120
        }))
        .unwrap();

        assert_eq!(device.name.as_deref(), Some("Living Room Light"));
        assert_eq!(device.state, "off");
        assert_eq!(device.extra.get("brightness"), Some(&json!(120)));
        assert_eq!(device.domain(), "light");
    }

    #[test]
    fn test_device_state_accepts_non_string_values() {
        let device: Device =
            serde_json::from_value(json!({"entity_id": "sensor.temp", "state": 21.5})).unwrap();
        assert_eq!(device.state, "21.5");
        assert_eq!(device.name, None);
    }

    #[test]
    fn test_chat_response_tolerates_missing_tool_fields() {
        let response: ChatResponse =
            serde_json::from_value(json!({"response": "hi", "session_id": "s1"})).unwrap();
        assert_eq!(response.session_id.as_deref(), Some("s1"));
        assert_eq!(response.tool_calls, None);
    }

    #[test]
    fn test_chat_request_sends_null_session() {
        let body = serde_json::to_value(ChatRequest {
            message: "hello".to_string(),
            session_id: None,
            stream: false,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"message": "hello", "session_id": null, "stream": false})
        );
    }

    #[test]
    fn test_home_state_entries_read_as_device_states() {
        let home: HomeState = serde_json::from_value(json!({
            "home_state": {
                "light.kitchen": "on",
                "sensor.temp": 19.5,
                "climate.hall": {"state": "heat", "target": 21}
            }
        }))
        .unwrap();

        assert_eq!(home.entity_state("light.kitchen").as_deref(), Some("on"));
        assert_eq!(home.entity_state("sensor.temp").as_deref(), Some("19.5"));
        assert_eq!(home.entity_state("climate.hall").as_deref(), Some("heat"));
        assert_eq!(home.entity_state("lock.front"), None);
    }

    #[test]
    fn test_working_memory_decodes_entries() {
        let memory: WorkingMemory = serde_json::from_value(json!({
            "working_memory": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();
        assert_eq!(memory.working_memory[0].role, "user");

        let empty: WorkingMemory = serde_json::from_value(json!({})).unwrap();
        assert!(empty.working_memory.is_empty());
    }
}
