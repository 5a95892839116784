use super::Backend;
use crate::types::api::{Device, DeviceActionRequest, DeviceActionResponse, HomeEvent};
use crate::types::{Result, device_actions, device_status};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    /// Keyed by entity id
    pub devices: BTreeMap<String, Device>,
    /// Where the last listing came from (`home_assistant`, `context`, ...)
    pub source: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
    fetch_generation: u64,
}

impl DeviceState {
    pub fn get(&self, entity_id: &str) -> Option<&Device> {
        self.devices.get(entity_id)
    }
}

/// Registry of smart home devices
#[derive(Clone)]
pub struct DeviceContainer {
    backend: Arc<dyn Backend>,
    state: Arc<watch::Sender<DeviceState>>,
}

impl DeviceContainer {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Arc::new(watch::Sender::new(DeviceState::default())),
        }
    }

    pub fn snapshot(&self) -> DeviceState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceState> {
        self.state.subscribe()
    }

    /// Replace the registry with the backend's listing.
    ///
    /// On failure the previous registry is kept. Only the most recently
    /// started fetch is applied.
    pub async fn fetch_devices(&self) -> Result<()> {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.fetch_generation += 1;
            state.is_loading = true;
            state.error = None;
            generation = state.fetch_generation;
        });

        let result = self.backend.list_devices().await;

        self.state.send_if_modified(|state| {
            if state.fetch_generation != generation {
                tracing::debug!("Discarding superseded device listing");
                return false;
            }
            state.is_loading = false;
            match &result {
                Ok(list) => {
                    state.devices = list
                        .devices
                        .iter()
                        .map(|device| (device.entity_id.clone(), device.clone()))
                        .collect();
                    state.source = list.source.clone();
                }
                Err(err) => {
                    tracing::warn!("Failed to fetch devices: {}", err);
                    state.error = Some(err.to_string());
                }
            }
            true
        });

        result.map(|_| ())
    }

    /// Ask the backend to act on a device.
    ///
    /// The local state only changes when the backend reports `success` or
    /// `simulated`; any other status is returned untouched.
    pub async fn control_device(
        &self,
        entity_id: &str,
        action: &str,
        value: Option<String>,
    ) -> Result<DeviceActionResponse> {
        let request = DeviceActionRequest {
            entity_id: entity_id.to_string(),
            action: action.to_string(),
            value,
        };

        match self.backend.control_device(request).await {
            Ok(response) => {
                if matches!(
                    response.status.as_str(),
                    device_status::SUCCESS | device_status::SIMULATED
                ) {
                    let new_state = if action == device_actions::TURN_ON {
                        "on"
                    } else {
                        "off"
                    };
                    self.update_device_state(entity_id, new_state);
                } else {
                    tracing::info!(
                        "Device {} answered {} with status '{}'",
                        entity_id,
                        action,
                        response.status
                    );
                }
                Ok(response)
            }
            Err(err) => {
                tracing::warn!("Failed to control device {}: {}", entity_id, err);
                self.state
                    .send_modify(|state| state.error = Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Refresh known devices from the backend's recorded home state.
    ///
    /// Entities the registry does not list are skipped. Returns how many
    /// devices changed.
    pub async fn sync_home_state(&self) -> Result<usize> {
        let home = match self.backend.home_state().await {
            Ok(home) => home,
            Err(err) => {
                tracing::warn!("Failed to fetch home state: {}", err);
                self.state
                    .send_modify(|state| state.error = Some(err.to_string()));
                return Err(err);
            }
        };

        let mut changed = 0;
        self.state.send_if_modified(|state| {
            for (entity_id, device) in state.devices.iter_mut() {
                if let Some(new_state) = home.entity_state(entity_id)
                    && device.state != new_state
                {
                    device.state = new_state;
                    changed += 1;
                }
            }
            changed > 0
        });

        tracing::debug!("Home state sync updated {} device(s)", changed);
        Ok(changed)
    }

    /// Set the state of a known device. Unknown ids are ignored.
    pub fn update_device_state(&self, entity_id: &str, new_state: &str) -> bool {
        self.state.send_if_modified(|state| {
            match state.devices.get_mut(entity_id) {
                Some(device) if device.state != new_state => {
                    device.state = new_state.to_string();
                    true
                }
                _ => false,
            }
        })
    }

    /// Apply a pushed home event to the registry.
    ///
    /// The device is taken from `data.entity_id`, falling back to the event
    /// source, and the new state from `data.state` or `data.new_state`.
    pub fn apply_event(&self, event: &HomeEvent) -> bool {
        let entity_id = event
            .data
            .get("entity_id")
            .and_then(Value::as_str)
            .or(event.source.as_deref());

        let new_state = ["state", "new_state"]
            .iter()
            .find_map(|key| event.data.get(*key).and_then(Value::as_str));

        match (entity_id, new_state) {
            (Some(entity_id), Some(new_state)) => self.update_device_state(entity_id, new_state),
            _ => false,
        }
    }
}
