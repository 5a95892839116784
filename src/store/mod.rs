// Store module - Topic-scoped state containers fed by REST calls and pushed events
mod backend;
pub mod chat;
pub mod devices;
pub mod events;
pub mod memory;
pub mod settings;
pub mod system;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::Backend;
pub use chat::{ChatContainer, ChatMessage, ChatState, MessageMetadata, Role};
pub use devices::{DeviceContainer, DeviceState};
pub use events::{EventFeedContainer, EventFeedState};
pub use memory::{MemoryContainer, MemoryState};
pub use settings::{Settings, SettingsContainer, Theme, default_settings_path};
pub use system::{SystemContainer, SystemState};

use crate::client::RealtimeConnection;
use crate::config::AriaConfig;
use crate::infrastructure::ApiClient;
use crate::messaging::{Listener, Notification, Topic, listener};
use crate::types::api::HomeEvent;
use crate::types::{DEFAULT_STATUS_POLL_INTERVAL, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Every state container, sharing one backend.
///
/// Containers are independent: an action on one never touches another,
/// except through [`bind_realtime`](Self::bind_realtime) which feeds pushed
/// events into the device registry and the event feed.
#[derive(Clone)]
pub struct ClientStateStore {
    chat: ChatContainer,
    devices: DeviceContainer,
    system: SystemContainer,
    settings: SettingsContainer,
    memory: MemoryContainer,
    events: EventFeedContainer,
    status_poll_interval: Duration,
}

impl ClientStateStore {
    pub fn new(backend: Arc<dyn Backend>, settings: SettingsContainer) -> Self {
        Self {
            chat: ChatContainer::new(Arc::clone(&backend)),
            devices: DeviceContainer::new(Arc::clone(&backend)),
            system: SystemContainer::new(Arc::clone(&backend)),
            memory: MemoryContainer::new(Arc::clone(&backend)),
            events: EventFeedContainer::new(backend),
            settings,
            status_poll_interval: Duration::from_millis(DEFAULT_STATUS_POLL_INTERVAL),
        }
    }

    /// Build the store over the HTTP API described by `config`
    pub fn from_config(config: &AriaConfig) -> Result<Self> {
        let backend: Arc<dyn Backend> = Arc::new(ApiClient::new(config)?);
        let mut store = Self::new(backend, SettingsContainer::from_config(config));
        store.status_poll_interval = config.status_poll_interval;
        Ok(store)
    }

    pub fn chat(&self) -> &ChatContainer {
        &self.chat
    }

    pub fn devices(&self) -> &DeviceContainer {
        &self.devices
    }

    pub fn system(&self) -> &SystemContainer {
        &self.system
    }

    pub fn settings(&self) -> &SettingsContainer {
        &self.settings
    }

    pub fn memory(&self) -> &MemoryContainer {
        &self.memory
    }

    pub fn events(&self) -> &EventFeedContainer {
        &self.events
    }

    /// Poll system status at the configured interval
    pub fn spawn_status_poller(&self) -> JoinHandle<()> {
        self.system.spawn_status_poller(self.status_poll_interval)
    }

    /// Feed `event` notifications from `connection` into the device registry
    /// and the event feed.
    ///
    /// Returns the registered listener; pass it to
    /// [`RealtimeConnection::off`] with [`Topic::Event`] to unbind.
    pub fn bind_realtime(&self, connection: &RealtimeConnection) -> Listener {
        let devices = self.devices.clone();
        let events = self.events.clone();

        let handle = listener(move |notification| {
            let Notification::Event(payload) = notification else {
                return;
            };

            match serde_json::from_value::<HomeEvent>(payload.clone()) {
                Ok(event) => {
                    tracing::debug!("Applying pushed event {}", event.event_type);
                    devices.apply_event(&event);
                    events.push(event);
                }
                Err(e) => {
                    tracing::warn!("Ignoring event payload that is not a home event: {}", e);
                }
            }
        });

        connection.on(Topic::Event, Arc::clone(&handle));
        handle
    }
}
