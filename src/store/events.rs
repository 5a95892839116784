use super::Backend;
use crate::types::api::{EventRequest, HomeEvent};
use crate::types::{DEFAULT_EVENT_FEED_CAPACITY, Result};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct EventFeedState {
    /// Oldest first
    pub events: VecDeque<HomeEvent>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Bounded feed of recent home events
#[derive(Clone)]
pub struct EventFeedContainer {
    backend: Arc<dyn Backend>,
    capacity: usize,
    state: Arc<watch::Sender<EventFeedState>>,
}

impl EventFeedContainer {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_capacity(backend, DEFAULT_EVENT_FEED_CAPACITY)
    }

    pub fn with_capacity(backend: Arc<dyn Backend>, capacity: usize) -> Self {
        Self {
            backend,
            capacity: capacity.max(1),
            state: Arc::new(watch::Sender::new(EventFeedState::default())),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> EventFeedState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EventFeedState> {
        self.state.subscribe()
    }

    /// Replace the feed with the backend's most recent events
    pub async fn fetch_recent(&self, limit: u32) -> Result<()> {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let result = self.backend.recent_events(limit).await;
        let capacity = self.capacity;

        self.state.send_modify(|state| {
            state.is_loading = false;
            match &result {
                Ok(recent) => {
                    let skip = recent.events.len().saturating_sub(capacity);
                    state.events = recent.events.iter().skip(skip).cloned().collect();
                }
                Err(err) => {
                    tracing::warn!("Failed to fetch recent events: {}", err);
                    state.error = Some(err.to_string());
                }
            }
        });

        result.map(|_| ())
    }

    /// Log an event with the backend.
    ///
    /// The echoed record is returned but not added to the feed; it arrives
    /// through the event stream like any other event.
    pub async fn log_event(
        &self,
        event_type: &str,
        source: Option<&str>,
        data: Option<Value>,
    ) -> Result<HomeEvent> {
        let request = EventRequest {
            event_type: event_type.to_string(),
            source: source.map(str::to_string),
            data,
        };

        self.backend.log_event(request).await.inspect_err(|err| {
            tracing::warn!("Failed to log event {}: {}", event_type, err);
            self.state
                .send_modify(|state| state.error = Some(err.to_string()));
        })
    }

    /// Append an event, dropping the oldest beyond capacity
    pub fn push(&self, event: HomeEvent) {
        let capacity = self.capacity;
        self.state.send_modify(|state| {
            state.events.push_back(event);
            while state.events.len() > capacity {
                state.events.pop_front();
            }
        });
    }
}
