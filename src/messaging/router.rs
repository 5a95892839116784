use super::{Notification, Topic};
use crate::types::Envelope;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

/// Callback registered for a topic. Identity is the allocation behind the `Arc`.
pub type Listener = Arc<dyn Fn(&Notification) + Send + Sync + 'static>;

/// Wrap a closure into a [`Listener`] handle
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Notification) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    // Compare data pointers only; vtable pointers are not guaranteed unique.
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Routes incoming frames and connection notifications to registered listeners
#[derive(Default)]
pub struct EventRouter {
    listeners: Mutex<HashMap<Topic, Vec<Listener>>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Topic, Vec<Listener>>> {
        // A listener never runs under this lock, so poisoning only means a
        // panic inside a plain Vec operation; the map is still usable.
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a listener; duplicates are kept and invoked once per registration
    pub fn on(&self, topic: Topic, listener: Listener) {
        self.lock().entry(topic).or_default().push(listener);
    }

    /// Remove the first registration of `listener` for `topic`, if any
    pub fn off(&self, topic: Topic, listener: &Listener) {
        let mut listeners = self.lock();
        if let Some(callbacks) = listeners.get_mut(&topic)
            && let Some(index) = callbacks.iter().position(|cb| same_listener(cb, listener))
        {
            callbacks.remove(index);
        }
    }

    /// Number of listeners currently registered for `topic`
    pub fn listener_count(&self, topic: Topic) -> usize {
        self.lock().get(&topic).map_or(0, Vec::len)
    }

    /// Deliver a notification to every listener of its topic.
    ///
    /// Listeners are invoked over a snapshot taken before the first call, so a
    /// listener may add or remove registrations (including itself) without
    /// affecting who receives this notification. A listener that panics is
    /// logged and skipped; the remaining listeners still run.
    pub fn emit(&self, notification: Notification) {
        let topic = notification.topic();
        let snapshot: Vec<Listener> = match self.lock().get(&topic) {
            Some(callbacks) if !callbacks.is_empty() => callbacks.clone(),
            _ => return,
        };

        tracing::trace!("Dispatching {} to {} listener(s)", topic, snapshot.len());
        for callback in snapshot {
            // A panicking listener must not take the read task down with it.
            if panic::catch_unwind(AssertUnwindSafe(|| callback(&notification))).is_err() {
                tracing::error!("Listener for {} panicked", topic);
            }
        }
    }

    /// Parse a text frame and fan it out.
    ///
    /// Unparseable frames are logged and produce no notification.
    pub fn route_text(&self, text: &str) {
        let envelope = match serde_json::from_str::<Envelope>(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!("Failed to parse message: {} - Raw: {}", e, text);
                return;
            }
        };

        tracing::debug!("Routing envelope: type={}", envelope.r#type);

        let event_payload = envelope.is_event().then(|| envelope.payload.clone());
        self.emit(Notification::Message(envelope));

        if let Some(payload) = event_payload {
            self.emit(Notification::Event(payload));
        }
    }
}
