//! Notification bus abstraction.
//!
//! The orchestrator never talks to a concrete transport; it emits onto an
//! [`EventBus`] and the hosting shell decides where notifications go
//! (webview bridge, IPC, test capture).

use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Trait for emitting notifications to the rendering collaborator.
pub trait EventBus: Send + Sync {
    /// Emit a notification on `topic` with a JSON payload.
    fn emit(&self, topic: &str, payload: serde_json::Value);
}

/// Type alias for a shared event bus reference.
pub type EventBusRef = Arc<dyn EventBus>;

/// Serialize `event` and emit it on `topic`.
///
/// Serialization of our own DTOs cannot fail; the fallback drops the
/// notification rather than panicking in an emission path.
pub fn emit_event<E: Serialize>(bus: &dyn EventBus, topic: &str, event: &E) {
    if let Ok(payload) = serde_json::to_value(event) {
        bus.emit(topic, payload);
    }
}

/// Capturing bus for tests: records every emission for later inspection.
#[derive(Default)]
pub struct InMemoryEventBus {
    recorded: Mutex<Vec<EmittedEvent>>,
}

/// A captured notification from [`InMemoryEventBus`].
#[derive(Debug, Clone)]
pub struct EmittedEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured notifications, in emission order.
    pub fn recorded(&self) -> Vec<EmittedEvent> {
        self.recorded.lock().unwrap().clone()
    }

    /// Captured notifications for one topic.
    pub fn recorded_for(&self, topic: &str) -> Vec<EmittedEvent> {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.topic == topic)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.recorded.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.lock().unwrap().is_empty()
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        self.recorded.lock().unwrap().push(EmittedEvent {
            topic: topic.to_string(),
            payload,
        });
    }
}

/// Bus that discards everything. Useful when notifications are unwanted.
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn emit(&self, _topic: &str, _payload: serde_json::Value) {}
}
