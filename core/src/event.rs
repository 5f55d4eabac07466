use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Audit event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    Empty,
    Reference(String),
}

/// Engine audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event key (e.g., "image.untag", "monitor.stop")
    pub key: String,

    /// Event payload, usually the affected reference or id
    pub payload: EventPayload,

    /// Timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl AuditEvent {
    /// Create a new event
    pub fn new(key: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            key: key.into(),
            payload,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create an event with no payload
    pub fn empty(key: impl Into<String>) -> Self {
        Self::new(key, EventPayload::Empty)
    }

    /// Create an event carrying an image reference or id
    pub fn with_reference(key: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::new(key, EventPayload::Reference(reference.into()))
    }
}

/// Audit event emitter.
///
/// Audit sinks are collaborators: they subscribe and consume at their own
/// pace. Emitting with no live subscriber is not an error.
#[derive(Clone)]
pub struct EventEmitter {
    sender: Arc<broadcast::Sender<AuditEvent>>,
}

impl EventEmitter {
    /// Create a new event emitter
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Emit an event
    pub fn emit(&self, event: AuditEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Event catalog - predefined event keys
pub mod events {
    // Image lifecycle
    pub const IMAGE_UNTAG: &str = "image.untag";
    pub const IMAGE_DELETE: &str = "image.delete";
    pub const IMAGE_CLEAN: &str = "image.clean";

    // Monitor lifecycle
    pub const MONITOR_START: &str = "monitor.start";
    pub const MONITOR_STOP: &str = "monitor.stop";
}
