//! Group-addressed in-process broadcast bus.
//!
//! [`GroupBus`] is the publish side of the live-update channel layer: the
//! change watcher publishes [`BusMessage`]s to named groups, the WebSocket
//! layer subscribes and fans each message out to the connections that joined
//! the group. Publishing is fire-and-forget with no delivery guarantee; with
//! zero subscribers a send is silently dropped so a save is never blocked or
//! failed by an idle bus.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// BusMessage
// ---------------------------------------------------------------------------

/// A message published to a broadcast group.
///
/// On the wire this becomes `{"type": <kind>, ...payload}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    /// Message discriminator, e.g. `"task_updated"`.
    pub kind: String,
    /// Message payload; expected to be a JSON object.
    pub payload: Value,
}

impl BusMessage {
    /// Create a message with the given kind and payload.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Flatten into the wire representation `{"type": kind, ...payload}`.
    ///
    /// A non-object payload is nested under a `"data"` key instead of being
    /// flattened.
    pub fn to_wire(&self) -> Value {
        let mut obj = match &self.payload {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other.clone());
                map
            }
        };
        obj.insert("type".to_string(), Value::String(self.kind.clone()));
        Value::Object(obj)
    }
}

/// A [`BusMessage`] addressed to a single group.
#[derive(Debug, Clone)]
pub struct GroupMessage {
    /// Target group name, e.g. `"admin_dashboard"` or `"client_42"`.
    pub group: String,
    /// The message itself.
    pub message: BusMessage,
}

// ---------------------------------------------------------------------------
// BroadcastBus
// ---------------------------------------------------------------------------

/// Publish side of the broadcast channel layer.
///
/// The change watcher only ever publishes; implementations decide transport.
/// Production uses [`GroupBus`]; tests substitute a recording stub.
pub trait BroadcastBus: Send + Sync {
    /// Publish a message to a named group. Never blocks, never fails.
    fn group_send(&self, group: &str, message: BusMessage);
}

// ---------------------------------------------------------------------------
// GroupBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus.
///
/// Wraps a single [`broadcast::Sender`] carrying [`GroupMessage`]s; each
/// subscriber receives every message and filters by the groups it serves.
pub struct GroupBus {
    sender: broadcast::Sender<GroupMessage>,
}

impl GroupBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all messages published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<GroupMessage> {
        self.sender.subscribe()
    }
}

impl Default for GroupBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastBus for GroupBus {
    fn group_send(&self, group: &str, message: BusMessage) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(GroupMessage {
            group: group.to_string(),
            message,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
