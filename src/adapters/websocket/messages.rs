//! Wire message types for the session WebSocket.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, SessionId, Timestamp};
use crate::ports::ProgressEvent;

/// Server → client event envelope.
///
/// Every event carries its own id so reconnecting clients can deduplicate,
/// plus the session id so multiplexing clients can route.
#[derive(Debug, Clone, Serialize)]
pub struct WireEvent {
    pub event_id: EventId,
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: String,
    pub session_id: String,
    pub data: serde_json::Value,
}

impl WireEvent {
    /// Wraps a progress event for transport.
    pub fn from_progress(session_id: &SessionId, event: &ProgressEvent) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event.event_type().to_string(),
            timestamp: Timestamp::now().to_rfc3339(),
            session_id: session_id.to_string(),
            data: event.payload(),
        }
    }
}

/// Client → server message.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,
    /// The user's message text. May legitimately be empty - an empty theme
    /// still triggers a turn.
    #[serde(default)]
    pub theme: String,
}

impl ClientMessage {
    /// True for frames that should trigger a turn.
    pub fn is_turn_message(&self) -> bool {
        self.kind == "message"
    }
}
