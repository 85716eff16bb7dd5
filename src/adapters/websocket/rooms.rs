//! WebSocket room management for session-based event routing.
//!
//! Rooms are organized by session id, so progress events for one story
//! reach every client watching that session and nobody else.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::foundation::SessionId;

use super::messages::WireEvent;

/// Unique identifier for a WebSocket client connection.
///
/// Generated server-side when a client connects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Creates a new random client id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Manages WebSocket connection rooms organized by session.
///
/// # Thread Safety
///
/// Uses `RwLock` for the room registry since broadcasts (reads) vastly
/// outnumber joins/leaves (writes).
pub struct RoomManager {
    /// Map of session id → broadcast sender for that room.
    rooms: RwLock<HashMap<SessionId, broadcast::Sender<WireEvent>>>,

    /// Map of client id → session id for cleanup on disconnect.
    client_sessions: RwLock<HashMap<ClientId, SessionId>>,

    /// Channel capacity for each room's broadcast channel.
    channel_capacity: usize,
}

impl RoomManager {
    /// Creates a new room manager with the specified per-room channel
    /// capacity.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            client_sessions: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    /// Creates a manager with the default capacity (128 events).
    pub fn with_default_capacity() -> Self {
        Self::new(128)
    }

    /// Joins a client to a session room, creating the room if needed.
    ///
    /// Returns a receiver for that room's events.
    pub async fn join(
        &self,
        session_id: &SessionId,
        client_id: ClientId,
    ) -> broadcast::Receiver<WireEvent> {
        let mut rooms = self.rooms.write().await;
        let sender = rooms
            .entry(session_id.clone())
            .or_insert_with(|| broadcast::channel(self.channel_capacity).0);
        let receiver = sender.subscribe();
        drop(rooms);

        self.client_sessions
            .write()
            .await
            .insert(client_id, session_id.clone());

        receiver
    }

    /// Removes a client, dropping its room when it was the last member.
    pub async fn leave(&self, client_id: &ClientId) {
        let session_id = self.client_sessions.write().await.remove(client_id);

        if let Some(session_id) = session_id {
            let mut rooms = self.rooms.write().await;
            if let Some(sender) = rooms.get(&session_id) {
                if sender.receiver_count() == 0 {
                    rooms.remove(&session_id);
                }
            }
        }
    }

    /// Broadcasts an event to every client in a session room.
    ///
    /// Returns the number of clients the event was queued for; 0 when the
    /// room doesn't exist or has no listeners (not an error - observers are
    /// optional).
    pub async fn broadcast(&self, session_id: &SessionId, event: WireEvent) -> usize {
        let rooms = self.rooms.read().await;
        match rooms.get(session_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of active rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
