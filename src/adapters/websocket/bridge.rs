//! Bridge from the progress port to WebSocket rooms.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::ports::{ProgressEvent, ProgressPublisher};

use super::messages::WireEvent;
use super::rooms::RoomManager;

/// Publishes progress events into the session's WebSocket room.
///
/// Delivery is fire-and-forget: a session with no connected clients simply
/// drops the event.
#[derive(Clone)]
pub struct RoomProgressPublisher {
    rooms: Arc<RoomManager>,
}

impl RoomProgressPublisher {
    /// Creates a publisher over the given room manager.
    pub fn new(rooms: Arc<RoomManager>) -> Self {
        Self { rooms }
    }
}

#[async_trait]
impl ProgressPublisher for RoomProgressPublisher {
    async fn emit(&self, session_id: &SessionId, event: ProgressEvent) {
        let wire = WireEvent::from_progress(session_id, &event);
        let delivered = self.rooms.broadcast(session_id, wire).await;

        if delivered == 0 {
            tracing::debug!(
                session_id = %session_id,
                event_type = event.event_type(),
                "progress event dropped: no connected observers"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::websocket::ClientId;

    #[tokio::test]
    async fn emits_into_session_room() {
        let rooms = Arc::new(RoomManager::with_default_capacity());
        let publisher = RoomProgressPublisher::new(Arc::clone(&rooms));
        let session_id = SessionId::new("s-1").unwrap();

        let mut rx = rooms.join(&session_id, ClientId::new()).await;
        publisher
            .emit(&session_id, ProgressEvent::PipelineCompleted)
            .await;

        let wire = rx.recv().await.unwrap();
        assert_eq!(wire.event_type, "pipeline_completed");
        assert_eq!(wire.session_id, "s-1");
    }

    #[tokio::test]
    async fn emitting_without_observers_is_silent() {
        let rooms = Arc::new(RoomManager::with_default_capacity());
        let publisher = RoomProgressPublisher::new(rooms);
        let session_id = SessionId::new("lonely").unwrap();

        // Must not panic or error.
        publisher
            .emit(&session_id, ProgressEvent::SessionReady)
            .await;
    }
}
