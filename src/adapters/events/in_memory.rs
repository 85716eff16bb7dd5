//! In-memory progress bus for testing.
//!
//! Captures every emitted event synchronously so tests can assert on the
//! exact event sequence of a turn. Not for production use.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::foundation::SessionId;
use crate::ports::{ProgressEvent, ProgressPublisher};

/// In-memory progress bus.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryProgressBus::new());
/// // ... run a turn ...
/// assert!(bus.has_event_type("pipeline_completed"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryProgressBus {
    events: Arc<Mutex<Vec<(SessionId, ProgressEvent)>>>,
}

impl InMemoryProgressBus {
    /// Creates a new empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    pub fn events(&self) -> Vec<(SessionId, ProgressEvent)> {
        self.events.lock().unwrap().clone()
    }

    /// Returns events for one session, in emission order.
    pub fn events_for(&self, session_id: &SessionId) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter(|(id, _)| id == session_id)
            .map(|(_, event)| event)
            .collect()
    }

    /// Returns the event type strings in emission order.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .map(|(_, event)| event.event_type())
            .collect()
    }

    /// Checks whether any captured event has the given type.
    pub fn has_event_type(&self, event_type: &str) -> bool {
        self.event_types().contains(&event_type)
    }

    /// Counts captured events of one type.
    pub fn count_of(&self, event_type: &str) -> usize {
        self.event_types()
            .iter()
            .filter(|t| **t == event_type)
            .count()
    }

    /// Clears captured events (test isolation).
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl ProgressPublisher for InMemoryProgressBus {
    async fn emit(&self, session_id: &SessionId, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap()
            .push((session_id.clone(), event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::WorkflowStage;

    fn session(id: &str) -> SessionId {
        SessionId::new(id).unwrap()
    }

    #[tokio::test]
    async fn captures_events_in_order() {
        let bus = InMemoryProgressBus::new();
        bus.emit(
            &session("a"),
            ProgressEvent::StageStarted {
                stage: WorkflowStage::Planner,
            },
        )
        .await;
        bus.emit(&session("a"), ProgressEvent::PipelineCompleted).await;

        assert_eq!(bus.event_types(), vec!["stage_started", "pipeline_completed"]);
    }

    #[tokio::test]
    async fn filters_by_session() {
        let bus = InMemoryProgressBus::new();
        bus.emit(&session("a"), ProgressEvent::PipelineCompleted).await;
        bus.emit(&session("b"), ProgressEvent::SessionReady).await;

        assert_eq!(bus.events_for(&session("a")).len(), 1);
        assert_eq!(bus.events_for(&session("b")).len(), 1);
        assert!(bus.has_event_type("session_ready"));
        assert_eq!(bus.count_of("pipeline_completed"), 1);
    }
}
