//! Progress publishing port - fan-out of workflow events to session
//! observers.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::foundation::SessionId;
use crate::domain::story::{FinalizedImages, FinalizedText};

/// A workflow stage, as surfaced to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowStage {
    Planner,
    Writer(u32),
    Illustrator(u32),
    FinalizeText,
    FinalizeImages,
}

impl WorkflowStage {
    /// Stable stage label used in event payloads.
    pub fn label(&self) -> String {
        match self {
            WorkflowStage::Planner => "planner".to_string(),
            WorkflowStage::Writer(n) => format!("writer_{n}"),
            WorkflowStage::Illustrator(n) => format!("illustrator_{n}"),
            WorkflowStage::FinalizeText => "finalize_text".to_string(),
            WorkflowStage::FinalizeImages => "finalize_images".to_string(),
        }
    }
}

/// Events emitted over the lifetime of a turn.
///
/// Delivery is fire-and-forget, at most once per currently-connected
/// observer. Disconnected observers miss events; there is no replay.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A session observer connection is established.
    SessionReady,
    /// A workflow stage began.
    StageStarted { stage: WorkflowStage },
    /// A workflow stage finished (successfully or with its failure
    /// absorbed).
    StageCompleted { stage: WorkflowStage },
    /// The planner needs more information before an outline can exist.
    NeedsInfo {
        language: String,
        missing_fields: Vec<String>,
        suggestions: Vec<String>,
    },
    /// Conversational reply for a chat turn.
    ChatResponse { reply: String },
    /// The finalized text chapters are ready.
    FinalizeTextReady { text: FinalizedText },
    /// The finalized image chapters are ready.
    FinalizeImagesReady { images: FinalizedImages },
    /// The whole pipeline ran to completion.
    PipelineCompleted,
    /// A turn-level error the user should see.
    Error { message: String },
}

impl ProgressEvent {
    /// Stable event type string (wire vocabulary).
    pub fn event_type(&self) -> &'static str {
        match self {
            ProgressEvent::SessionReady => "session_ready",
            ProgressEvent::StageStarted { .. } => "stage_started",
            ProgressEvent::StageCompleted { .. } => "stage_completed",
            ProgressEvent::NeedsInfo { .. } => "needs_info",
            ProgressEvent::ChatResponse { .. } => "chat_response",
            ProgressEvent::FinalizeTextReady { .. } => "finalize_text_ready",
            ProgressEvent::FinalizeImagesReady { .. } => "finalize_images_ready",
            ProgressEvent::PipelineCompleted => "pipeline_completed",
            ProgressEvent::Error { .. } => "error",
        }
    }

    /// JSON payload carried in the event's `data` field.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            ProgressEvent::SessionReady => json!({}),
            ProgressEvent::StageStarted { stage } | ProgressEvent::StageCompleted { stage } => {
                json!({ "stage": stage.label() })
            }
            ProgressEvent::NeedsInfo {
                language,
                missing_fields,
                suggestions,
            } => json!({
                "language": language,
                "missing_fields": missing_fields,
                "suggestions": suggestions,
            }),
            ProgressEvent::ChatResponse { reply } => json!({ "reply": reply }),
            ProgressEvent::FinalizeTextReady { text } => {
                json!({ "chapters": text.chapters })
            }
            ProgressEvent::FinalizeImagesReady { images } => {
                json!({ "chapters": images.chapters })
            }
            ProgressEvent::PipelineCompleted => json!({}),
            ProgressEvent::Error { message } => json!({ "error": message }),
        }
    }
}

/// Port for emitting progress events to a session's observers.
///
/// Implementations log and swallow their own delivery failures: emission is
/// fire-and-forget and must never feed errors back into turn handling.
#[async_trait]
pub trait ProgressPublisher: Send + Sync {
    /// Emits one event to every currently-connected observer of the session.
    async fn emit(&self, session_id: &SessionId, event: ProgressEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ProgressPublisher) {}

    #[test]
    fn stage_labels_are_stable() {
        assert_eq!(WorkflowStage::Planner.label(), "planner");
        assert_eq!(WorkflowStage::Writer(3).label(), "writer_3");
        assert_eq!(WorkflowStage::Illustrator(1).label(), "illustrator_1");
        assert_eq!(WorkflowStage::FinalizeText.label(), "finalize_text");
    }

    #[test]
    fn event_types_are_stable() {
        assert_eq!(ProgressEvent::PipelineCompleted.event_type(), "pipeline_completed");
        assert_eq!(
            ProgressEvent::StageStarted {
                stage: WorkflowStage::Planner
            }
            .event_type(),
            "stage_started"
        );
    }

    #[test]
    fn stage_payload_carries_label() {
        let payload = ProgressEvent::StageCompleted {
            stage: WorkflowStage::Writer(2),
        }
        .payload();
        assert_eq!(payload["stage"], "writer_2");
    }

    #[test]
    fn needs_info_payload_carries_fields() {
        let payload = ProgressEvent::NeedsInfo {
            language: "en".to_string(),
            missing_fields: vec!["characters".to_string()],
            suggestions: vec!["Who is the hero?".to_string()],
        }
        .payload();
        assert_eq!(payload["language"], "en");
        assert_eq!(payload["missing_fields"][0], "characters");
    }
}
