//! Turn coordinator - one inbound message, one full reaction.
//!
//! The coordinator exclusively owns read-modify-write of the persisted
//! snapshot. Per turn it loads the prior snapshot, classifies the intent,
//! builds the working state under that intent's reset policy, dispatches to
//! the chat responder or the workflow graph, persists the result, and emits
//! the turn-level events.
//!
//! Failure posture: the user always gets some response. Store failures are
//! logged and swallowed (a failed read means "no prior state", a failed
//! write means the turn isn't durable), and every generation failure is
//! already absorbed inside the classifier/responder/graph nodes. Unknown
//! intent values cannot reach this layer - the classifier coerces them to
//! chat at the boundary, which also guarantees they mutate no state.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::SessionId;
use crate::domain::story::{Intent, SessionSnapshot, StoryState};
use crate::ports::{
    ImageGenerator, ProgressEvent, ProgressPublisher, SessionStore, TextGenerator,
};

use super::chat::ChatResponder;
use super::classifier::IntentClassifier;
use super::workflow::StoryGraph;

/// Default session lifetime: untouched sessions expire after 24 hours.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Coordinates the handling of one user turn.
pub struct TurnCoordinator {
    store: Arc<dyn SessionStore>,
    publisher: Arc<dyn ProgressPublisher>,
    classifier: IntentClassifier,
    chat: ChatResponder,
    graph: StoryGraph,
    session_ttl: Duration,
}

impl TurnCoordinator {
    /// Wires a coordinator from its collaborators.
    pub fn new(
        store: Arc<dyn SessionStore>,
        publisher: Arc<dyn ProgressPublisher>,
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(Arc::clone(&text)),
            chat: ChatResponder::new(Arc::clone(&text)),
            graph: StoryGraph::new(text, image, Arc::clone(&publisher)),
            store,
            publisher,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Overrides the session TTL.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Handles one turn end to end.
    ///
    /// Never panics the serving task and never returns an error: anything
    /// unexpected is logged and surfaced as a single error event.
    pub async fn handle_turn(&self, session_id: SessionId, raw_message: String) {
        tracing::info!(session_id = %session_id, "handling turn");

        let prior = self.load_snapshot(&session_id).await;

        let classification = self
            .classifier
            .classify(&raw_message, &prior.memory_summary)
            .await;
        tracing::debug!(
            session_id = %session_id,
            intent = %classification.intent,
            "turn classified"
        );

        match classification.intent {
            Intent::Chat => {
                self.handle_chat_turn(session_id, prior, raw_message, classification.memory_summary)
                    .await;
            }
            Intent::StoryGenerate => {
                let state = StoryState::fresh_run(
                    session_id,
                    raw_message,
                    classification.memory_summary,
                );
                self.handle_generation_turn(state).await;
            }
            Intent::Regenerate => {
                let state = StoryState::regenerate_run(
                    session_id,
                    &prior,
                    raw_message,
                    classification.memory_summary,
                );
                self.handle_generation_turn(state).await;
            }
        }
    }

    /// Chat path: preserve everything, reply, persist.
    async fn handle_chat_turn(
        &self,
        session_id: SessionId,
        prior: SessionSnapshot,
        theme: String,
        memory_summary: String,
    ) {
        let mut state = StoryState::chat_turn(session_id, &prior, theme, memory_summary);

        let reply = self
            .chat
            .respond(&state.theme, &state.memory_summary, state.story_outline.as_ref())
            .await;
        state.memory_summary = reply.memory_summary.clone();

        self.persist(&state).await;
        self.publisher
            .emit(&state.session_id, ProgressEvent::ChatResponse { reply: reply.reply })
            .await;
    }

    /// Generation path: run the graph, persist whatever it produced, emit
    /// the terminal event.
    async fn handle_generation_turn(&self, state: StoryState) {
        let state = self.graph.run(state).await;

        self.persist(&state).await;

        if state.needs_info {
            self.publisher
                .emit(
                    &state.session_id,
                    ProgressEvent::NeedsInfo {
                        language: state.language.clone(),
                        missing_fields: state.missing_fields.clone(),
                        suggestions: state.suggestions.clone(),
                    },
                )
                .await;
        } else if state.finalized_images.is_some() {
            self.publisher
                .emit(&state.session_id, ProgressEvent::PipelineCompleted)
                .await;
        } else {
            // The run drained with a barrier unmet; the partial results are
            // persisted but the pipeline did not complete.
            self.publisher
                .emit(
                    &state.session_id,
                    ProgressEvent::Error {
                        message: "story generation did not run to completion".to_string(),
                    },
                )
                .await;
        }
    }

    async fn load_snapshot(&self, session_id: &SessionId) -> SessionSnapshot {
        match self.store.get(session_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => SessionSnapshot::empty(),
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "snapshot load failed, treating as new session"
                );
                SessionSnapshot::empty()
            }
        }
    }

    async fn persist(&self, state: &StoryState) {
        let snapshot = SessionSnapshot::capture(state);
        if let Err(e) = self
            .store
            .put(&state.session_id, &snapshot, self.session_ttl)
            .await
        {
            tracing::warn!(
                session_id = %state.session_id,
                error = %e,
                "snapshot persist failed, turn results are not durable"
            );
        }
    }
}
