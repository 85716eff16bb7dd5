//! Chat responder - plain conversation turns.
//!
//! Chat turns never touch story-generation state; the responder sees the
//! outline read-only, purely to stay on topic when the user asks about the
//! story so far.

use std::sync::Arc;

use crate::domain::story::{extract_object, StoryOutline};
use crate::ports::{GenerationRequest, TextGenerator};

/// Reply used whenever the generation capability fails.
pub const FALLBACK_REPLY: &str = "I'm here to help! Would you like to create a story?";

/// Result of a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub reply: String,
    /// The memory summary after the turn. The responder does not revise it
    /// itself (summaries are the classifier's job); it is passed through so
    /// callers persist a single authoritative value.
    pub memory_summary: String,
}

/// Produces conversational replies for chat turns.
pub struct ChatResponder {
    text: Arc<dyn TextGenerator>,
}

impl ChatResponder {
    /// Creates a responder over the given text capability.
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    /// Generates a short, child-friendly reply.
    ///
    /// On any capability failure the fixed [`FALLBACK_REPLY`] is returned
    /// and the summary is left unchanged; a chat turn never fails.
    pub async fn respond(
        &self,
        theme: &str,
        memory_summary: &str,
        story_outline: Option<&StoryOutline>,
    ) -> ChatReply {
        let request = GenerationRequest::new(chat_prompt(theme, memory_summary, story_outline))
            .with_temperature(0.7)
            .with_max_output_tokens(200)
            .json();

        let reply = match self.text.generate(request).await {
            Ok(raw) => {
                let object = extract_object(&raw);
                object
                    .get("chat_response")
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat generation failed, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        };

        ChatReply {
            reply,
            memory_summary: memory_summary.to_string(),
        }
    }
}

fn chat_prompt(theme: &str, summary: &str, outline: Option<&StoryOutline>) -> String {
    let summary_display = if summary.is_empty() {
        "(No previous conversation)"
    } else {
        summary
    };

    let story_context = match outline {
        Some(outline) => format!(
            "Current story: a {} story about {} set in {}.\n",
            outline.style,
            outline.characters.join(", "),
            outline.setting
        ),
        None => String::new(),
    };

    format!(
        r#"You are a children's storyteller who loves chatting with children in a fun and engaging way.

=== Your Role ===
A friendly storyteller who enjoys casual conversation. Make children feel happy and excited with a warm, playful, child-friendly tone.

=== Context ===
{story_context}Memory summary: {summary_display}
User message: {theme}

=== Important Rules ===
1. Respond in the SAME language as the user's message
2. Keep the response short and friendly
3. Use simple, age-appropriate language

=== Output Format ===
Return ONLY JSON:
{{
    "chat_response": "your friendly response in the same language as the user's message"
}}"#
    )
}
