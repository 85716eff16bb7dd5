//! Intent classifier - routes each turn to chat or generation.
//!
//! Generation is expensive, so the defaults are asymmetric: only an
//! unambiguous request for a brand-new story routes to `story_generate`,
//! modifications of an existing story route to `regenerate`, and everything
//! uncertain - including classifier failures - routes to `chat`.
//!
//! The classifier also owns the running memory summary: each call folds the
//! new input into the prior summary and clamps the result to a word bound.

use std::sync::Arc;

use crate::domain::story::{extract_object, Intent};
use crate::ports::{GenerationRequest, TextGenerator};

/// Upper bound on the memory summary, in words.
pub const SUMMARY_WORD_LIMIT: usize = 500;

/// Result of classifying one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub memory_summary: String,
}

/// Classifies the user's intent for a turn and updates the memory summary.
pub struct IntentClassifier {
    text: Arc<dyn TextGenerator>,
}

impl IntentClassifier {
    /// Creates a classifier over the given text capability.
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    /// Classifies `input` against the prior summary.
    ///
    /// Empty or whitespace-only input short-circuits to `story_generate`
    /// ("no new instruction, continue") without any generation call. Any
    /// capability failure or unparseable output falls back to `chat` with
    /// the summary unchanged - the caller never sees this error class.
    pub async fn classify(&self, input: &str, prior_summary: &str) -> Classification {
        let input = input.trim();
        if input.is_empty() {
            return Classification {
                intent: Intent::StoryGenerate,
                memory_summary: prior_summary.to_string(),
            };
        }

        let request = GenerationRequest::new(classification_prompt(input, prior_summary))
            .with_temperature(0.1)
            .with_max_output_tokens(2000)
            .json();

        let raw = match self.text.generate(request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "intent classification failed, defaulting to chat");
                return Classification {
                    intent: Intent::Chat,
                    memory_summary: prior_summary.to_string(),
                };
            }
        };

        let object = extract_object(&raw);

        let intent = object
            .get("intent")
            .and_then(|v| v.as_str())
            .and_then(Intent::parse_lenient)
            .unwrap_or(Intent::Chat);

        let memory_summary = object
            .get("memory_summary")
            .and_then(|v| v.as_str())
            .map(|s| clamp_words(s, SUMMARY_WORD_LIMIT))
            .unwrap_or_else(|| prior_summary.to_string());

        Classification {
            intent,
            memory_summary,
        }
    }
}

/// Truncates `text` to at most `limit` whitespace-separated words.
pub fn clamp_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        text.trim().to_string()
    } else {
        words[..limit].join(" ")
    }
}

fn classification_prompt(input: &str, summary: &str) -> String {
    let summary_display = if summary.is_empty() {
        "(No previous summary)"
    } else {
        summary
    };

    format!(
        r#"You are a routing assistant for a children's story service. Classify the user's intent and update the memory summary.

=== Input ===
User input: {input}
Current summary: {summary_display}

=== Task 1: Intent Classification ===
Classify the intent as exactly one of:
- "story_generate": ONLY when the user unambiguously asks for a brand-new story
- "regenerate": the user wants to modify, continue, or redo the existing story
- "chat": everything else - small talk, questions (including questions about the story), unclear requests

When in doubt, choose "chat".

=== Task 2: Summary Update ===
Merge new information from the user input into the current summary:
1. Add only facts not already present
2. Keep the summary concise, under {SUMMARY_WORD_LIMIT} words, compressing older details when needed

=== Output Format ===
Return ONLY JSON:
{{
    "intent": "story_generate" | "chat" | "regenerate",
    "memory_summary": "updated summary"
}}"#
    )
}
