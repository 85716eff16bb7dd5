//! Working state of a turn and the persisted session snapshot.
//!
//! `StoryState` is the in-memory working copy a single turn operates on. It
//! is never shared across turns directly: the turn coordinator rebuilds it
//! from the persisted [`SessionSnapshot`] using the reset policy of the
//! classified intent, the workflow graph mutates it for the duration of one
//! run, and the coordinator captures it back into a snapshot at the end.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::foundation::SessionId;

use super::{ChapterDraft, FinalizedImages, FinalizedText, Intent, StoryOutline};

/// Language used until the planner detects one from the theme.
pub const DEFAULT_LANGUAGE: &str = "en";

/// In-memory working state for one turn.
#[derive(Debug, Clone)]
pub struct StoryState {
    pub session_id: SessionId,
    /// Raw user input for this turn. Ephemeral: flows into the memory
    /// summary but is never persisted as-is.
    pub theme: String,
    pub intent: Intent,
    /// Bounded cumulative summary of the conversation; survives every turn.
    pub memory_summary: String,
    /// ISO-like language code; authoritative once an outline exists.
    pub language: String,
    pub story_outline: Option<StoryOutline>,
    /// When true, no outline exists and the planner is asking for more
    /// detail instead.
    pub needs_info: bool,
    pub missing_fields: Vec<String>,
    pub suggestions: Vec<String>,
    /// Append-only accumulator of branch contributions; merged by chapter
    /// number only at finalization.
    pub chapters: Vec<ChapterDraft>,
    /// Chapter numbers of completed writer branches. Duplicates tolerated;
    /// completion predicates treat this as a set.
    pub completed_writers: Vec<u32>,
    /// Chapter numbers of completed illustrator branches.
    pub completed_image_gens: Vec<u32>,
    pub finalized_text: Option<FinalizedText>,
    pub finalized_images: Option<FinalizedImages>,
}

impl StoryState {
    /// Blank state for a session with no prior snapshot.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            theme: String::new(),
            intent: Intent::Chat,
            memory_summary: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            story_outline: None,
            needs_info: false,
            missing_fields: Vec::new(),
            suggestions: Vec::new(),
            chapters: Vec::new(),
            completed_writers: Vec::new(),
            completed_image_gens: Vec::new(),
            finalized_text: None,
            finalized_images: None,
        }
    }

    /// Working state for a `chat` turn: every prior field is preserved;
    /// only the theme, intent and memory summary are replaced.
    pub fn chat_turn(
        session_id: SessionId,
        prior: &SessionSnapshot,
        theme: impl Into<String>,
        memory_summary: impl Into<String>,
    ) -> Self {
        let mut state = Self::from_snapshot(session_id, prior);
        state.theme = theme.into();
        state.intent = Intent::Chat;
        state.memory_summary = memory_summary.into();
        state
    }

    /// Working state for a `story_generate` turn: only the memory summary
    /// survives; the outline is discarded and every accumulator is reset.
    pub fn fresh_run(
        session_id: SessionId,
        theme: impl Into<String>,
        memory_summary: impl Into<String>,
    ) -> Self {
        let mut state = Self::new(session_id);
        state.theme = theme.into();
        state.intent = Intent::StoryGenerate;
        state.memory_summary = memory_summary.into();
        state
    }

    /// Working state for a `regenerate` turn: memory summary, outline and
    /// language survive, accumulators and finalized artifacts are reset.
    ///
    /// With no prior outline this degrades to the discard-outline policy of
    /// [`StoryState::fresh_run`], keeping only the regenerate intent.
    pub fn regenerate_run(
        session_id: SessionId,
        prior: &SessionSnapshot,
        theme: impl Into<String>,
        memory_summary: impl Into<String>,
    ) -> Self {
        let mut state = Self::fresh_run(session_id, theme, memory_summary);
        state.intent = Intent::Regenerate;
        if let Some(outline) = &prior.story_outline {
            state.story_outline = Some(outline.clone());
            if let Some(language) = &prior.language {
                state.language = language.clone();
            }
        }
        state
    }

    fn from_snapshot(session_id: SessionId, snapshot: &SessionSnapshot) -> Self {
        Self {
            session_id,
            theme: String::new(),
            intent: Intent::Chat,
            memory_summary: snapshot.memory_summary.clone(),
            language: snapshot
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            story_outline: snapshot.story_outline.clone(),
            needs_info: false,
            missing_fields: Vec::new(),
            suggestions: Vec::new(),
            chapters: snapshot.chapters.clone(),
            completed_writers: snapshot.completed_writers.clone(),
            completed_image_gens: snapshot.completed_image_gens.clone(),
            finalized_text: snapshot.finalized_text.clone(),
            finalized_images: snapshot.finalized_images.clone(),
        }
    }

    /// Number of distinct writer branches that have completed.
    pub fn unique_completed_writers(&self) -> usize {
        self.completed_writers.iter().collect::<HashSet<_>>().len()
    }

    /// Number of distinct illustrator branches that have completed.
    pub fn unique_completed_image_gens(&self) -> usize {
        self.completed_image_gens
            .iter()
            .collect::<HashSet<_>>()
            .len()
    }
}

/// The persisted, serializable subset of session state.
///
/// Absent fields are dropped on write (`skip_serializing_if`) and tolerated
/// on read (`default`), matching a keyed store that only holds
/// JSON-serializable values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub memory_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_outline: Option<StoryOutline>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<ChapterDraft>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_writers: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_image_gens: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_text: Option<FinalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_images: Option<FinalizedImages>,
}

impl SessionSnapshot {
    /// Empty snapshot for a session seen for the first time.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Captures the persistable subset of a turn's final working state.
    pub fn capture(state: &StoryState) -> Self {
        Self {
            memory_summary: state.memory_summary.clone(),
            language: Some(state.language.clone()),
            story_outline: state.story_outline.clone(),
            chapters: state.chapters.clone(),
            completed_writers: state.completed_writers.clone(),
            completed_image_gens: state.completed_image_gens.clone(),
            finalized_text: state.finalized_text.clone(),
            finalized_images: state.finalized_images.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{ChapterStub, FinalChapterText, ImageHandle};

    fn session() -> SessionId {
        SessionId::new("test-session").unwrap()
    }

    fn populated_snapshot() -> SessionSnapshot {
        SessionSnapshot {
            memory_summary: "likes rabbits".to_string(),
            language: Some("zh".to_string()),
            story_outline: Some(
                StoryOutline {
                    style: "fantasy".to_string(),
                    characters: vec!["Rabbit".to_string()],
                    setting: "forest".to_string(),
                    plot_summary: "journey".to_string(),
                    chapters: vec![ChapterStub::placeholder(1)],
                }
                .normalized(),
            ),
            chapters: vec![
                ChapterDraft::text(1, "One", "text"),
                ChapterDraft::image(1, ImageHandle::new("url")),
            ],
            completed_writers: vec![1, 2, 3, 4],
            completed_image_gens: vec![1],
            finalized_text: Some(FinalizedText {
                chapters: vec![FinalChapterText {
                    number: 1,
                    title: "One".to_string(),
                    content: "text".to_string(),
                }],
            }),
            finalized_images: None,
        }
    }

    #[test]
    fn chat_turn_preserves_everything_but_theme_and_summary() {
        let prior = populated_snapshot();
        let state = StoryState::chat_turn(session(), &prior, "hello", "updated summary");

        assert_eq!(state.theme, "hello");
        assert_eq!(state.intent, Intent::Chat);
        assert_eq!(state.memory_summary, "updated summary");
        assert_eq!(state.language, "zh");
        assert_eq!(state.story_outline, prior.story_outline);
        assert_eq!(state.chapters, prior.chapters);
        assert_eq!(state.completed_writers, prior.completed_writers);
        assert_eq!(state.finalized_text, prior.finalized_text);
    }

    #[test]
    fn fresh_run_keeps_only_memory_summary() {
        let state = StoryState::fresh_run(session(), "a dragon story", "likes rabbits");

        assert_eq!(state.intent, Intent::StoryGenerate);
        assert_eq!(state.memory_summary, "likes rabbits");
        assert_eq!(state.language, DEFAULT_LANGUAGE);
        assert!(state.story_outline.is_none());
        assert!(state.chapters.is_empty());
        assert!(state.completed_writers.is_empty());
        assert!(state.completed_image_gens.is_empty());
        assert!(state.finalized_text.is_none());
        assert!(state.finalized_images.is_none());
    }

    #[test]
    fn regenerate_keeps_outline_and_language_resets_accumulators() {
        let prior = populated_snapshot();
        let state = StoryState::regenerate_run(session(), &prior, "make it darker", "summary");

        assert_eq!(state.intent, Intent::Regenerate);
        assert_eq!(state.language, "zh");
        assert_eq!(state.story_outline, prior.story_outline);
        assert!(state.chapters.is_empty());
        assert!(state.completed_writers.is_empty());
        assert!(state.completed_image_gens.is_empty());
        assert!(state.finalized_text.is_none());
        assert!(state.finalized_images.is_none());
    }

    #[test]
    fn regenerate_without_outline_degrades_to_fresh_run() {
        let prior = SessionSnapshot {
            memory_summary: "summary".to_string(),
            language: Some("fr".to_string()),
            ..SessionSnapshot::empty()
        };
        let state = StoryState::regenerate_run(session(), &prior, "again", "summary");

        assert!(state.story_outline.is_none());
        // Without an outline the prior language is not authoritative.
        assert_eq!(state.language, DEFAULT_LANGUAGE);
    }

    #[test]
    fn unique_counts_deduplicate() {
        let mut state = StoryState::new(session());
        state.completed_writers = vec![1, 2, 2, 3, 4, 4, 4];
        state.completed_image_gens = vec![3, 3];
        assert_eq!(state.unique_completed_writers(), 4);
        assert_eq!(state.unique_completed_image_gens(), 1);
    }

    #[test]
    fn snapshot_capture_round_trips_chat_turn() {
        let prior = populated_snapshot();
        let state = StoryState::chat_turn(session(), &prior, "hi", prior.memory_summary.clone());
        let captured = SessionSnapshot::capture(&state);
        assert_eq!(captured, prior);
    }

    #[test]
    fn snapshot_drops_absent_fields_on_write() {
        let json = serde_json::to_value(SessionSnapshot::empty()).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("memory_summary"));
        assert!(!object.contains_key("story_outline"));
        assert!(!object.contains_key("chapters"));
        assert!(!object.contains_key("finalized_text"));
    }

    #[test]
    fn snapshot_tolerates_missing_fields_on_read() {
        let snapshot: SessionSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, SessionSnapshot::empty());
    }
}
