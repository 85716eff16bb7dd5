//! Per-turn conversational intent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user wants from this turn.
///
/// Classification is asymmetric by design: generation is expensive, so only
/// unambiguous requests route to the generation paths, and anything uncertain
/// routes to [`Intent::Chat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Plain conversation; story state is left untouched.
    Chat,
    /// Start a brand-new story from the current theme.
    StoryGenerate,
    /// Revise the existing story outline in place.
    Regenerate,
}

impl Intent {
    /// Parses a classifier-returned intent string.
    ///
    /// Returns `None` for anything outside the known set; the caller decides
    /// the coercion policy (the classifier coerces unknown values to `Chat`).
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim() {
            "chat" => Some(Intent::Chat),
            "story_generate" => Some(Intent::StoryGenerate),
            "regenerate" => Some(Intent::Regenerate),
            _ => None,
        }
    }

    /// Stable string form, matching the wire/classifier vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Chat => "chat",
            Intent::StoryGenerate => "story_generate",
            Intent::Regenerate => "regenerate",
        }
    }

    /// True for the two intents that run the workflow graph.
    pub fn is_generation(&self) -> bool {
        matches!(self, Intent::StoryGenerate | Intent::Regenerate)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
