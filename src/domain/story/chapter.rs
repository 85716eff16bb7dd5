//! Chapter artifacts - partial branch outputs and finalized collections.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a generated image (URL or encoded blob).
///
/// The workflow never interprets its contents; it only threads the handle
/// from the image capability through to the finalized output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(String);

impl ImageHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One branch's contribution to the chapter accumulator.
///
/// Writer branches contribute `title` + `content`; illustrator branches
/// contribute `image`. Contributions for the same chapter number stay as
/// separate elements in the accumulator and are merged by number only at
/// finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterDraft {
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageHandle>,
}

impl ChapterDraft {
    /// A writer branch's text contribution.
    pub fn text(number: u32, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            number,
            title: Some(title.into()),
            content: Some(content.into()),
            image: None,
        }
    }

    /// An illustrator branch's image contribution.
    pub fn image(number: u32, handle: ImageHandle) -> Self {
        Self {
            number,
            title: None,
            content: None,
            image: Some(handle),
        }
    }
}

/// A finalized text chapter, ready for the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalChapterText {
    pub number: u32,
    pub title: String,
    pub content: String,
}

/// The finalized, ordered (1..=4) text of the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedText {
    pub chapters: Vec<FinalChapterText>,
}

/// A finalized image slot; `None` marks a chapter whose illustration never
/// arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalChapterImage {
    pub number: u32,
    pub image: Option<ImageHandle>,
}

/// The finalized, ordered (1..=4) illustrations of the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedImages {
    pub chapters: Vec<FinalChapterImage>,
}
