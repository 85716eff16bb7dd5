//! Story domain - the types and state flowing through a generation session.
//!
//! A session revolves around one `StoryState`: the working state of a single
//! turn, built from the persisted `SessionSnapshot` according to the
//! intent-specific reset policy, mutated by the workflow graph, then captured
//! back into a snapshot for persistence.

mod chapter;
mod extract;
mod intent;
mod outline;
mod state;

pub use chapter::{
    ChapterDraft, FinalChapterImage, FinalChapterText, FinalizedImages, FinalizedText, ImageHandle,
};
pub use extract::extract_object;
pub use intent::Intent;
pub use outline::{ChapterStub, StoryOutline, CHAPTER_COUNT};
pub use state::{SessionSnapshot, StoryState, DEFAULT_LANGUAGE};
