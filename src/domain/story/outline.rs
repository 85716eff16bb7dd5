//! Story outline - the 4-chapter skeleton produced by the planner.

use serde::{Deserialize, Serialize};

/// Every story has exactly this many chapters.
pub const CHAPTER_COUNT: usize = 4;

/// One chapter's planning stub: what the writer and illustrator branches
/// work from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterStub {
    /// Chapter number, 1-based and contiguous after normalization.
    pub number: u32,
    pub title: String,
    pub summary: String,
    /// Always English, regardless of the story language - image providers
    /// expect English prompts.
    pub image_description: String,
}

impl ChapterStub {
    /// Placeholder stub used when the planner output is incomplete.
    pub fn placeholder(number: u32) -> Self {
        Self {
            number,
            title: format!("Chapter {number}"),
            summary: "Story continues...".to_string(),
            image_description: "A scene from the story".to_string(),
        }
    }
}

/// The full story skeleton: global context plus one stub per chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryOutline {
    /// Style tag, e.g. "adventure", "fantasy", "educational", "friendship".
    pub style: String,
    pub characters: Vec<String>,
    pub setting: String,
    pub plot_summary: String,
    pub chapters: Vec<ChapterStub>,
}

impl StoryOutline {
    /// Normalizes the outline so `chapters` holds exactly [`CHAPTER_COUNT`]
    /// stubs numbered 1..=4.
    ///
    /// Provider output is untrusted: fewer stubs are padded with
    /// placeholders, extra stubs are dropped, and numbering is rewritten to
    /// be contiguous. Whatever shape came in, what comes out satisfies the
    /// chapter-count invariant.
    pub fn normalized(mut self) -> Self {
        self.chapters.truncate(CHAPTER_COUNT);
        while self.chapters.len() < CHAPTER_COUNT {
            let number = self.chapters.len() as u32 + 1;
            self.chapters.push(ChapterStub::placeholder(number));
        }
        for (index, stub) in self.chapters.iter_mut().enumerate() {
            stub.number = index as u32 + 1;
        }
        self
    }

    /// Looks up the stub for a chapter number.
    pub fn chapter(&self, number: u32) -> Option<&ChapterStub> {
        self.chapters.iter().find(|stub| stub.number == number)
    }

    /// Ad-hoc outline used when the planner's generation call fails
    /// terminally: a single-character cast and a theme-derived plot summary,
    /// so the run can still produce a complete (if bland) story.
    pub fn fallback(theme: &str) -> Self {
        let glimpse: String = theme.chars().take(50).collect();
        Self {
            style: "adventure".to_string(),
            characters: vec!["Hero".to_string()],
            setting: "A magical world".to_string(),
            plot_summary: format!("A story about {glimpse}"),
            chapters: (1..=CHAPTER_COUNT as u32)
                .map(ChapterStub::placeholder)
                .collect(),
        }
    }
}
