//! Illustrator branch - generates one chapter's image.
//!
//! Completion semantics differ from the writer branch:
//! - generation failure: no artifact, but the branch still marks itself
//!   complete, so one failing chapter cannot stall the illustration barrier
//! - missing or empty image description: no artifact AND no completion
//!   mark - the barrier stays short for the rest of the run. A run stalled
//!   this way terminates without finalized images; it does not crash.

use crate::domain::story::{ChapterDraft, StoryOutline};
use crate::ports::ImageGenerator;

use super::BranchOutput;

/// Runs illustrator branch `number`.
pub async fn illustrate_chapter(
    image: &dyn ImageGenerator,
    outline: &StoryOutline,
    number: u32,
) -> BranchOutput {
    let Some(stub) = outline.chapter(number) else {
        tracing::warn!(chapter = number, "chapter not found in outline, illustrator skipped");
        return BranchOutput::empty();
    };

    if stub.image_description.trim().is_empty() {
        tracing::warn!(chapter = number, "no image description, illustrator skipped");
        return BranchOutput::empty();
    }

    match image.generate(&stub.image_description).await {
        Ok(handle) => BranchOutput {
            chapters: vec![ChapterDraft::image(number, handle)],
            completed_writers: vec![],
            completed_image_gens: vec![number],
        },
        Err(e) => {
            tracing::warn!(chapter = number, error = %e, "image generation failed");
            BranchOutput {
                chapters: vec![],
                completed_writers: vec![],
                completed_image_gens: vec![number],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::image::{MockImageFailure, MockImageGenerator};
    use crate::domain::story::ChapterStub;

    fn outline_with_description(description: &str) -> StoryOutline {
        StoryOutline {
            style: "adventure".to_string(),
            characters: vec!["Rabbit".to_string()],
            setting: "forest".to_string(),
            plot_summary: "a journey".to_string(),
            chapters: vec![ChapterStub {
                number: 1,
                title: "One".to_string(),
                summary: "summary".to_string(),
                image_description: description.to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn success_contributes_image_and_completion() {
        let mock = MockImageGenerator::new();
        let output = illustrate_chapter(&mock, &outline_with_description("a rabbit"), 1).await;

        assert_eq!(output.chapters.len(), 1);
        assert_eq!(output.chapters[0].number, 1);
        assert!(output.chapters[0].image.is_some());
        assert!(output.chapters[0].content.is_none());
        assert_eq!(output.completed_image_gens, vec![1]);
        assert!(output.completed_writers.is_empty());
    }

    #[tokio::test]
    async fn generation_failure_completes_without_artifact() {
        let mock = MockImageGenerator::new().fail_on("rabbit", MockImageFailure::Unavailable);
        let output = illustrate_chapter(&mock, &outline_with_description("a rabbit"), 1).await;

        assert!(output.chapters.is_empty());
        assert_eq!(output.completed_image_gens, vec![1]);
    }

    #[tokio::test]
    async fn empty_description_neither_contributes_nor_completes() {
        let mock = MockImageGenerator::new();
        let output = illustrate_chapter(&mock, &outline_with_description("   "), 1).await;

        assert_eq!(output, BranchOutput::empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_stub_neither_contributes_nor_completes() {
        let mock = MockImageGenerator::new();
        let output = illustrate_chapter(&mock, &outline_with_description("a rabbit"), 7).await;

        assert_eq!(output, BranchOutput::empty());
        assert_eq!(mock.call_count(), 0);
    }
}
