//! Finalization nodes - merge branch artifacts into canonical collections.
//!
//! Both finalizers order strictly by chapter number. Arrival order is
//! non-deterministic under concurrency and must never leak into the output.
//!
//! - finalize-text makes one revision call to the text capability and falls
//!   back to the unrevised chapters verbatim on any failure
//! - finalize-images is a purely deterministic merge with no capability
//!   call

use serde_json::Value;

use crate::domain::story::{
    extract_object, ChapterDraft, FinalChapterImage, FinalChapterText, FinalizedImages,
    FinalizedText, StoryState, CHAPTER_COUNT,
};
use crate::ports::{GenerationRequest, TextGenerator};

/// Collects the text artifacts into exactly [`CHAPTER_COUNT`] ordered
/// entries, synthesizing empty-content placeholders for missing numbers.
pub fn ordered_text_chapters(drafts: &[ChapterDraft]) -> Vec<FinalChapterText> {
    (1..=CHAPTER_COUNT as u32)
        .map(|number| {
            drafts
                .iter()
                .find(|draft| draft.number == number && draft.content.is_some())
                .map(|draft| FinalChapterText {
                    number,
                    title: draft
                        .title
                        .clone()
                        .unwrap_or_else(|| format!("Chapter {number}")),
                    content: draft.content.clone().unwrap_or_default(),
                })
                .unwrap_or_else(|| {
                    tracing::warn!(chapter = number, "chapter text missing at finalization");
                    FinalChapterText {
                        number,
                        title: format!("Chapter {number}"),
                        content: String::new(),
                    }
                })
        })
        .collect()
}

/// Runs the finalize-text node: one holistic revision pass over all four
/// chapters, preserving structure.
///
/// On capability failure or unusable output the pre-revision chapters are
/// returned verbatim. The result always holds exactly [`CHAPTER_COUNT`]
/// entries ordered 1..=4; this node never fails the run.
pub async fn finalize_text(text: &dyn TextGenerator, state: &StoryState) -> FinalizedText {
    let ordered = ordered_text_chapters(&state.chapters);

    let request = GenerationRequest::new(revision_prompt(state, &ordered))
        .with_temperature(0.7)
        .with_max_output_tokens(3000)
        .json();

    let revised = match text.generate(request).await {
        Ok(raw) => {
            let object = extract_object(&raw);
            object.get("chapters").and_then(Value::as_array).map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let number = entry.get("number").and_then(Value::as_u64)? as u32;
                        Some(FinalChapterText {
                            number,
                            title: entry
                                .get("title")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                            content: entry
                                .get("content")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                        })
                    })
                    .collect::<Vec<_>>()
            })
        }
        Err(e) => {
            tracing::warn!(error = %e, "text finalization failed, keeping unrevised chapters");
            None
        }
    };

    let chapters = match revised {
        Some(revised) if !revised.is_empty() => (1..=CHAPTER_COUNT as u32)
            .map(|number| {
                revised
                    .iter()
                    .find(|ch| ch.number == number)
                    .cloned()
                    // A chapter the reviser dropped keeps its unrevised text.
                    .unwrap_or_else(|| ordered[number as usize - 1].clone())
            })
            .collect(),
        _ => ordered,
    };

    FinalizedText { chapters }
}

/// Runs the finalize-images node: a deterministic merge of the image
/// artifacts into exactly [`CHAPTER_COUNT`] ordered entries, with `None`
/// for any chapter whose illustration never arrived.
pub fn finalize_images(drafts: &[ChapterDraft]) -> FinalizedImages {
    let chapters = (1..=CHAPTER_COUNT as u32)
        .map(|number| FinalChapterImage {
            number,
            image: drafts
                .iter()
                .find(|draft| draft.number == number && draft.image.is_some())
                .and_then(|draft| draft.image.clone()),
        })
        .collect();

    FinalizedImages { chapters }
}

fn revision_prompt(state: &StoryState, ordered: &[FinalChapterText]) -> String {
    let chapters_text: Vec<String> = ordered
        .iter()
        .map(|ch| format!("Chapter {}: {}\n{}", ch.number, ch.title, ch.content))
        .collect();
    let chapters_text = chapters_text.join("\n\n");

    let story_context = match &state.story_outline {
        Some(outline) => format!(
            "- Style: {}\n- Characters: {}\n- Setting: {}\n- Overall Plot: {}",
            outline.style,
            outline.characters.join(", "),
            outline.setting,
            outline.plot_summary
        ),
        None => "- (no outline available)".to_string(),
    };

    format!(
        r#"You are a professional children's story editor. Review and optimize the following 4-chapter children's story in {language} language.

STORY CONTEXT:
{story_context}

STORY CONTENT:
{chapters_text}

OPTIMIZATION TASKS:
1. Improve transitions between chapters
2. Enhance story flow and coherence
3. Refine turning points and plot transitions
4. Maintain consistency with the original style and characters

Return JSON with optimized chapters in order (number 1, 2, 3, 4):
{{
    "chapters": [
        {{"number": 1, "title": "Title", "content": "Optimized content"}},
        {{"number": 2, "title": "Title", "content": "Optimized content"}},
        {{"number": 3, "title": "Title", "content": "Optimized content"}},
        {{"number": 4, "title": "Title", "content": "Optimized content"}}
    ]
}}

IMPORTANT: Only optimize text content, keep the same structure. Return ONLY valid JSON."#,
        language = state.language,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockFailure, MockTextGenerator};
    use crate::domain::foundation::SessionId;
    use crate::domain::story::ImageHandle;

    fn state_with_drafts(drafts: Vec<ChapterDraft>) -> StoryState {
        let mut state = StoryState::fresh_run(SessionId::new("s").unwrap(), "theme", "");
        state.chapters = drafts;
        state
    }

    fn text_draft(number: u32) -> ChapterDraft {
        ChapterDraft::text(number, format!("Title {number}"), format!("Content {number}"))
    }

    #[test]
    fn ordered_chapters_sort_by_number_not_arrival() {
        let drafts = vec![text_draft(3), text_draft(1), text_draft(4), text_draft(2)];
        let ordered = ordered_text_chapters(&drafts);

        let numbers: Vec<u32> = ordered.iter().map(|ch| ch.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(ordered[0].content, "Content 1");
        assert_eq!(ordered[3].content, "Content 4");
    }

    #[test]
    fn missing_chapters_get_empty_placeholders() {
        let drafts = vec![text_draft(1), text_draft(3)];
        let ordered = ordered_text_chapters(&drafts);

        assert_eq!(ordered.len(), CHAPTER_COUNT);
        assert_eq!(ordered[1].number, 2);
        assert_eq!(ordered[1].title, "Chapter 2");
        assert_eq!(ordered[1].content, "");
        assert_eq!(ordered[3].content, "");
    }

    #[test]
    fn image_only_drafts_are_not_text_chapters() {
        let drafts = vec![
            text_draft(1),
            ChapterDraft::image(2, ImageHandle::new("url")),
        ];
        let ordered = ordered_text_chapters(&drafts);
        assert_eq!(ordered[1].content, "");
    }

    #[tokio::test]
    async fn revision_reply_is_reordered_and_used() {
        // Provider returns chapters in reverse order.
        let reply = r#"{"chapters": [
            {"number": 4, "title": "Four", "content": "revised 4"},
            {"number": 3, "title": "Three", "content": "revised 3"},
            {"number": 2, "title": "Two", "content": "revised 2"},
            {"number": 1, "title": "One", "content": "revised 1"}
        ]}"#;
        let mock = MockTextGenerator::new().with_default(reply);
        let state = state_with_drafts((1..=4).map(text_draft).collect());

        let finalized = finalize_text(&mock, &state).await;

        let numbers: Vec<u32> = finalized.chapters.iter().map(|ch| ch.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(finalized.chapters[0].content, "revised 1");
        assert_eq!(finalized.chapters[3].content, "revised 4");
    }

    #[tokio::test]
    async fn revision_failure_keeps_chapters_verbatim() {
        let mock = MockTextGenerator::new().with_default_failure(MockFailure::Unavailable);
        let state = state_with_drafts((1..=4).map(text_draft).collect());

        let finalized = finalize_text(&mock, &state).await;

        assert_eq!(finalized.chapters.len(), CHAPTER_COUNT);
        assert_eq!(finalized.chapters[0].content, "Content 1");
        assert_eq!(finalized.chapters[2].title, "Title 3");
    }

    #[tokio::test]
    async fn unparseable_revision_keeps_chapters_verbatim() {
        let mock = MockTextGenerator::new().with_default("sorry, no JSON today");
        let state = state_with_drafts((1..=4).map(text_draft).collect());

        let finalized = finalize_text(&mock, &state).await;
        assert_eq!(finalized.chapters[1].content, "Content 2");
    }

    #[tokio::test]
    async fn revision_dropping_a_chapter_keeps_its_original() {
        let reply = r#"{"chapters": [
            {"number": 1, "title": "One", "content": "revised 1"},
            {"number": 2, "title": "Two", "content": "revised 2"}
        ]}"#;
        let mock = MockTextGenerator::new().with_default(reply);
        let state = state_with_drafts((1..=4).map(text_draft).collect());

        let finalized = finalize_text(&mock, &state).await;

        assert_eq!(finalized.chapters[0].content, "revised 1");
        assert_eq!(finalized.chapters[2].content, "Content 3");
        assert_eq!(finalized.chapters.len(), CHAPTER_COUNT);
    }

    #[tokio::test]
    async fn partial_text_never_raises() {
        let mock = MockTextGenerator::new().with_default_failure(MockFailure::Network);
        let state = state_with_drafts(vec![text_draft(1), text_draft(3)]);

        let finalized = finalize_text(&mock, &state).await;

        assert_eq!(finalized.chapters.len(), CHAPTER_COUNT);
        assert_eq!(finalized.chapters[1].content, "");
        assert_eq!(finalized.chapters[3].content, "");
    }

    #[test]
    fn finalize_images_orders_and_fills_nulls() {
        let drafts = vec![
            ChapterDraft::image(4, ImageHandle::new("img4")),
            ChapterDraft::image(1, ImageHandle::new("img1")),
            text_draft(2),
        ];
        let finalized = finalize_images(&drafts);

        assert_eq!(finalized.chapters.len(), CHAPTER_COUNT);
        let numbers: Vec<u32> = finalized.chapters.iter().map(|ch| ch.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(
            finalized.chapters[0].image.as_ref().unwrap().as_str(),
            "img1"
        );
        assert!(finalized.chapters[1].image.is_none());
        assert!(finalized.chapters[2].image.is_none());
        assert_eq!(
            finalized.chapters[3].image.as_ref().unwrap().as_str(),
            "img4"
        );
    }

    #[test]
    fn finalize_images_with_no_artifacts_is_all_null() {
        let finalized = finalize_images(&[]);
        assert_eq!(finalized.chapters.len(), CHAPTER_COUNT);
        assert!(finalized.chapters.iter().all(|ch| ch.image.is_none()));
    }
}
