//! Writer branch - generates one chapter's prose.
//!
//! A writer branch always makes progress: on any generation failure it
//! substitutes placeholder content and still marks itself complete, so the
//! writer barrier can never be stalled by one failing chapter. The only
//! no-op case is a chapter number missing from the outline, which
//! contributes nothing.

use crate::domain::story::{extract_object, ChapterDraft, ChapterStub, StoryOutline};
use crate::ports::{GenerationRequest, TextGenerator};

use super::BranchOutput;

/// Runs writer branch `number`.
pub async fn write_chapter(
    text: &dyn TextGenerator,
    outline: &StoryOutline,
    language: &str,
    number: u32,
) -> BranchOutput {
    let Some(stub) = outline.chapter(number) else {
        tracing::warn!(chapter = number, "chapter not found in outline, writer skipped");
        return BranchOutput::empty();
    };

    let request = GenerationRequest::new(writer_prompt(outline, stub, language, number))
        .with_temperature(0.8)
        .with_max_output_tokens(500)
        .json();

    let content = match text.generate(request).await {
        Ok(raw) => {
            let object = extract_object(&raw);
            object
                .get("content")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| placeholder_content(number))
        }
        Err(e) => {
            tracing::warn!(chapter = number, error = %e, "chapter generation failed, using placeholder");
            placeholder_content(number)
        }
    };

    BranchOutput {
        chapters: vec![ChapterDraft::text(number, stub.title.clone(), content)],
        completed_writers: vec![number],
        completed_image_gens: vec![],
    }
}

fn placeholder_content(number: u32) -> String {
    format!("Chapter {number} content")
}

fn writer_prompt(outline: &StoryOutline, stub: &ChapterStub, language: &str, number: u32) -> String {
    format!(
        r#"You are a professional children's story writer. Write Chapter {number} of a children's story in {language} language.

STORY CONTEXT:
- Style: {style}
- Main Characters: {characters}
- Setting: {setting}
- Overall Plot: {plot}

CHAPTER REQUIREMENTS:
- Title: {title}
- Summary: {summary}
- Length: 200-300 words
- Target Audience: Children (age-appropriate language and themes)

WRITING GUIDELINES:
1. Write ONLY the story content - no meta-commentary, no notes, no explanations
2. Use vivid, descriptive language that engages children's imagination
3. Show, don't tell - use actions and dialogue to convey emotions and events
4. Maintain consistency with the established characters, setting, and style
5. Use simple but rich vocabulary appropriate for children

CRITICAL RULES:
- DO NOT include any text outside the story narrative
- DO NOT mention "Chapter {number}" or any chapter numbers in the text

Return JSON format:
{{
    "content": "The complete chapter text - pure story narrative only"
}}"#,
        style = outline.style,
        characters = outline.characters.join(", "),
        setting = outline.setting,
        plot = outline.plot_summary,
        title = stub.title,
        summary = stub.summary,
    )
}
