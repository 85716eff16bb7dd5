//! Planner node - produces the story outline (or asks for more detail).
//!
//! The planner is the only node that sees the raw theme. It detects the
//! story language, decides whether enough information exists, and emits
//! either a needs-info result or a normalized 4-chapter outline. Provider
//! output is treated as untrusted: every field has a default, and a
//! terminal provider failure is absorbed with an ad-hoc outline. This node
//! never fails the run.

use serde_json::{Map, Value};

use crate::domain::story::{
    extract_object, ChapterStub, Intent, StoryOutline, StoryState, DEFAULT_LANGUAGE,
};
use crate::ports::{GenerationRequest, TextGenerator};

/// What the planner decided.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// Not enough information for an outline; ask the user instead.
    NeedsInfo {
        language: String,
        missing_fields: Vec<String>,
        suggestions: Vec<String>,
    },
    /// A complete, normalized outline.
    Outline {
        language: String,
        outline: StoryOutline,
    },
}

/// Runs the planner for the current turn.
///
/// When the turn is a regeneration and a prior outline exists, the prompt
/// asks for an in-place revision of that outline; otherwise it plans from
/// scratch.
pub async fn plan(text: &dyn TextGenerator, state: &StoryState) -> PlanOutcome {
    let existing = match (state.intent, &state.story_outline) {
        (Intent::Regenerate, Some(outline)) => Some(outline),
        _ => None,
    };

    let prompt = match existing {
        Some(outline) => revision_prompt(&state.theme, &state.memory_summary, outline),
        None => fresh_prompt(&state.theme, &state.memory_summary),
    };

    let request = GenerationRequest::new(prompt)
        .with_temperature(0.7)
        .with_max_output_tokens(2000)
        .json();

    match text.generate(request).await {
        Ok(raw) => {
            let object = extract_object(&raw);
            if object.is_empty() {
                tracing::warn!("planner received no parseable JSON, using defaults");
            }
            outcome_from_json(object)
        }
        Err(e) => {
            tracing::warn!(error = %e, "planner generation failed, using ad-hoc outline");
            PlanOutcome::Outline {
                language: DEFAULT_LANGUAGE.to_string(),
                outline: StoryOutline::fallback(&state.theme),
            }
        }
    }
}

/// Builds a [`PlanOutcome`] from provider JSON, defaulting every missing or
/// malformed field.
fn outcome_from_json(object: Map<String, Value>) -> PlanOutcome {
    let language = object
        .get("language")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string();

    if object
        .get("needs_info")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return PlanOutcome::NeedsInfo {
            language,
            missing_fields: string_list(object.get("missing_fields")),
            suggestions: string_list(object.get("suggestions")),
        };
    }

    let empty = Map::new();
    let outline_object = object
        .get("story_outline")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let characters = {
        let list = string_list(outline_object.get("characters"));
        if list.is_empty() {
            vec!["Main Character".to_string()]
        } else {
            list
        }
    };

    let chapters = outline_object
        .get("chapters")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .enumerate()
                .map(|(index, entry)| stub_from_json(index, entry))
                .collect()
        })
        .unwrap_or_default();

    let outline = StoryOutline {
        style: field_or(outline_object, "style", "adventure"),
        characters,
        setting: field_or(outline_object, "setting", "A magical place"),
        plot_summary: field_or(outline_object, "plot_summary", "An exciting adventure unfolds"),
        chapters,
    }
    .normalized();

    PlanOutcome::Outline { language, outline }
}

fn stub_from_json(index: usize, entry: &Value) -> ChapterStub {
    let number = entry
        .get("number")
        .and_then(Value::as_u64)
        .map(|n| n as u32)
        .unwrap_or(index as u32 + 1);
    let defaults = ChapterStub::placeholder(number);

    ChapterStub {
        number,
        title: entry
            .get("title")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&defaults.title)
            .to_string(),
        summary: entry
            .get("summary")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&defaults.summary)
            .to_string(),
        image_description: entry
            .get("image_description")
            .and_then(Value::as_str)
            .unwrap_or(&defaults.image_description)
            .to_string(),
    }
}

fn field_or(object: &Map<String, Value>, key: &str, default: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default)
        .to_string()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

const OUTPUT_CONTRACT: &str = r#"IMPORTANT RULES:
- The "language" field MUST match the language of the user's input
- The "image_description" field for each chapter MUST be in English, regardless of the detected language (image providers expect English prompts)

Return JSON in one of these formats:

If information is INCOMPLETE (use the detected language for missing_fields and suggestions):
{
    "needs_info": true,
    "language": "en",
    "missing_fields": ["field1", "field2"],
    "suggestions": ["suggestion1", "suggestion2"]
}

If information is COMPLETE (use the detected language for titles and summaries):
{
    "needs_info": false,
    "language": "en",
    "story_outline": {
        "style": "adventure|fantasy|educational|friendship",
        "characters": ["character1", "character2"],
        "setting": "setting description",
        "plot_summary": "overall plot",
        "chapters": [
            {"number": 1, "title": "Title", "summary": "Summary", "image_description": "English description for image generation"},
            {"number": 2, "title": "Title", "summary": "Summary", "image_description": "English description for image generation"},
            {"number": 3, "title": "Title", "summary": "Summary", "image_description": "English description for image generation"},
            {"number": 4, "title": "Title", "summary": "Summary", "image_description": "English description for image generation"}
        ]
    }
}"#;

fn fresh_prompt(theme: &str, summary: &str) -> String {
    let context = if summary.is_empty() {
        String::new()
    } else {
        format!("Memory summary: {summary}\n")
    };

    format!(
        r#"Analyze the user's theme and determine if there's enough information to create a complete 4-chapter children's story.

{context}User theme: {theme}

Steps:
1. Detect the language of the user's input ("zh" for Chinese, "en" for English, "es", "fr", "de", ... for others). Detect from the actual content, never default to "en".
2. Evaluate if the theme has enough information (clear characters, setting, plot direction). If not, set needs_info=true.
3. If needs_info=true, provide missing_fields and suggestions in the detected language.
4. If needs_info=false, generate the complete story outline in the detected language.

{OUTPUT_CONTRACT}"#
    )
}

fn revision_prompt(theme: &str, summary: &str, outline: &StoryOutline) -> String {
    let context = if summary.is_empty() {
        String::new()
    } else {
        format!("Memory summary: {summary}\n")
    };

    let mut outline_context = format!(
        "=== EXISTING STORY OUTLINE (MODIFY THIS) ===\nStyle: {}\nCharacters: {}\nSetting: {}\nPlot Summary: {}\nChapters:\n",
        outline.style,
        outline.characters.join(", "),
        outline.setting,
        outline.plot_summary
    );
    for chapter in &outline.chapters {
        outline_context.push_str(&format!(
            "  Chapter {}: {} - {}\n",
            chapter.number, chapter.title, chapter.summary
        ));
    }

    format!(
        r#"You are modifying an existing children's story based on user feedback.

{context}User request: {theme}

{outline_context}
=== YOUR TASK ===
MODIFY the existing story outline above according to the user's request:
1. Keep elements the user doesn't want changed
2. Change elements the user asked about
3. Maintain story coherence and consistency
4. Detect the language from the user's input (keep the same language if not specified)

{OUTPUT_CONTRACT}"#
    )
}
