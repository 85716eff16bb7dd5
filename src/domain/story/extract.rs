//! Permissive JSON extraction from generation-capability output.
//!
//! Providers asked for JSON still wrap it in prose or markdown code fences
//! often enough that every caller goes through this one lenient path:
//! locate a JSON object anywhere in the text, parse it, and degrade to an
//! empty object when nothing parseable is found. Extraction failure is a
//! normal outcome here, never an error the caller has to handle.

use serde_json::{Map, Value};

/// Extracts the first JSON object from `text`.
///
/// Search order:
/// 1. inside a ``` / ```json code fence,
/// 2. the first balanced `{ ... }` span that parses, scanning successive
///    `{` positions (an unclosed brace earlier in the text must not mask a
///    valid object after it),
///
/// returning an empty map when neither yields a parseable object.
pub fn extract_object(text: &str) -> Map<String, Value> {
    let trimmed = text.trim();

    if let Some(candidate) = from_code_fence(trimmed) {
        if let Some(object) = parse_object(&candidate) {
            return object;
        }
    }

    let mut search_from = 0;
    while let Some(offset) = trimmed[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(candidate) = balanced_span(trimmed, start) {
            if let Some(object) = parse_object(candidate) {
                return object;
            }
        }
        search_from = start + 1;
    }

    Map::new()
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn from_code_fence(s: &str) -> Option<String> {
    let patterns = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for pattern in patterns {
        if let Some(start) = s.find(pattern) {
            let body_start = start + pattern.len();
            if let Some(end) = s[body_start..].find("```") {
                return Some(s[body_start..body_start + end].trim().to_string());
            }
        }
    }
    None
}

/// Finds the balanced `{...}` span starting at byte offset `start`,
/// respecting string literals and escapes.
fn balanced_span(s: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_object() {
        let object = extract_object(r#"{"intent": "chat"}"#);
        assert_eq!(object["intent"], "chat");
    }

    #[test]
    fn extracts_from_json_code_fence() {
        let text = "Here you go:\n```json\n{\"intent\": \"chat\"}\n```\nDone.";
        let object = extract_object(text);
        assert_eq!(object["intent"], "chat");
    }

    #[test]
    fn extracts_from_plain_code_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_object(text)["a"], 1);
    }

    #[test]
    fn extracts_object_with_surrounding_prose() {
        let text = "Sure! The answer is {\"content\": \"Once upon a time\"} - enjoy.";
        assert_eq!(extract_object(text)["content"], "Once upon a time");
    }

    #[test]
    fn handles_nested_objects_and_braces_in_strings() {
        let text = r#"{"outer": {"inner": "has } brace"}, "n": 2}"#;
        let object = extract_object(text);
        assert_eq!(object["outer"]["inner"], "has } brace");
        assert_eq!(object["n"], 2);
    }

    #[test]
    fn handles_escaped_quotes_in_strings() {
        let text = r#"{"quote": "she said \"hi\""}"#;
        assert_eq!(extract_object(text)["quote"], "she said \"hi\"");
    }

    #[test]
    fn garbage_yields_empty_object() {
        assert!(extract_object("no json here at all").is_empty());
        assert!(extract_object("").is_empty());
        assert!(extract_object("{truncated").is_empty());
        assert!(extract_object("[1, 2, 3]").is_empty());
    }

    #[test]
    fn malformed_fence_falls_back_to_balanced_scan() {
        let text = "```json\n{broken\n```\nbut later {\"ok\": true} appears";
        assert_eq!(extract_object(text)["ok"], true);
    }

    #[test]
    fn unicode_content_survives_extraction() {
        let text = r#"{"memory_summary": "用户想要一个关于兔子的故事"}"#;
        assert_eq!(
            extract_object(text)["memory_summary"],
            "用户想要一个关于兔子的故事"
        );
    }
}
