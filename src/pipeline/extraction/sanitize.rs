//! Model output cleanup before JSON parsing.
//!
//! Gemma-family models occasionally emit thinking blocks and stray
//! `<unusedN>` tokens, and some wrap structured answers in Markdown fences
//! even when a JSON format is requested.

use std::sync::LazyLock;

use regex::Regex;

static UNUSED_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<unused\d+>").expect("valid regex"));

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("valid regex"));

/// Strip model artifacts from a raw completion.
///
/// Handles:
/// 1. Thinking blocks (`<unusedN>thought\n...`)
/// 2. Stray `<unusedN>` tokens
/// 3. A Markdown code fence around the whole answer
/// 4. Leading/trailing whitespace
pub fn sanitize_model_output(raw: &str) -> String {
    let mut text = raw.to_string();

    if let Some(idx) = text.find("<unused") {
        if let Some(thought_offset) = text[idx..].find("thought\n") {
            text = text[idx + thought_offset + 8..].to_string();
        }
    }

    text = UNUSED_TOKEN_RE.replace_all(&text, "").to_string();

    let trimmed = text.trim();
    if let Some(caps) = FENCE_RE.captures(trimmed) {
        if let Some(inner) = caps.get(1) {
            return inner.as_str().trim().to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_thinking_block() {
        let raw = "<unused94>thought\n{\"appendectomy\": null}";
        assert_eq!(sanitize_model_output(raw), "{\"appendectomy\": null}");
    }

    #[test]
    fn strips_unused_tokens() {
        assert_eq!(sanitize_model_output("{<unused3>}"), "{}");
    }

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(sanitize_model_output(raw), "{\"a\": 1}");
        assert_eq!(sanitize_model_output("```\n[]\n```"), "[]");
    }

    #[test]
    fn clean_json_unchanged() {
        let raw = "{\"ibd_type\": {\"citation\": \"UC\", \"value\": \"uc\", \"note_id\": 3}}";
        assert_eq!(sanitize_model_output(raw), raw);
    }

    #[test]
    fn whitespace_only_returns_empty() {
        assert_eq!(sanitize_model_output("  \n "), "");
    }
}
