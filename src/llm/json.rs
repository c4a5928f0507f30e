// src/llm/json.rs
// Pull a JSON object out of model output that may be wrapped in prose or fences

use serde_json::Value;

/// Locate the outermost `{ ... }` in `text`, ignoring Markdown code fences and
/// any chatter around it, and parse it.
pub fn extract_json_object(text: &str) -> Result<Value, serde_json::Error> {
    let trimmed = strip_code_fence(text.trim());
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&trimmed[start..=end]),
        _ => serde_json::from_str(trimmed),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the language tag line (```json)
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_object() {
        let value = extract_json_object(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn strips_fenced_block() {
        let text = "```json\n{\"questions\": []}\n```";
        let value = extract_json_object(text).unwrap();
        assert!(value["questions"].is_array());
    }

    #[test]
    fn ignores_surrounding_prose() {
        let text = "Sure! Here you go:\n{\"isCorrect\": true, \"feedback\": \"ok\"}\nLet me know.";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["isCorrect"], true);
    }

    #[test]
    fn rejects_non_json() {
        assert!(extract_json_object("I cannot help with that").is_err());
    }
}
