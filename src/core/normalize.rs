//! Structured-output extraction
//!
//! Providers do not reliably honor strict JSON mode, so callers asking for
//! structured output get a lenient extractor: the first greedy `{...}` or
//! `[...]` span is pulled out of the generated text and parsed. Surrounding
//! prose is tolerated. When several JSON-like substrings appear, the greedy
//! span runs from the first opening brace to the last closing one. That is
//! the historical behavior and it is kept as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::core::types::errors::RouterError;

static JSON_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}|\[.*\]").expect("static regex"));

/// Extract and parse the first JSON-looking span in `text`.
///
/// Returns [`RouterError::NoJsonFound`] when no candidate span exists or the
/// span does not parse.
pub fn extract_json(text: &str) -> Result<Value, RouterError> {
    let span = JSON_SPAN.find(text).ok_or(RouterError::NoJsonFound)?;
    serde_json::from_str(span.as_str()).map_err(|_| RouterError::NoJsonFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_with_surrounding_prose() {
        let parsed = extract_json("Here you go: {\"a\":1} hope that helps!").unwrap();
        assert_eq!(parsed, json!({"a": 1}));
    }

    #[test]
    fn test_bare_array() {
        let parsed = extract_json("[1, 2, 3]").unwrap();
        assert_eq!(parsed, json!([1, 2, 3]));
    }

    #[test]
    fn test_multiline_object() {
        let text = "result:\n{\n  \"ok\": true,\n  \"items\": [\"a\", \"b\"]\n}\ndone";
        let parsed = extract_json(text).unwrap();
        assert_eq!(parsed, json!({"ok": true, "items": ["a", "b"]}));
    }

    #[test]
    fn test_no_json_present() {
        let err = extract_json("plain prose, nothing structured").unwrap_err();
        assert!(matches!(err, RouterError::NoJsonFound));
    }

    #[test]
    fn test_unparseable_span() {
        let err = extract_json("{not valid json}").unwrap_err();
        assert!(matches!(err, RouterError::NoJsonFound));
    }

    #[test]
    fn test_multiple_spans_keep_greedy_behavior() {
        // The greedy span covers both objects and fails to parse. This
        // ambiguity is intentional and pinned here.
        let err = extract_json("example {\"x\":1} answer {\"y\":2}").unwrap_err();
        assert!(matches!(err, RouterError::NoJsonFound));
    }

    #[test]
    fn test_nested_object() {
        let parsed = extract_json("prefix {\"a\": {\"b\": [1, 2]}} suffix").unwrap();
        assert_eq!(parsed, json!({"a": {"b": [1, 2]}}));
    }
}
