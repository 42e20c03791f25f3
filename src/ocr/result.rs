//! Turns an OCR response body into what the result panel shows.

use serde::Deserialize;
use serde_json::Value;

/// One recognized line, when the backend was asked for boxes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OcrBox {
    pub text: String,
    /// `[x1, y1, x2, y2]` in crop pixels.
    pub bbox: Vec<i64>,
    pub confidence: f64,
}

/// Text for the result panel.
///
/// A non-empty string `text` is shown as is; a non-zero number or `true`
/// is shown in its JSON form. Anything else, including an array or object
/// `text`, falls back to the whole body pretty-printed in the server's key
/// order, so a successful response is never shown as empty.
pub fn display_text(body: &Value) -> String {
    match body.get("text") {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => {
            let body = integral_floats_as_ints(body.clone());
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
        }
    }
}

/// Rewrites integral floats such as `1.0` as `1`.
fn integral_floats_as_ints(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::from(f as i64),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(integral_floats_as_ints).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, integral_floats_as_ints(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Boxes in the response, skipping entries that don't have the expected shape.
pub fn boxes(body: &Value) -> Vec<OcrBox> {
    body.get("boxes")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_shown_verbatim() {
        assert_eq!(display_text(&json!({"text": "Hello"})), "Hello");
        assert_eq!(display_text(&json!({"text": "a\n  b", "boxes": []})), "a\n  b");
    }

    #[test]
    fn test_missing_text_pretty_prints_body() {
        let body = json!({"boxes": [{"text": "x", "bbox": [1, 2, 3, 4], "confidence": 0.9}]});
        let shown = display_text(&body);
        assert_eq!(shown, serde_json::to_string_pretty(&body).unwrap());
        assert!(shown.starts_with("{\n  \"boxes\": ["));
    }

    #[test]
    fn test_empty_or_falsy_text_falls_back() {
        assert_eq!(display_text(&json!({"text": ""})), "{\n  \"text\": \"\"\n}");
        assert_eq!(display_text(&json!({"text": null})), "{\n  \"text\": null\n}");
        assert_eq!(display_text(&json!({"text": 0})), "{\n  \"text\": 0\n}");
        assert_eq!(display_text(&json!({"text": false})), "{\n  \"text\": false\n}");
    }

    #[test]
    fn test_truthy_scalar_text_shown() {
        assert_eq!(display_text(&json!({"text": 42})), "42");
        assert_eq!(display_text(&json!({"text": true})), "true");
    }

    #[test]
    fn test_fallback_keeps_response_key_order() {
        let raw = r#"{"text":"","boxes":[{"text":"a","bbox":[0,0,1,1],"confidence":1.0}]}"#;
        let body: Value = serde_json::from_str(raw).unwrap();
        let expected = "{\n  \"text\": \"\",\n  \"boxes\": [\n    {\n      \"text\": \"a\",\n      \"bbox\": [\n        0,\n        0,\n        1,\n        1\n      ],\n      \"confidence\": 1\n    }\n  ]\n}";
        assert_eq!(display_text(&body), expected);
    }

    #[test]
    fn test_fractional_numbers_unchanged() {
        let body: Value = serde_json::from_str(r#"{"score":0.25,"n":3}"#).unwrap();
        assert_eq!(display_text(&body), "{\n  \"score\": 0.25,\n  \"n\": 3\n}");
    }

    #[test]
    fn test_boxes_parsed_and_malformed_skipped() {
        let body = json!({
            "text": "ab",
            "boxes": [
                {"text": "a", "bbox": [0, 0, 10, 10], "confidence": 0.99},
                {"text": "b"}
            ]
        });
        let parsed = boxes(&body);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].bbox, vec![0, 0, 10, 10]);
        assert!(boxes(&json!({"text": "x"})).is_empty());
    }
}
