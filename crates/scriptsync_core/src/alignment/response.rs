//! Extracting structured scenes from free-form model output.
//!
//! The model is asked for bare JSON but routinely wraps it in markdown
//! fences or conversational framing. Extraction tries progressively
//! more permissive strategies before giving up.

use serde_json::Value;

use super::errors::AlignmentError;
use crate::models::AlignmentResult;

/// Extract a JSON value from model output.
///
/// Strategies, in order: parse the whole text, parse the contents of
/// the first markdown code fence, parse the span from the first `{` to
/// the last `}`.
pub fn extract_json(text: &str) -> Result<Value, AlignmentError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AlignmentError::EmptyResponse);
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(fenced) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str(fenced.trim()) {
            return Ok(value);
        }
    }

    if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if open < close {
            if let Ok(value) = serde_json::from_str(&trimmed[open..=close]) {
                return Ok(value);
            }
        }
    }

    Err(AlignmentError::malformed(format!(
        "no parseable JSON in {} chars of response",
        trimmed.len()
    )))
}

/// Contents of the first ``` code fence, tolerating a language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip the language tag line if present ("json\n{...").
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Parse model output into an alignment result with normalized scenes.
pub fn parse_alignment(text: &str) -> Result<AlignmentResult, AlignmentError> {
    let value = extract_json(text)?;
    let mut result: AlignmentResult = serde_json::from_value(value)
        .map_err(|e| AlignmentError::malformed(format!("unexpected scene shape: {e}")))?;
    for scene in &mut result.scenes {
        scene.normalize();
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"scenes": [{"scene_number": 1, "start_time": "00:00:05", "end_time": "00:00:15", "narration": "A storm gathers."}], "notes": "clean pass"}"#;

    #[test]
    fn raw_fenced_and_prose_wrapped_parse_identically() {
        let fenced = format!("```json\n{PAYLOAD}\n```");
        let prose = format!("Here is the alignment you asked for:\n{PAYLOAD}\nLet me know!");

        for text in [PAYLOAD.to_string(), fenced, prose] {
            let result = parse_alignment(&text).unwrap();
            assert_eq!(result.scenes.len(), 1);
            assert_eq!(result.scenes[0].narration, "A storm gathers.");
            assert_eq!(result.notes.as_deref(), Some("clean pass"));
        }
    }

    #[test]
    fn fence_without_language_tag() {
        let text = format!("```\n{PAYLOAD}\n```");
        assert_eq!(parse_alignment(&text).unwrap().scenes.len(), 1);
    }

    #[test]
    fn normalization_runs_on_parse() {
        let text = r#"{"scenes": [{"start_time": " 00:00:05 ", "end_time": "00:00:15", "narration": "  padded  "}]}"#;
        let result = parse_alignment(text).unwrap();
        assert_eq!(result.scenes[0].narration, "padded");
        assert_eq!(result.scenes[0].duration_seconds, Some(10.0));
    }

    #[test]
    fn empty_text_is_empty_response() {
        assert!(matches!(
            parse_alignment("   \n"),
            Err(AlignmentError::EmptyResponse)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            parse_alignment("I could not find any scenes in this video."),
            Err(AlignmentError::MalformedResponse(_))
        ));
    }

    #[test]
    fn truncated_json_is_malformed() {
        assert!(matches!(
            extract_json(r#"{"scenes": [{"start_time": "00:"#),
            Err(AlignmentError::MalformedResponse(_))
        ));
    }
}
