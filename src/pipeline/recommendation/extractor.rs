use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::types::{ParseFailure, RawSuggestion};

/// ```json ... ``` (case-insensitive tag, lazy body).
static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json\s*(.*?)```").expect("valid regex"));

/// Any fenced block.
static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*(.*?)```").expect("valid regex"));

/// Recover the suggestion list from raw oracle text.
///
/// Candidate blocks are tried in order (```json fence, any fence starting
/// with `{`, any embedded object with the expected key, first `{` .. last
/// `}`); the first one that parses as an object
/// with a `recommendations` array wins. An empty array is a valid result.
pub fn extract_suggestions(response: &str) -> Result<Vec<RawSuggestion>, ParseFailure> {
    let candidates = json_candidates(response);
    if candidates.is_empty() {
        return Err(ParseFailure {
            reason: "no JSON block found".into(),
        });
    }

    let mut last_reason = String::new();
    for candidate in candidates {
        match parse_candidate(candidate) {
            Ok(suggestions) => return Ok(suggestions),
            Err(reason) => last_reason = reason,
        }
    }
    Err(ParseFailure {
        reason: last_reason,
    })
}

fn json_candidates(response: &str) -> Vec<&str> {
    let trimmed = response.trim();
    let mut candidates = Vec::new();

    if let Some(block) = JSON_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        candidates.push(block.as_str().trim());
    }

    for caps in ANY_FENCE.captures_iter(trimmed) {
        if let Some(block) = caps.get(1) {
            let block = block.as_str().trim();
            if block.starts_with('{') && !candidates.contains(&block) {
                candidates.push(block);
            }
        }
    }

    // Every `{` that opens a complete object carrying the expected key,
    // so braces in surrounding prose do not hide the answer.
    for (start, _) in trimmed.match_indices('{') {
        if let Some(block) = object_with_recommendations(&trimmed[start..]) {
            if !candidates.contains(&block) {
                candidates.push(block);
            }
        }
    }

    // Find the first { and last }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            let block = &trimmed[start..=end];
            if !candidates.contains(&block) {
                candidates.push(block);
            }
        }
    }

    candidates
}

/// The leading JSON value of `text` when it is an object with a
/// `recommendations` array; trailing text is ignored.
fn object_with_recommendations(text: &str) -> Option<&str> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    let value = stream.next()?.ok()?;
    value.get("recommendations")?.as_array()?;
    Some(&text[..stream.byte_offset()])
}

fn parse_candidate(block: &str) -> Result<Vec<RawSuggestion>, String> {
    let value: Value = serde_json::from_str(block).map_err(|e| format!("invalid JSON: {e}"))?;
    let object = value
        .as_object()
        .ok_or_else(|| "top-level value is not an object".to_string())?;
    let items = object
        .get("recommendations")
        .ok_or_else(|| "missing \"recommendations\" key".to_string())?
        .as_array()
        .ok_or_else(|| "\"recommendations\" is not an array".to_string())?;

    let suggestions: Vec<RawSuggestion> = items.iter().filter_map(parse_item_lenient).collect();
    if suggestions.len() < items.len() {
        tracing::debug!(
            skipped = items.len() - suggestions.len(),
            "Skipped malformed recommendation entries"
        );
    }
    Ok(suggestions)
}

/// One array entry; `None` when it is not an object or has no usable index.
fn parse_item_lenient(item: &Value) -> Option<RawSuggestion> {
    let fields = item.as_object()?;
    let doctor_index = fields.get("doctor_index").and_then(as_index)?;

    Some(RawSuggestion {
        doctor_index,
        match_score: fields.get("match_score").and_then(as_number).unwrap_or(0.0),
        reason: fields
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        priority: fields
            .get("priority")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn as_index(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let f = as_number(value)?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{"recommendations":[{"doctor_index":2,"match_score":91,"reason":"Cardiology fit","priority":"High"},{"doctor_index":0,"match_score":74,"reason":"Broad experience","priority":"Medium"}]}"#;

    fn indices(suggestions: &[RawSuggestion]) -> Vec<i64> {
        suggestions.iter().map(|s| s.doctor_index).collect()
    }

    #[test]
    fn bare_json_parses() {
        let suggestions = extract_suggestions(BARE).unwrap();
        assert_eq!(indices(&suggestions), vec![2, 0]);
        assert_eq!(suggestions[0].match_score, 91.0);
        assert_eq!(suggestions[0].reason, "Cardiology fit");
        assert_eq!(suggestions[1].priority.as_deref(), Some("Medium"));
    }

    #[test]
    fn wrapper_invariance() {
        let expected = extract_suggestions(BARE).unwrap();
        let wrapped = [
            format!("Here are my picks:\n{BARE}\nLet me know if you need more."),
            format!("```json\n{BARE}\n```"),
            format!("Sure!\n\n```JSON\n{BARE}\n```\n\nHope this helps."),
            format!("```\n{BARE}\n```"),
            format!("  \n{BARE}\n  "),
            format!("Scores use the range {{0-100}}.\n{BARE}"),
            format!("{BARE}\nLet me know {{if}} you need more."),
            format!("Considered {{\"doctors\": 3}} first.\n{BARE}\nDone {{ok}}."),
        ];
        for text in &wrapped {
            assert_eq!(extract_suggestions(text).unwrap(), expected, "input: {text}");
        }
    }

    #[test]
    fn json_fence_preferred_over_other_braces() {
        let text = format!(
            "Scoring notes {{draft}} follow.\n```json\n{BARE}\n```\nIgnore {{this}}."
        );
        assert_eq!(indices(&extract_suggestions(&text).unwrap()), vec![2, 0]);
    }

    #[test]
    fn later_candidate_used_when_fence_is_unusable() {
        let text = format!("```json\nnot json\n```\n{BARE}");
        assert_eq!(indices(&extract_suggestions(&text).unwrap()), vec![2, 0]);
    }

    #[test]
    fn nested_item_objects_are_not_mistaken_for_the_answer() {
        let text = format!("Draft: {{\"doctor_index\": 7}}\n{BARE}");
        assert_eq!(indices(&extract_suggestions(&text).unwrap()), vec![2, 0]);
    }

    #[test]
    fn no_json_is_parse_failure() {
        let result = extract_suggestions("I cannot help with that request.");
        assert!(result.is_err());
        assert!(extract_suggestions("").is_err());
    }

    #[test]
    fn invalid_json_is_parse_failure() {
        let result = extract_suggestions(r#"{"recommendations": [ {"doctor_index": 1,, }"#);
        assert!(result.unwrap_err().reason.contains("invalid JSON"));
    }

    #[test]
    fn missing_or_wrong_key_is_parse_failure() {
        assert!(extract_suggestions(r#"{"doctors": []}"#).is_err());
        assert!(extract_suggestions(r#"{"recommendations": {"doctor_index": 1}}"#).is_err());
    }

    #[test]
    fn empty_list_is_valid() {
        assert!(extract_suggestions(r#"{"recommendations": []}"#).unwrap().is_empty());
    }

    #[test]
    fn lenient_items() {
        let text = r#"{"recommendations": [
            "not an object",
            {"match_score": 50},
            {"doctor_index": "3", "match_score": "88.6"},
            {"doctor_index": 1.0, "reason": "ok", "priority": "low"},
            {"doctor_index": 1.5},
            {"doctor_index": -1, "match_score": 40},
            {"doctor_index": 3, "match_score": 10}
        ]}"#;
        let suggestions = extract_suggestions(text).unwrap();
        assert_eq!(indices(&suggestions), vec![3, 1, -1, 3]);
        assert_eq!(suggestions[0].match_score, 88.6);
        assert_eq!(suggestions[0].reason, "");
        assert_eq!(suggestions[0].priority, None);
        assert_eq!(suggestions[1].match_score, 0.0);
        assert_eq!(suggestions[1].priority.as_deref(), Some("low"));
    }
}
