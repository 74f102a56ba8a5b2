//! Recover an `OracleResult` from whatever text the oracle sent back.
//!
//! Attempts, in order, stopping at the first that decodes:
//! 1. the whole text as one JSON object;
//! 2. the text with a single leading/trailing code fence stripped;
//! 3. the slice from the first `{` to the last `}`.
//!
//! Anything else yields `None`. Failures are logged, never raised.

use serde_json::Value;

use crate::model::{MatchCandidate, OracleResult, Record};

pub fn extract(raw: &str) -> Option<OracleResult> {
    let text = raw.trim();

    if let Some(result) = decode(text) {
        return Some(result);
    }

    if let Some(inner) = strip_code_fence(text) {
        if let Some(result) = decode(inner) {
            log::debug!("oracle output was wrapped in a code fence");
            return Some(result);
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Some(result) = decode(&text[start..=end]) {
                log::debug!("oracle output had text around the JSON object");
                return Some(result);
            }
        }
    }

    log::warn!(
        "failed to extract a JSON result from oracle output ({} bytes): {}",
        raw.len(),
        preview(raw)
    );
    None
}

/// Strip one opening code fence (optional language tag) and one closing fence.
fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    Some(rest.trim())
}

fn decode(text: &str) -> Option<OracleResult> {
    let value: Value = serde_json::from_str(text).ok()?;
    from_value(value)
}

/// Decode a parsed JSON value into an `OracleResult`.
///
/// Requires an object whose `matches` (if present) is an array. Individual
/// malformed candidates are skipped rather than discarding the whole unit.
pub fn from_value(value: Value) -> Option<OracleResult> {
    let Value::Object(mut obj) = value else {
        return None;
    };

    let raw_matches = match obj.remove("matches") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => return None,
    };

    let mut matches = Vec::with_capacity(raw_matches.len());
    for item in raw_matches {
        match serde_json::from_value::<MatchCandidate>(item) {
            Ok(candidate) => matches.push(candidate),
            Err(e) => log::warn!("skipping malformed match candidate: {e}"),
        }
    }

    Some(OracleResult {
        matches,
        unmatched_a: record_list(obj.remove("unmatched_file_a_entries")),
        unmatched_b: record_list(obj.remove("unmatched_file_b_entries")),
    })
}

fn record_list(value: Option<Value>) -> Option<Vec<Record>> {
    match value? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

fn preview(raw: &str) -> String {
    const MAX: usize = 200;
    match raw.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &raw[..idx]),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> OracleResult {
        OracleResult::default()
    }

    #[test]
    fn plain_json() {
        assert_eq!(extract(r#"{"matches":[]}"#), Some(empty()));
    }

    #[test]
    fn fenced_json_with_language_tag() {
        assert_eq!(extract("```json\n{\"matches\":[]}\n```"), Some(empty()));
    }

    #[test]
    fn fenced_json_without_language_tag() {
        assert_eq!(extract("```\n{\"matches\":[]}\n```"), Some(empty()));
    }

    #[test]
    fn fenced_json_on_one_line() {
        assert_eq!(extract("```json{\"matches\":[]}```"), Some(empty()));
    }

    #[test]
    fn noise_around_object() {
        assert_eq!(
            extract(r#"prefix noise {"matches":[]} trailing noise"#),
            Some(empty())
        );
    }

    #[test]
    fn prose_and_fence_around_object() {
        let text = "Here is the result:\n```json\n{\"matches\": []}\n```\nLet me know!";
        assert_eq!(extract(text), Some(empty()));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(extract("not json at all"), None);
        assert_eq!(extract(""), None);
        assert_eq!(extract("} backwards {"), None);
    }

    #[test]
    fn non_object_json_is_none() {
        assert_eq!(extract("[1, 2, 3]"), None);
        assert_eq!(extract(r#"{"matches": "none"}"#), None);
    }

    #[test]
    fn truncated_json_is_none() {
        assert_eq!(extract(r#"{"matches": [{"file_a_entry": {"#), None);
    }

    #[test]
    fn keeps_lists_and_skips_bad_candidates() {
        let text = r#"{
            "matches": [
                {"file_a_entry": {"id": 1}, "file_b_entry": {"id": "x"}, "confidence_score": 0.9, "match_reason": "id"},
                {"file_a_entry": "oops", "file_b_entry": {}},
                42
            ],
            "unmatched_file_a_entries": [{"id": 2}, "stray"],
            "unmatched_file_b_entries": []
        }"#;
        let result = extract(text).unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].record_a["id"], 1);
        assert_eq!(result.unmatched_a.as_ref().unwrap().len(), 1);
        assert_eq!(result.unmatched_b.as_ref().unwrap().len(), 0);
    }

    #[test]
    fn preview_truncates_long_output() {
        let long = "x".repeat(500);
        let p = preview(&long);
        assert!(p.ends_with('…'));
        assert_eq!(p.chars().count(), 201);
    }
}
