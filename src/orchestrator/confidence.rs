//! Confidence scoring and reasoning extraction
//!
//! Both are heuristics over an agent's output. The confidence score is a
//! bounded metadata field; the reasoning sentence is a best-effort
//! annotation that never fails.

use crate::types::ToolCallRecord;

const BASE_CONFIDENCE: f64 = 0.7;
const TOOL_SUCCESS_WEIGHT: f64 = 0.2;
const LENGTH_BONUS: f64 = 0.1;
/// Threshold in characters, not bytes
const LENGTH_THRESHOLD: usize = 500;

const CAUSAL_CONNECTIVES: &[&str] = &[
    "because",
    "therefore",
    "since",
    "due to",
    "as a result",
    "consequently",
    "thus",
    "so that",
];

/// Score an agent response: base 0.7, up to +0.2 scaled by the fraction of
/// successful tool calls, +0.1 for substantial output, clamped to [0, 1].
pub fn score(tool_calls: &[ToolCallRecord], content: &str) -> f64 {
    let tool_fraction = if tool_calls.is_empty() {
        // No tools invoked: nothing failed, full credit
        1.0
    } else {
        let succeeded = tool_calls.iter().filter(|c| c.result.success).count();
        succeeded as f64 / tool_calls.len() as f64
    };

    let mut confidence = BASE_CONFIDENCE + TOOL_SUCCESS_WEIGHT * tool_fraction;
    if content.chars().count() > LENGTH_THRESHOLD {
        confidence += LENGTH_BONUS;
    }
    confidence.clamp(0.0, 1.0)
}

/// Return the first sentence containing a causal connective, or nothing.
pub fn extract_reasoning(content: &str) -> Option<String> {
    content
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .find(|sentence| {
            let lower = sentence.to_lowercase();
            CAUSAL_CONNECTIVES.iter().any(|c| lower.contains(c))
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolCallRecord, ToolResult};
    use serde_json::json;

    fn call(success: bool) -> ToolCallRecord {
        ToolCallRecord {
            tool_name: "t".to_string(),
            input: json!({}),
            result: if success {
                ToolResult::ok(json!({}))
            } else {
                ToolResult::failed("nope")
            },
        }
    }

    #[test]
    fn test_score_no_tools_short_content() {
        // 0.7 base + 0.2 full tool credit
        let s = score(&[], "short");
        assert!((s - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_score_scales_with_tool_success() {
        let calls = vec![call(true), call(false)];
        let s = score(&calls, "short");
        assert!((s - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_score_length_bonus_and_clamp() {
        let long = "x".repeat(501);
        let s = score(&[], &long);
        assert_eq!(s, 1.0); // 0.7 + 0.2 + 0.1 clamped
        assert!(s <= 1.0 && s >= 0.0);
    }

    #[test]
    fn test_length_bonus_counts_chars_not_bytes() {
        // 400 chars but 800 bytes: no bonus
        let multibyte = "é".repeat(400);
        let s = score(&[], &multibyte);
        assert!((s - 0.9).abs() < 1e-9);

        let long = "é".repeat(501);
        assert_eq!(score(&[], &long), 1.0);
    }

    #[test]
    fn test_score_all_tools_failed() {
        let calls = vec![call(false), call(false)];
        let s = score(&calls, "short");
        assert!((s - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_extract_reasoning_finds_first_causal_sentence() {
        let content = "The form looks fine. It needs validation because users make \
                       mistakes. Therefore add checks.";
        let reasoning = extract_reasoning(content).unwrap();
        assert!(reasoning.contains("because"));
        assert!(!reasoning.contains("Therefore"));
    }

    #[test]
    fn test_extract_reasoning_none_without_connectives() {
        assert_eq!(extract_reasoning("All clear. No issues found."), None);
        assert_eq!(extract_reasoning(""), None);
    }
}
