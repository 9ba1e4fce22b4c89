//! Structured-response extraction
//!
//! Language models wrap JSON in markdown fences, prose, or nothing at all.
//! Extraction runs an ordered list of locate strategies; the first one that
//! yields a candidate span wins, and that span alone is parsed.

use crate::errors::{AppError, Result};
use regex_lite::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Outcome of one locate strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Located<'a> {
    /// Candidate JSON text
    Span(&'a str),
    /// Strategy did not apply to this input
    NoMatch,
}

/// Ways of finding a JSON object inside free text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStrategy {
    /// A ``` or ```json fenced block holding a brace-delimited object
    FencedBlock,
    /// First `{` through last `}` anywhere in the text
    BareBraces,
}

/// Strategies in precedence order
pub const STRATEGIES: [LocateStrategy; 2] = [LocateStrategy::FencedBlock, LocateStrategy::BareBraces];

fn fenced_block_regex() -> &'static Regex {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    FENCED.get_or_init(|| {
        // Greedy body: first `{` after the opening fence through the last `}` before the final fence
        Regex::new(r"```(?i:json)?\s*(\{[\s\S]*\})\s*```").expect("fenced block pattern is valid")
    })
}

impl LocateStrategy {
    /// Try this strategy against raw text
    pub fn locate<'a>(&self, raw: &'a str) -> Located<'a> {
        match self {
            LocateStrategy::FencedBlock => fenced_block_regex()
                .captures(raw)
                .and_then(|caps| caps.get(1))
                .map_or(Located::NoMatch, |m| Located::Span(m.as_str())),
            LocateStrategy::BareBraces => match (raw.find('{'), raw.rfind('}')) {
                (Some(start), Some(end)) if start < end => Located::Span(&raw[start..=end]),
                _ => Located::NoMatch,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LocateStrategy::FencedBlock => "fenced_block",
            LocateStrategy::BareBraces => "bare_braces",
        }
    }
}

/// First candidate span found by the strategies, with the strategy that found it
pub fn locate(raw: &str) -> Option<(LocateStrategy, &str)> {
    STRATEGIES.iter().find_map(|strategy| match strategy.locate(raw) {
        Located::Span(span) => Some((*strategy, span)),
        Located::NoMatch => None,
    })
}

/// Extract and parse the JSON object embedded in `raw`
pub fn extract(raw: &str) -> Result<Map<String, Value>> {
    let (strategy, candidate) = locate(raw).ok_or(AppError::ExtractionFailed)?;

    tracing::debug!(
        strategy = strategy.name(),
        candidate_chars = candidate.len(),
        "Located JSON candidate"
    );

    let value: Value = serde_json::from_str(candidate).map_err(|e| AppError::MalformedJson {
        source: e,
        candidate: candidate.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        // Unreachable for brace-delimited spans, but surfaced rather than assumed
        other => Err(AppError::MalformedJson {
            source: <serde_json::Error as serde::de::Error>::custom(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            )),
            candidate: candidate.to_string(),
        }),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_json_block_with_prose() {
        let raw = "Sure! Here is your paper:\n```json\n{\"title\": \"T\", \"n\": 1}\n```\nLet me know if you need changes.";
        let obj = extract(raw).unwrap();
        assert_eq!(Value::Object(obj), json!({ "title": "T", "n": 1 }));
    }

    #[test]
    fn test_untagged_fence() {
        let raw = "```\n{\"a\": [1, 2, {\"b\": null}]}\n```";
        let obj = extract(raw).unwrap();
        assert_eq!(Value::Object(obj), json!({ "a": [1, 2, { "b": null }] }));
    }

    #[test]
    fn test_uppercase_tag() {
        let raw = "```JSON\n{\"ok\": true}\n```";
        assert_eq!(Value::Object(extract(raw).unwrap()), json!({ "ok": true }));
    }

    #[test]
    fn test_bare_object_without_fence() {
        let raw = "{\"title\": \"Bare\", \"references\": []}";
        let obj = extract(raw).unwrap();
        assert_eq!(obj["title"], json!("Bare"));
    }

    #[test]
    fn test_bare_object_surrounded_by_prose() {
        let raw = "The result is {\"x\": {\"y\": 2}} as requested.";
        assert_eq!(locate(raw), Some((LocateStrategy::BareBraces, "{\"x\": {\"y\": 2}}")));
        assert_eq!(Value::Object(extract(raw).unwrap()), json!({ "x": { "y": 2 } }));
    }

    #[test]
    fn test_fence_preferred_over_bare_braces() {
        let raw = "Note {not json} then\n```json\n{\"k\": \"v\"}\n```";
        assert_eq!(
            LocateStrategy::FencedBlock.locate(raw),
            Located::Span("{\"k\": \"v\"}")
        );
        assert_eq!(Value::Object(extract(raw).unwrap()), json!({ "k": "v" }));
    }

    #[test]
    fn test_fence_capture_is_greedy_to_last_closing_fence() {
        let raw = "```json\n{\"a\": 1}\n```\ntext\n```json\n{\"b\": 2}\n```";
        assert_eq!(
            LocateStrategy::FencedBlock.locate(raw),
            Located::Span("{\"a\": 1}\n```\ntext\n```json\n{\"b\": 2}")
        );
        let err = extract(raw).unwrap_err();
        assert!(matches!(err, AppError::MalformedJson { .. }));
    }

    #[test]
    fn test_no_braces_is_extraction_failed() {
        let err = extract("I'm sorry, I can't help with that.").unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed));
    }

    #[test]
    fn test_reversed_braces_is_extraction_failed() {
        assert_eq!(LocateStrategy::BareBraces.locate("} oops {"), Located::NoMatch);
        assert!(matches!(extract("} oops {"), Err(AppError::ExtractionFailed)));
    }

    #[test]
    fn test_unparseable_span_is_malformed_json() {
        let raw = "{\"title\": \"T\", \"abstract\": }";
        match extract(raw).unwrap_err() {
            AppError::MalformedJson { candidate, .. } => assert_eq!(candidate, raw),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_fenced_block_does_not_fall_back() {
        let raw = "```json\n{\"title\": 'single quotes'}\n```";
        assert!(matches!(extract(raw), Err(AppError::MalformedJson { .. })));
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(STRATEGIES[0], LocateStrategy::FencedBlock);
        assert_eq!(STRATEGIES[1], LocateStrategy::BareBraces);
        assert_eq!(LocateStrategy::FencedBlock.locate("no fence {}"), Located::NoMatch);
    }
}
