//! Oracle response decoding with a staged repair ladder.
//!
//! The oracle is an external text generator whose output is frequently
//! wrapped in markdown fences, truncated by length limits, or sprinkled
//! with control characters. Each repair stage runs only after the prior
//! parse fails, and repairs are cumulative. When every stage fails the
//! decoder returns [`DecodeResult::NoIssueFallback`] — never an error —
//! so the pipeline stays live over large documents even when a minority
//! of responses are malformed.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

lazy_static! {
    /// `,}` / `,]` with optional interior whitespace — the most common
    /// oracle syntax slip.
    static ref TRAILING_COMMA: Regex = Regex::new(r",(\s*[}\]])").expect("invalid regex");
}

/// One issue record as emitted by the oracle, before filtering. Every
/// field is optional on the wire; missing fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawIssue {
    #[serde(rename = "type", default)]
    pub section_label: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub issue_type: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub dss_statement: String,
    #[serde(default)]
    pub earning_call_context: String,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Default, Deserialize)]
struct IssueEnvelope {
    #[serde(default)]
    issues: Vec<RawIssue>,
}

/// Decoder verdict. `Issues(vec![])` means the oracle verified the
/// sentence clean; `NoIssueFallback` means the response could not be
/// decoded and is being treated as clean. Callers that need stricter
/// semantics can distinguish the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    Issues(Vec<RawIssue>),
    NoIssueFallback,
}

impl DecodeResult {
    /// Collapse to the issue list, applying the fail-soft default.
    pub fn into_issues(self) -> Vec<RawIssue> {
        match self {
            DecodeResult::Issues(issues) => issues,
            DecodeResult::NoIssueFallback => Vec::new(),
        }
    }
}

/// Decode one raw oracle response. Total function: never panics, never
/// returns an error.
pub fn decode_oracle_response(raw: &str) -> DecodeResult {
    if raw.trim().is_empty() {
        return DecodeResult::NoIssueFallback;
    }

    let unfenced = strip_code_fence(raw);
    if unfenced.trim().is_empty() {
        return DecodeResult::NoIssueFallback;
    }

    if let Some(issues) = try_parse(&unfenced) {
        return DecodeResult::Issues(issues);
    }

    let cleaned = strip_control_chars(&unfenced);
    if let Some(issues) = try_parse(&cleaned) {
        tracing::debug!("oracle response parsed after control-character strip");
        return DecodeResult::Issues(issues);
    }

    let decommaed = TRAILING_COMMA.replace_all(&cleaned, "$1");
    if let Some(issues) = try_parse(&decommaed) {
        tracing::debug!("oracle response parsed after trailing-comma repair");
        return DecodeResult::Issues(issues);
    }

    if let Some(truncated) = truncate_to_last_close(&decommaed) {
        if let Some(issues) = try_parse(truncated) {
            tracing::debug!("oracle response parsed after truncation to last bracket");
            return DecodeResult::Issues(issues);
        }
    }

    tracing::warn!("oracle response unparsable after all repair stages; treating as no issue");
    DecodeResult::NoIssueFallback
}

fn try_parse(text: &str) -> Option<Vec<RawIssue>> {
    serde_json::from_str::<IssueEnvelope>(text)
        .ok()
        .map(|envelope| envelope.issues)
}

/// Take the contents of the first ```json / ``` fence; an unterminated
/// fence runs to the end of the text. Shared by every oracle response
/// consumer, not just the issue decoder.
pub fn strip_code_fence(raw: &str) -> String {
    for marker in ["```json", "```"] {
        if let Some(open) = raw.find(marker) {
            let body = &raw[open + marker.len()..];
            let body = match body.find("```") {
                Some(close) => &body[..close],
                None => body,
            };
            return body.trim().to_string();
        }
    }
    raw.trim().to_string()
}

/// Drop control characters, keeping tab, newline, and carriage return.
fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}')
        })
        .collect()
}

/// Cut the text at the last complete `}` or `]`, recovering the longest
/// well-formed prefix of a truncated response.
fn truncate_to_last_close(text: &str) -> Option<&str> {
    let last_brace = text.rfind('}');
    let last_bracket = text.rfind(']');
    let last = match (last_brace, last_bracket) {
        (Some(a), Some(b)) => a.max(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some(&text[..=last])
}
