//! Feedback parsing: AI response text → structured [`Feedback`].
//!
//! The instruction prompt demands a bare JSON object, but models still
//! occasionally wrap the payload in ```` ``` ```` fences. A single cheap
//! regex rule strips one outer fence before parsing; anything else that
//! fails `serde_json` is reported as a format error rather than repaired —
//! guessing at malformed ratings would be worse than asking the user to
//! rerun.

use crate::error::AnalyzeError;
use crate::feedback::Feedback;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```\s*$").unwrap());

/// Strip a single outer markdown fence, if present.
fn strip_fences(input: &str) -> &str {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps.get(1).map_or(input, |m| m.as_str()),
        None => input.trim(),
    }
}

/// Parse the extracted response text as the structured feedback shape.
pub fn parse_feedback(text: &str) -> Result<Feedback, AnalyzeError> {
    let payload = strip_fences(text);
    serde_json::from_str(payload).map_err(|e| AnalyzeError::FeedbackFormat {
        detail: e.to_string(),
    })
}
