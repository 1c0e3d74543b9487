//! Response normalisation: recover a JSON value from the model's reply.
//!
//! Models asked for "exactly this JSON format" still wrap the answer in
//! ```` ```json ```` fences, or put a sentence of commentary before or after
//! it. Normalisation is a two-stage parser with a typed outcome:
//!
//! 1. Remove every fence marker, trim, parse.
//! 2. Otherwise parse the slice from the first `{` to the last `}` of the
//!    original reply.
//!
//! If neither parses the outcome is [`ParseOutcome::Unrecoverable`], which
//! keeps the raw text for diagnostics.

use crate::error::AnalysisError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Outcome of [`normalize_response`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The reply contained a JSON value.
    Parsed(Value),
    /// Neither strategy produced JSON; carries the original reply.
    Unrecoverable(String),
}

impl ParseOutcome {
    /// Convert into a `Result`, mapping `Unrecoverable` to `AnalysisError::Unparseable`.
    pub fn into_result(self) -> Result<Value, AnalysisError> {
        match self {
            ParseOutcome::Parsed(v) => Ok(v),
            ParseOutcome::Unrecoverable(raw) => Err(AnalysisError::Unparseable { raw }),
        }
    }
}

/// Run both parsing stages over `raw`.
pub fn normalize_response(raw: &str) -> ParseOutcome {
    let stripped = strip_fences(raw);
    if let Ok(value) = serde_json::from_str::<Value>(&stripped) {
        return ParseOutcome::Parsed(value);
    }

    if let Some(slice) = brace_slice(raw) {
        debug!("Direct parse failed; trying brace slice of {} bytes", slice.len());
        if let Ok(value) = serde_json::from_str::<Value>(slice) {
            return ParseOutcome::Parsed(value);
        }
    }

    ParseOutcome::Unrecoverable(raw.to_string())
}

/// Shorthand for `normalize_response(raw).into_result()`.
pub fn parse_response(raw: &str) -> Result<Value, AnalysisError> {
    normalize_response(raw).into_result()
}

// ── Stage 1: strip fences ────────────────────────────────────────────────────

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?").unwrap());

fn strip_fences(input: &str) -> String {
    RE_FENCE.replace_all(input, "").trim().to_string()
}

// ── Stage 2: first `{` to last `}` ───────────────────────────────────────────

fn brace_slice(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    if end > start {
        Some(&input[start..=end])
    } else {
        None
    }
}
