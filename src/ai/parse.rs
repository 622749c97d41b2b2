// src/ai/parse.rs
//
// Best-effort JSON extraction from generator replies. The generator is asked
// for bare JSON but routinely wraps it in markdown fences or surrounds it
// with prose, so parsing is two-stage: strict parse first, then a bounded
// brace-slice recovery.

use serde_json::Value;
use std::fmt;

/// How much of the raw reply is preserved in error payloads.
const EXCERPT_LEN: usize = 500;

/// Replies longer than this are not scanned for a recoverable object.
const MAX_RECOVERY_LEN: usize = 512 * 1024;

/// Both parse stages failed. Carries a truncated excerpt of the raw reply
/// for the caller's error payload.
#[derive(Debug)]
pub struct JsonRecoveryError {
    pub message: String,
    pub excerpt: String,
}

impl fmt::Display for JsonRecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for JsonRecoveryError {}

/// Removes a leading ```json / ``` fence and a trailing ``` fence, if present.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parses a generator reply into a JSON value.
///
/// Stage 1: strip fences and parse strictly.
/// Stage 2: slice from the first `{` to the last `}` and re-parse. The scan
/// is capped at `MAX_RECOVERY_LEN` so a pathological reply cannot be walked
/// repeatedly.
pub fn extract_json(raw: &str) -> Result<Value, JsonRecoveryError> {
    let text = strip_code_fences(raw);

    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            if text.len() > MAX_RECOVERY_LEN {
                return Err(JsonRecoveryError {
                    message: format!("reply too large to recover ({} bytes)", text.len()),
                    excerpt: excerpt(raw),
                });
            }

            let start = text.find('{');
            let end = text.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => {
                    serde_json::from_str::<Value>(&text[start..=end]).map_err(|e| {
                        JsonRecoveryError {
                            message: format!("failed to parse generator reply: {}", e),
                            excerpt: excerpt(raw),
                        }
                    })
                }
                _ => Err(JsonRecoveryError {
                    message: format!("failed to parse generator reply: {}", first_err),
                    excerpt: excerpt(raw),
                }),
            }
        }
    }
}

/// First `EXCERPT_LEN` characters of the reply, safe on char boundaries.
pub fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_LEN).collect()
}
