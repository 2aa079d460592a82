//! The JSON answer contract: `{"response": string, "is_final": bool}`.

use serde::Deserialize;
use thiserror::Error;

/// A parsed model answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FinalPayload {
    pub response: String,
    pub is_final: bool,
}

/// The model's content did not follow the answer contract.
#[derive(Debug, Clone, Error)]
#[error("Malformed model output: {reason}")]
pub struct MalformedModelOutput {
    pub reason: String,
    pub raw: String,
}

impl FinalPayload {
    /// Parse assistant content, tolerating a surrounding markdown code fence.
    pub fn parse(content: &str) -> Result<Self, MalformedModelOutput> {
        let body = strip_code_fence(content);
        serde_json::from_str(body).map_err(|e| MalformedModelOutput {
            reason: e.to_string(),
            raw: content.to_string(),
        })
    }

    /// Parse, or fall back to the raw text as a non-final response.
    pub fn parse_lenient(content: &str) -> (Self, Option<MalformedModelOutput>) {
        match Self::parse(content) {
            Ok(payload) => (payload, None),
            Err(malformed) => (
                Self {
                    response: content.to_string(),
                    is_final: false,
                },
                Some(malformed),
            ),
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    match rest.find('\n') {
        Some(newline) => rest[newline + 1..].trim(),
        None => rest.trim(),
    }
}
