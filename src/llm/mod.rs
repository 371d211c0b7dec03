//! LLM classifier abstraction.
//!
//! A [`Classifier`] turns OCR text (plus optional search context) into a
//! [`Classification`]. Providers live in `providers/`; each owns its wire
//! types and only exposes this trait.

pub mod prompt;
pub mod providers;

use thiserror::Error;

use crate::search::SearchItem;
use crate::validation::Status;

/// Fallback reason when the model gives none.
pub const NO_REASON: &str = "No reason provided.";
/// Free-text replies are cut to this many characters.
const MAX_REASON_CHARS: usize = 300;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("{}", http_message(*status, hint))]
    Http { status: u16, hint: String, body: String },
    #[error("Network/Client error: {0}")]
    Transport(String),
    #[error("{0}")]
    Response(String),
    #[error("{0} (model fallback attempted)")]
    FallbackExhausted(Box<ProviderError>),
}

impl ProviderError {
    /// Raw response body, when the provider returned one.
    pub fn body(&self) -> Option<&str> {
        match self {
            ProviderError::Http { body, .. } => Some(body.as_str()).filter(|b| !b.is_empty()),
            ProviderError::FallbackExhausted(inner) => inner.body(),
            _ => None,
        }
    }
}

fn http_message(status: u16, hint: &str) -> String {
    format!("HTTP {status} {hint}").trim_end().to_string()
}

// ── Classification ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: Status,
    pub reason: String,
}

/// One LLM backend.
pub trait Classifier {
    /// Name used in references and logs, e.g. `"Gemini"`.
    fn name(&self) -> &str;

    /// Classify `ocr_text`. Providers that take no web context ignore `context`.
    fn classify(&self, ocr_text: &str, context: &[SearchItem]) -> Result<Classification, ProviderError>;
}

/// Read a model reply.
///
/// A JSON object `{status, reason}` is used as-is, with unknown labels coerced
/// to `WARNING`. Anything else falls back to a keyword scan of the text.
pub fn parse_classification(reply: &str) -> Classification {
    let body = strip_code_fence(reply);
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        let status = map
            .get("status")
            .and_then(|v| v.as_str())
            .map(Status::from_label)
            .unwrap_or(Status::Warning);
        let reason = map
            .get("reason")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(NO_REASON)
            .to_string();
        return Classification { status, reason };
    }

    let low = reply.to_lowercase();
    let status = if ["pass", "real", "genuine"].iter().any(|k| low.contains(k)) {
        Status::Pass
    } else if ["fail", "fake", "counterfeit"].iter().any(|k| low.contains(k)) {
        Status::Fail
    } else {
        Status::Warning
    };
    let reason: String = reply.trim().chars().take(MAX_REASON_CHARS).collect();
    let reason = if reason.is_empty() { NO_REASON.to_string() } else { reason };
    Classification { status, reason }
}

/// Models often wrap JSON in a ```json fence.
fn strip_code_fence(reply: &str) -> &str {
    let t = reply.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
