//! Webhook delegate: hand the OCR text to an external workflow.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use super::{Status, ValidationResult};

const DEFAULT_DETAILS: &str = "Validated via webhook workflow.";

#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("webhook error: {0}")]
    Status(u16),
    #[error("webhook failed: {0}")]
    Transport(String),
}

/// A remote validator that produces a complete outcome.
pub trait Delegate {
    fn delegate(&self, ocr_text: &str) -> Result<ValidationResult, DelegateError>;
}

#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: String, timeout_seconds: u64) -> Result<Self, DelegateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| DelegateError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url })
    }
}

impl Delegate for WebhookClient {
    fn delegate(&self, ocr_text: &str) -> Result<ValidationResult, DelegateError> {
        debug!(url = %self.url, chars = ocr_text.len(), "posting OCR text to webhook");
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "ocr_text": ocr_text }))
            .send()
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "webhook request failed (transport)");
                DelegateError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "webhook returned HTTP error");
            return Err(DelegateError::Status(status.as_u16()));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let data = if is_json {
            response
                .json::<Value>()
                .map_err(|e| DelegateError::Transport(format!("invalid JSON body: {e}")))?
        } else {
            Value::Null
        };
        if !data.is_object() && !data.is_null() {
            return Err(DelegateError::Transport("response is not a JSON object".into()));
        }

        Ok(read_outcome(&data))
    }
}

/// Missing fields fall back to defaults; unknown labels become `WARNING`.
fn read_outcome(data: &Value) -> ValidationResult {
    ValidationResult {
        status: field(data, "status").map(Status::from_label).unwrap_or(Status::Warning),
        details: Some(field(data, "details").unwrap_or(DEFAULT_DETAILS).to_string()),
        reference: field(data, "reference").map(str::to_string),
    }
}

fn field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
