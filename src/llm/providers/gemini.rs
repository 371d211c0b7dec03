//! Gemini `generateContent` REST provider.
//!
//! Classifies from OCR text alone; search context is ignored. On a
//! model-class failure the configured fallback models are tried in order.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::GeminiConfig;
use crate::llm::{Classification, Classifier, ProviderError, parse_classification, prompt};
use crate::search::SearchItem;
use crate::validation::Status;

const SAFETY_REASON: &str = "Content blocked by safety filters";

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_base_url: String,
    api_key: String,
    model: String,
    fallback_models: Vec<String>,
    temperature: f32,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig, api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            api_key,
            model: config.model.clone(),
            fallback_models: config.fallback_models.clone(),
            temperature: config.temperature,
        })
    }

    fn call(&self, model: &str, payload: &GenerateRequest) -> Result<Classification, ProviderError> {
        let url = format!("{}/models/{model}:generateContent", self.api_base_url);
        debug!(%url, model, "sending Gemini request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(payload)
            .send()
            .map_err(|e| {
                // The URL carries the API key.
                let e = e.without_url();
                error!(%url, error = %e, "Gemini HTTP request failed (transport)");
                ProviderError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let hint = http_hint(status.as_u16(), &body);
            warn!(%status, model, hint, "Gemini returned HTTP error");
            return Err(ProviderError::Http { status: status.as_u16(), hint: hint.to_string(), body });
        }

        let parsed = response.json::<GenerateResponse>().map_err(|e| {
            error!(error = %e, "failed to deserialize Gemini response");
            ProviderError::Response(format!("failed to parse Gemini response body: {e}"))
        })?;

        read_reply(parsed)
    }
}

impl Classifier for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn classify(&self, ocr_text: &str, _context: &[SearchItem]) -> Result<Classification, ProviderError> {
        let payload = GenerateRequest::new(ocr_text, self.temperature);

        let err = match self.call(&self.model, &payload) {
            Ok(c) => return Ok(c),
            Err(e) => e,
        };
        if !is_model_error(&err) {
            return Err(err);
        }

        for alt in self.fallback_models.iter().filter(|m| **m != self.model) {
            warn!(primary = %self.model, fallback = %alt, "Gemini model unavailable; trying fallback");
            match self.call(alt, &payload) {
                Ok(c) => return Ok(c),
                Err(e) => debug!(model = %alt, error = %e, "fallback model failed"),
            }
        }
        Err(ProviderError::FallbackExhausted(Box::new(err)))
    }
}

/// Errors whose body points at the model name rather than the request.
fn is_model_error(err: &ProviderError) -> bool {
    let Some(body) = err.body() else {
        return false;
    };
    let low = body.to_lowercase();
    ["model", "not found", "unsupported", "unexpected model name format"]
        .iter()
        .any(|k| low.contains(k))
}

fn http_hint(status: u16, body: &str) -> &'static str {
    match status {
        401 => "Unauthorized: check GEMINI_API_KEY",
        404 => "Model not found: set GEMINI_MODEL (e.g., gemini-1.5-flash or gemini-1.5-pro)",
        429 => "Rate limited: slow down or check quota",
        400 => {
            let low = body.to_lowercase();
            if body.contains("API key not valid") || body.contains("not valid for this API") {
                "API key not valid for Generative Language API: create a new key in Google AI Studio"
            } else if low.contains("unsupported location") {
                "Model unsupported in region: try gemini-1.5-flash or enable billing/region"
            } else if low.contains("model") {
                "Bad request: verify GEMINI_MODEL (e.g., gemini-1.5-flash or gemini-1.5-pro)"
            } else {
                "Bad request: verify payload and model name"
            }
        }
        _ => "",
    }
}

fn read_reply(parsed: GenerateResponse) -> Result<Classification, ProviderError> {
    let Some(first) = parsed.candidates.into_iter().next() else {
        return Err(ProviderError::Response("Empty response from Gemini".into()));
    };
    if first
        .finish_reason
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case("SAFETY"))
    {
        return Ok(Classification { status: Status::Warning, reason: SAFETY_REASON.into() });
    }

    let text = first
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join("\n"))
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ProviderError::Response("Empty response from Gemini".into()));
    }
    Ok(parse_classification(&text))
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn new(ocr_text: &str, temperature: f32) -> Self {
        Self {
            system_instruction: Content::text("system", prompt::ocr_only_system()),
            contents: vec![Content::text("user", &prompt::ocr_only_user(ocr_text))],
            generation_config: GenerationConfig { temperature },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self { role: Some(role.to_string()), parts: vec![Part { text: text.to_string() }] }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}
