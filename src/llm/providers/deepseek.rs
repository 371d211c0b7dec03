//! DeepSeek chat completion provider (OpenAI-compatible `/chat/completions`).
//!
//! Each configured endpoint is tried in order. A 404 on an endpoint is retried
//! once with the alternate model before moving on. All wire types are private
//! to this module.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::config::DeepSeekConfig;
use crate::llm::{Classification, Classifier, ProviderError, parse_classification, prompt};
use crate::search::SearchItem;

const CHAT_MODEL: &str = "deepseek-chat";
const REASONER_MODEL: &str = "deepseek-reasoner";

#[derive(Debug, Clone)]
pub struct DeepSeekProvider {
    client: Client,
    api_urls: Vec<String>,
    model: String,
    temperature: f32,
    api_key: String,
}

impl DeepSeekProvider {
    pub fn new(config: &DeepSeekConfig, api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_urls: config.api_urls.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
        })
    }

    fn post(&self, url: &str, payload: &ChatCompletionRequest) -> Result<Response, ProviderError> {
        debug!(%url, model = %payload.model, "sending DeepSeek request");
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full DeepSeek request payload");
        }

        self.client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .map_err(|e| {
                error!(%url, error = %e, "DeepSeek HTTP request failed (transport)");
                ProviderError::Transport(e.to_string())
            })
    }
}

impl Classifier for DeepSeekProvider {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    fn classify(&self, ocr_text: &str, context: &[SearchItem]) -> Result<Classification, ProviderError> {
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message { role: "system".into(), content: prompt::with_search_system().into() },
                Message { role: "user".into(), content: prompt::with_search_user(ocr_text, context) },
            ],
            temperature: self.temperature,
        };

        let mut last_error = None;
        for url in &self.api_urls {
            let response = self.post(url, &payload)?;
            let status = response.status().as_u16();

            if status == 404 {
                let alt = ChatCompletionRequest { model: alternate_model(&self.model).into(), ..payload.clone() };
                warn!(%url, model = %self.model, alternate = %alt.model, "DeepSeek returned 404; retrying with alternate model");
                let retry = self.post(url, &alt)?;
                if retry.status().is_success() {
                    return read_completion(retry);
                }
                last_error = Some(http_error(retry));
                continue;
            }

            if !response.status().is_success() {
                last_error = Some(http_error(response));
                continue;
            }

            return read_completion(response);
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Response("Unknown error".into())))
    }
}

fn alternate_model(model: &str) -> &'static str {
    if model == CHAT_MODEL { REASONER_MODEL } else { CHAT_MODEL }
}

fn http_hint(status: u16) -> &'static str {
    match status {
        401 => "Unauthorized: check DEEPSEEK_API_KEY",
        402 => "Payment required: check credits/billing status",
        404 => "Not found: verify API endpoint/model (try deepseek-reasoner or deepseek-chat)",
        429 => "Rate limited: slow down requests or check quota",
        _ => "",
    }
}

fn http_error(response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    let hint = http_hint(status);
    warn!(status, hint, "DeepSeek returned HTTP error");
    ProviderError::Http { status, hint: hint.to_string(), body }
}

fn read_completion(response: Response) -> Result<Classification, ProviderError> {
    let parsed = response.json::<ChatCompletionResponse>().map_err(|e| {
        error!(error = %e, "failed to deserialize DeepSeek response");
        ProviderError::Transport(format!("failed to parse response body: {e}"))
    })?;
    Ok(parsed.classification())
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

impl ChatCompletionResponse {
    /// First choice's content; a missing message reads as an empty reply.
    fn classification(self) -> Classification {
        let choices = self.choices.unwrap_or_default();
        debug!(choices = choices.len(), "received DeepSeek response");
        let content = choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();
        parse_classification(&content)
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
