//! Validation orchestration.
//!
//! One backend is chosen per run, in fixed priority order:
//!
//! ```text
//! 1. Gemini         OCR text only; nothing else is consulted
//! 2. DeepSeek       with search context when a search key is also set
//! 3. Search         vendor-datasheet / counterfeit-keyword heuristics
//! 4. Webhook        delegate the whole decision
//! 5. Local table    known part markings
//! ```
//!
//! Every backend failure degrades to a `WARNING` outcome; `validate` itself
//! cannot fail.

pub mod evidence;
pub mod local;
pub mod report;
pub mod webhook;

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::llm::{Classifier, ProviderError, providers};
use crate::search::{CachedSearch, SearchItem, SerpApiClient};

use evidence::{assess, search_query};
use report::{DetailsBuilder, EXPLAINER, LLM_ANALYSIS, RESPONSE_BODY, SEARCH_RESULTS, summary_line};
use webhook::{Delegate, WebhookClient};

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Verdict label: genuine, counterfeit, or inconclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
    Warning,
}

impl Status {
    /// Case-insensitive. Anything but `PASS`/`FAIL`/`WARNING` is `Warning`.
    pub fn from_label(label: &str) -> Status {
        match label.trim().to_ascii_uppercase().as_str() {
            "PASS" => Status::Pass,
            "FAIL" => Status::Fail,
            _ => Status::Warning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Warning => "WARNING",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub status: Status,
    pub details: Option<String>,
    /// Which backend produced the answer.
    pub reference: Option<String>,
}

impl ValidationResult {
    pub fn new(status: Status, details: impl Into<String>) -> Self {
        Self { status, details: Some(details.into()), reference: None }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

// ── Backends ──────────────────────────────────────────────────────────────────

/// Configured backends. `None` means the credential or URL is absent.
#[derive(Default)]
pub struct Backends {
    pub gemini: Option<Box<dyn Classifier>>,
    pub deepseek: Option<Box<dyn Classifier>>,
    pub search: Option<CachedSearch>,
    pub webhook: Option<Box<dyn Delegate>>,
}

impl Backends {
    /// Build only the backends whose credentials are present.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let provider_err = |e: ProviderError| AppError::Config(format!("LLM provider: {e}"));

        let search = match &config.serpapi_key {
            Some(key) => {
                let client = SerpApiClient::new(
                    config.search.endpoint.clone(),
                    Some(key.clone()),
                    config.search.timeout_seconds,
                )
                .map_err(|e| AppError::Config(format!("search client: {e}")))?;
                Some(CachedSearch::new(
                    Box::new(client),
                    Duration::from_secs(config.search.cache_ttl_seconds),
                ))
            }
            None => None,
        };

        let webhook: Option<Box<dyn Delegate>> = match &config.webhook.url {
            Some(url) => Some(Box::new(
                WebhookClient::new(url.clone(), config.webhook.timeout_seconds)
                    .map_err(|e| AppError::Config(e.to_string()))?,
            )),
            None => None,
        };

        Ok(Self {
            gemini: providers::build_gemini(config).map_err(provider_err)?,
            deepseek: providers::build_deepseek(config).map_err(provider_err)?,
            search,
            webhook,
        })
    }
}

/// The backend a run will use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Gemini,
    DeepSeek { with_search: bool },
    Search,
    Webhook,
    Local,
}

// ── Validator ─────────────────────────────────────────────────────────────────

pub struct Validator {
    backends: Backends,
    num_results: usize,
}

impl Validator {
    pub fn new(backends: Backends, num_results: usize) -> Self {
        Self { backends, num_results }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(Backends::from_config(config)?, config.search.num_results))
    }

    /// First available backend wins; signals are never combined.
    pub fn route(&self) -> Route {
        let b = &self.backends;
        if b.gemini.is_some() {
            Route::Gemini
        } else if b.deepseek.is_some() {
            Route::DeepSeek { with_search: b.search.is_some() }
        } else if b.search.is_some() {
            Route::Search
        } else if b.webhook.is_some() {
            Route::Webhook
        } else {
            Route::Local
        }
    }

    /// Validate one OCR reading. Never fails; backend errors become `WARNING`.
    ///
    /// Blank text is answered by the local table ("Empty OCR result.") without
    /// contacting any configured backend: there is nothing for a model, a search
    /// or a webhook to judge, and skipping them keeps an unreadable photo from
    /// spending API quota.
    pub fn validate(&self, text: &str) -> ValidationResult {
        if text.trim().is_empty() {
            info!("empty OCR text; skipping remote backends");
            return local::validate_local(text);
        }

        let route = self.route();
        info!(?route, chars = text.len(), "validating marking");

        let b = &self.backends;
        let result = match (route, &b.gemini, &b.deepseek, &b.search, &b.webhook) {
            (Route::Gemini, Some(llm), ..) => self.via_gemini(llm.as_ref(), text),
            (Route::DeepSeek { .. }, _, Some(llm), search, _) => {
                self.via_deepseek(llm.as_ref(), search.as_ref(), text)
            }
            (Route::Search, _, _, Some(search), _) => self.via_search(search, text),
            (Route::Webhook, _, _, _, Some(hook)) => via_webhook(hook.as_ref(), text),
            _ => local::validate_local(text),
        };

        info!(status = %result.status, reference = ?result.reference, "validation finished");
        result
    }

    fn via_gemini(&self, llm: &dyn Classifier, text: &str) -> ValidationResult {
        match llm.classify(text, &[]) {
            Ok(c) => {
                let details = DetailsBuilder::new(summary_line(c.status, &c.reason))
                    .section(LLM_ANALYSIS, [format!("Status: {}", c.status), format!("Reason: {}", c.reason)])
                    .build();
                ValidationResult::new(c.status, details).with_reference(llm.name())
            }
            Err(e) => {
                warn!(provider = llm.name(), error = %e, "LLM classification failed");
                let mut details = DetailsBuilder::new(llm_error_summary())
                    .section(LLM_ANALYSIS, [e.to_string()]);
                if let Some(body) = e.body() {
                    details = details.section(RESPONSE_BODY, [body]);
                }
                ValidationResult::new(Status::Warning, details.build()).with_reference(llm.name())
            }
        }
    }

    fn via_deepseek(
        &self,
        llm: &dyn Classifier,
        search: Option<&CachedSearch>,
        text: &str,
    ) -> ValidationResult {
        let mut reference = llm.name().to_string();
        let mut search_lines = Vec::new();
        let mut explainer_lines = Vec::new();
        let mut context: Vec<SearchItem> = Vec::new();

        if let Some(search) = search {
            let outcome = search.search(&search_query(text), self.num_results);
            match outcome.as_ref() {
                Ok(results) => {
                    reference = format!("{} + SerpAPI Google Search", llm.name());
                    let ev = assess(&results.items);
                    search_lines = ev.lines.clone();
                    explainer_lines.push(ev.indicator_line());
                    context = results.items.clone();
                }
                Err(e) => {
                    warn!(error = %e, "search context unavailable");
                    search_lines.push(format!("SerpAPI error: {e}"));
                }
            }
        }

        let (status, details) = match llm.classify(text, &context) {
            Ok(c) => (
                c.status,
                DetailsBuilder::new(summary_line(c.status, &c.reason))
                    .section(LLM_ANALYSIS, [format!("Status: {}", c.status), format!("Reason: {}", c.reason)]),
            ),
            Err(e) => {
                warn!(provider = llm.name(), error = %e, "LLM classification failed");
                (
                    Status::Warning,
                    DetailsBuilder::new(llm_error_summary()).section(LLM_ANALYSIS, [e.to_string()]),
                )
            }
        };

        let details = details
            .section_if_any(SEARCH_RESULTS, &search_lines)
            .section_if_any(EXPLAINER, &explainer_lines)
            .build();
        ValidationResult::new(status, details).with_reference(reference)
    }

    fn via_search(&self, search: &CachedSearch, text: &str) -> ValidationResult {
        let outcome = search.search(&search_query(text), self.num_results);
        let results = match outcome.as_ref() {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "search failed");
                return ValidationResult::new(Status::Warning, format!("SerpAPI error: {e}"));
            }
        };
        if results.items.is_empty() {
            return ValidationResult::new(Status::Warning, "No search results found.").with_reference("SerpAPI");
        }

        let ev = assess(&results.items);
        let details = DetailsBuilder::new(ev.summary())
            .section(SEARCH_RESULTS, ev.lines.iter().cloned())
            .section(EXPLAINER, [ev.trigger_line()])
            .build();
        ValidationResult::new(ev.verdict(), details).with_reference("SerpAPI Google Search")
    }
}

fn via_webhook(hook: &dyn Delegate, text: &str) -> ValidationResult {
    hook.delegate(text).unwrap_or_else(|e| {
        warn!(error = %e, "webhook delegate failed");
        ValidationResult::new(Status::Warning, e.to_string())
    })
}

fn llm_error_summary() -> String {
    summary_line(Status::Warning, "LLM error encountered")
}
