//! Details text and its rendering.
//!
//! Details are plain text with marker lines (`Summary:`, `LLM Analysis:`,
//! `Search results:`, `Explainer:`) so any consumer can split them back out.

use serde::Serialize;

use super::{Status, ValidationResult};

pub const SUMMARY: &str = "Summary:";
pub const LLM_ANALYSIS: &str = "LLM Analysis:";
pub const SEARCH_RESULTS: &str = "Search results:";
pub const EXPLAINER: &str = "Explainer:";
pub const RESPONSE_BODY: &str = "Response Body:";

pub fn summary_line(status: Status, reason: &str) -> String {
    let verdict = match status {
        Status::Pass => "REAL",
        Status::Fail => "FAKE",
        Status::Warning => "UNCERTAIN",
    };
    format!("{SUMMARY} {verdict} — {reason}")
}

/// Blank-line separated sections under a summary line.
pub struct DetailsBuilder {
    lines: Vec<String>,
}

impl DetailsBuilder {
    pub fn new(summary: impl Into<String>) -> Self {
        Self { lines: vec![summary.into()] }
    }

    pub fn section<I, S>(mut self, heading: &str, body: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.push(String::new());
        self.lines.push(heading.to_string());
        self.lines.extend(body.into_iter().map(Into::into));
        self
    }

    /// Like [`section`](Self::section) but skipped when `body` is empty.
    pub fn section_if_any(self, heading: &str, body: &[String]) -> Self {
        if body.is_empty() {
            self
        } else {
            self.section(heading, body.iter().cloned())
        }
    }

    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

/// Everything after `marker`, trimmed. `None` when absent or empty.
pub fn section_after<'a>(details: &'a str, marker: &str) -> Option<&'a str> {
    let (_, rest) = details.split_once(marker)?;
    Some(rest.trim()).filter(|s| !s.is_empty())
}

/// The text on the `Summary:` line.
pub fn summary_of(details: &str) -> Option<&str> {
    let (_, rest) = details.split_once(SUMMARY)?;
    Some(rest.lines().next().unwrap_or("").trim()).filter(|s| !s.is_empty())
}

/// Machine-readable outcome for `--json`.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub ocr_text: &'a str,
    pub status: Status,
    pub details: Option<&'a str>,
    pub reference: Option<&'a str>,
    pub summary: Option<&'a str>,
    pub llm_analysis: Option<&'a str>,
    pub explainer: Option<&'a str>,
}

impl<'a> Report<'a> {
    pub fn new(ocr_text: &'a str, result: &'a ValidationResult) -> Self {
        let details = result.details.as_deref();
        Self {
            ocr_text,
            status: result.status,
            details,
            reference: result.reference.as_deref(),
            summary: details.and_then(summary_of),
            llm_analysis: details.and_then(|d| section_after(d, LLM_ANALYSIS)),
            explainer: details.and_then(|d| section_after(d, EXPLAINER)),
        }
    }
}

/// Human-readable report for the terminal.
pub fn render_text(result: &ValidationResult) -> String {
    let mut out = format!("Status: {}\n", result.status);
    if let Some(details) = result.details.as_deref() {
        if let Some(summary) = summary_of(details) {
            out.push_str(&format!(">> {summary}\n"));
        }
        out.push('\n');
        out.push_str(details);
        out.push('\n');
    }
    if let Some(reference) = result.reference.as_deref() {
        out.push_str(&format!("\nReference: {reference}\n"));
    }
    out
}
