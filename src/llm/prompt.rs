//! Classification prompts.
//!
//! Templates live under `config/prompts/` and are compiled into the binary.
//! Variables use `{{key}}` syntax.

use crate::search::SearchItem;

/// Search items passed to the model as context.
pub const MAX_CONTEXT_ITEMS: usize = 5;

const AUDITOR_OCR_ONLY: &str = include_str!("../../config/prompts/auditor_ocr_only.txt");
const AUDITOR_WITH_SEARCH: &str = include_str!("../../config/prompts/auditor_with_search.txt");
const OCR_TEXT: &str = include_str!("../../config/prompts/ocr_text.txt");
const OCR_WITH_CONTEXT: &str = include_str!("../../config/prompts/ocr_with_context.txt");

const NO_CONTEXT: &str = "(no web context available)";

/// System instruction for the OCR-only classifier.
pub fn ocr_only_system() -> &'static str {
    AUDITOR_OCR_ONLY.trim()
}

/// User turn for the OCR-only classifier.
pub fn ocr_only_user(ocr_text: &str) -> String {
    let mut out = render(OCR_TEXT.trim(), &[("ocr_text", ocr_text.trim())]);
    out.push('\n');
    out
}

/// System prompt for the search-aware classifier.
pub fn with_search_system() -> &'static str {
    AUDITOR_WITH_SEARCH.trim()
}

/// User turn carrying OCR text and up to [`MAX_CONTEXT_ITEMS`] search results.
pub fn with_search_user(ocr_text: &str, context: &[SearchItem]) -> String {
    let block = context_block(context);
    render(
        OCR_WITH_CONTEXT.trim(),
        &[("ocr_text", ocr_text.trim()), ("context", &block)],
    )
}

fn context_block(context: &[SearchItem]) -> String {
    if context.is_empty() {
        return NO_CONTEXT.to_string();
    }
    context
        .iter()
        .take(MAX_CONTEXT_ITEMS)
        .map(|i| format!("- {} | {}\n{}", i.title, i.link, i.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (k, v)| {
        acc.replace(&format!("{{{{{k}}}}}"), v)
    })
}
