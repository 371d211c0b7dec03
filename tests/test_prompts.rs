//! Tests for classifier prompt templates under config/prompts

use std::fs;

#[test]
fn test_auditor_prompt_files_exist() {
    for name in ["auditor_ocr_only.txt", "auditor_with_search.txt"] {
        let path = format!("config/prompts/{name}");
        assert!(fs::metadata(&path).is_ok(), "{name} prompt file missing");
    }
}

#[test]
fn test_ocr_only_prompt_asks_for_json() {
    let text = fs::read_to_string("config/prompts/auditor_ocr_only.txt").unwrap();
    assert!(text.contains("JSON"), "auditor_ocr_only.txt should request JSON output");
    for label in ["PASS", "FAIL", "WARNING"] {
        assert!(text.contains(label), "auditor_ocr_only.txt should name {label}");
    }
}

#[test]
fn test_ocr_text_template_vars() {
    let text = fs::read_to_string("config/prompts/ocr_text.txt").unwrap();
    assert!(text.contains("{{ocr_text}}"), "ocr_text.txt should contain {{ocr_text}} variable");
}

#[test]
fn test_context_template_vars() {
    let text = fs::read_to_string("config/prompts/ocr_with_context.txt").unwrap();
    assert!(text.contains("{{ocr_text}}"), "ocr_with_context.txt should contain {{ocr_text}} variable");
    assert!(text.contains("{{context}}"), "ocr_with_context.txt should contain {{context}} variable");
    assert!(text.contains("status"), "ocr_with_context.txt should describe the reply keys");
}
