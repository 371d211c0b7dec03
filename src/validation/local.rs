//! Offline check against a small table of known part markings.

use super::{Status, ValidationResult};

/// Part number -> marking substrings that identify it, in check order.
pub const KNOWN_MARKINGS: &[(&str, &[&str])] = &[
    ("ATMEGA328P", &["MEGA328", "MEGA 328P", "ATMEGA328P"]),
    ("LM7805", &["7805", "LM7805"]),
    ("NE555", &["NE555", "LM555"]),
    ("TDA1060A", &["TDA1060A", "TDA 1060 A", "HSH92184 Y", "HSH92184", "4728"]),
];

pub fn validate_local(text: &str) -> ValidationResult {
    let upper = text.to_uppercase();
    if upper.trim().is_empty() {
        return ValidationResult::new(Status::Warning, "Empty OCR result.");
    }

    let parts = matched_parts(&upper);
    if parts.is_empty() {
        return ValidationResult::new(
            Status::Warning,
            "No local match; consider validating via web or webhook.",
        );
    }
    ValidationResult::new(Status::Pass, format!("Matched known parts: {}", parts.join(", ")))
}

/// Parts whose markings occur in the upper-cased `text`, in table order.
fn matched_parts(upper: &str) -> Vec<&'static str> {
    KNOWN_MARKINGS
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|p| upper.contains(p)))
        .map(|(part, _)| *part)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_marking_passes_with_part_name() {
        let r = validate_local("atmel\nATMEGA328P-AU\n1842");
        assert_eq!(r.status, Status::Pass);
        assert_eq!(r.details.as_deref(), Some("Matched known parts: ATMEGA328P"));
        assert!(r.reference.is_none());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let r = validate_local("lm7805ct");
        assert_eq!(r.status, Status::Pass);
        assert!(r.details.unwrap().contains("LM7805"));
    }

    #[test]
    fn every_table_marking_matches_its_part() {
        for (part, patterns) in KNOWN_MARKINGS {
            for p in *patterns {
                let r = validate_local(&format!("xx {p} yy"));
                assert_eq!(r.status, Status::Pass, "pattern {p}");
                assert!(r.details.unwrap().contains(part), "pattern {p} should name {part}");
            }
        }
    }

    #[test]
    fn several_parts_listed_once_in_table_order() {
        let r = validate_local("NE555 LM555 and LM7805");
        assert_eq!(r.details.as_deref(), Some("Matched known parts: LM7805, NE555"));
    }

    #[test]
    fn empty_text_is_warning() {
        for t in ["", "   ", "\n\t"] {
            let r = validate_local(t);
            assert_eq!(r.status, Status::Warning);
            assert_eq!(r.details.as_deref(), Some("Empty OCR result."));
        }
    }

    #[test]
    fn unknown_text_is_warning() {
        let r = validate_local("STM32F103C8T6");
        assert_eq!(r.status, Status::Warning);
        assert!(r.details.unwrap().starts_with("No local match"));
    }
}
