//! Authenticity signals read from search results.
//!
//! A vendor-hosted datasheet counts for the part; counterfeit vocabulary in a
//! title or snippet counts against it. Only the top five results are read.

use crate::search::{SearchItem, domain_of};

use super::Status;

/// Results inspected per query.
pub const TOP_RESULTS: usize = 5;

/// Manufacturer domains whose datasheets count as a positive signal.
pub const VENDOR_DOMAINS: &[&str] = &[
    "microchip.com",
    "ti.com",
    "st.com",
    "nxp.com",
    "analog.com",
    "infineon.com",
    "onsemi.com",
    "renesas.com",
    "maximintegrated.com",
];

const COUNTERFEIT_KEYWORDS: &[&str] = &["fake", "counterfeit", "clone"];

const NO_SIGNAL: &str = "No decisive signal found in top results.";

pub fn search_query(text: &str) -> String {
    format!("{text} IC marking genuine datasheet")
}

/// A result that triggered a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub title: String,
    pub link: String,
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    /// `- {title} | {link}` per inspected result.
    pub lines: Vec<String>,
    pub vendor_datasheet: Option<Hit>,
    pub counterfeit_mention: Option<Hit>,
}

pub fn assess(items: &[SearchItem]) -> Evidence {
    let mut ev = Evidence::default();
    for item in items.iter().take(TOP_RESULTS) {
        let domain = domain_of(&item.link);
        ev.lines.push(format!("- {} | {}", item.title, item.link));

        let low = format!("{} {}", item.title, item.snippet).to_lowercase();
        let hit = || Hit { title: item.title.clone(), link: item.link.clone(), domain: domain.clone() };

        if ev.vendor_datasheet.is_none()
            && low.contains("datasheet")
            && VENDOR_DOMAINS.iter().any(|v| domain.contains(v))
        {
            ev.vendor_datasheet = Some(hit());
        }
        if ev.counterfeit_mention.is_none() && COUNTERFEIT_KEYWORDS.iter().any(|k| low.contains(k)) {
            ev.counterfeit_mention = Some(hit());
        }
    }
    ev
}

impl Evidence {
    /// A vendor datasheet outranks a counterfeit mention.
    pub fn verdict(&self) -> Status {
        if self.vendor_datasheet.is_some() {
            Status::Pass
        } else if self.counterfeit_mention.is_some() {
            Status::Fail
        } else {
            Status::Warning
        }
    }

    /// Summary line when search alone decides.
    pub fn summary(&self) -> String {
        match (&self.vendor_datasheet, &self.counterfeit_mention) {
            (Some(p), _) => format!("Summary: REAL — vendor datasheet found on {}", p.domain),
            (None, Some(_)) => "Summary: FAKE — counterfeit keywords present in top results".into(),
            (None, None) => "Summary: UNCERTAIN — no decisive signal in top results".into(),
        }
    }

    /// Explainer line when search alone decides.
    pub fn trigger_line(&self) -> String {
        match (&self.vendor_datasheet, &self.counterfeit_mention) {
            (Some(p), _) => format!(
                "PASS triggered by vendor datasheet on {}: {} | {}",
                p.domain, p.title, p.link
            ),
            (None, Some(f)) => format!("FAIL triggered by suspicious keywords in: {} | {}", f.title, f.link),
            (None, None) => NO_SIGNAL.into(),
        }
    }

    /// Explainer line when search only supports an LLM verdict.
    pub fn indicator_line(&self) -> String {
        match (&self.vendor_datasheet, &self.counterfeit_mention) {
            (Some(p), _) => format!(
                "PASS indicator: vendor datasheet on {}: {} | {}",
                p.domain, p.title, p.link
            ),
            (None, Some(f)) => format!("FAIL indicator: suspicious keywords in: {} | {}", f.title, f.link),
            (None, None) => NO_SIGNAL.into(),
        }
    }
}
