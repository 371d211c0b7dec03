//! Web search backend.
//!
//! [`SearchEngine`] is the seam; [`serpapi::SerpApiClient`] is the production
//! engine and [`cache::CachedSearch`] memoizes identical queries.

pub mod cache;
pub mod serpapi;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::CachedSearch;
pub use serpapi::SerpApiClient;

/// One ranked search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("SERPAPI_KEY missing")]
    MissingKey,
    #[error("HTTP {status}")]
    Http { status: u16, body: String },
    #[error("{0}")]
    Transport(String),
    /// Error reported inside a successful response body.
    #[error("{0}")]
    Api(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

pub type SearchOutcome = Result<SearchResults, SearchError>;

pub trait SearchEngine {
    fn search(&self, query: &str, num: usize) -> SearchOutcome;
}

/// Host part of `link`, or an empty string when it does not parse.
pub fn domain_of(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Hosts of every item link that parses.
pub fn extract_domains(items: &[SearchItem]) -> Vec<String> {
    items
        .iter()
        .map(|i| domain_of(&i.link))
        .filter(|d| !d.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_parsing() {
        assert_eq!(domain_of("https://www.ti.com/lit/ds/symlink/ne555.pdf"), "www.ti.com");
        assert_eq!(domain_of("not a url"), "");
        assert_eq!(domain_of(""), "");
    }

    #[test]
    fn domains_skip_unparseable_links() {
        let items = vec![
            SearchItem { link: "https://www.st.com/a".into(), ..Default::default() },
            SearchItem { link: "".into(), ..Default::default() },
            SearchItem { link: "http://forum.example.org/x".into(), ..Default::default() },
        ];
        assert_eq!(extract_domains(&items), vec!["www.st.com", "forum.example.org"]);
    }

    #[test]
    fn error_display() {
        assert_eq!(SearchError::MissingKey.to_string(), "SERPAPI_KEY missing");
        assert_eq!(SearchError::Http { status: 401, body: "x".into() }.to_string(), "HTTP 401");
    }
}
