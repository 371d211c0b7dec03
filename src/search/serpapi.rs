//! SerpAPI Google Search client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, error, warn};

use super::{SearchEngine, SearchError, SearchItem, SearchOutcome, SearchResults};

#[derive(Debug, Clone)]
pub struct SerpApiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SerpApiClient {
    pub fn new(endpoint: String, api_key: Option<String>, timeout_seconds: u64) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| SearchError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint, api_key })
    }
}

impl SearchEngine for SerpApiClient {
    fn search(&self, query: &str, num: usize) -> SearchOutcome {
        let Some(key) = &self.api_key else {
            return Err(SearchError::MissingKey);
        };

        debug!(endpoint = %self.endpoint, query, num, "sending SerpAPI request");
        let num = num.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", key.as_str()),
            ])
            .send()
            .map_err(|e| {
                // The query string carries the API key.
                let e = e.without_url();
                error!(error = %e, "SerpAPI request failed (transport)");
                SearchError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(%status, "SerpAPI returned HTTP error");
            return Err(SearchError::Http { status: status.as_u16(), body });
        }

        let wire = response
            .json::<SerpResponse>()
            .map_err(|e| SearchError::Decode(e.without_url().to_string()))?;
        if let Some(msg) = wire.error {
            warn!(error = %msg, "SerpAPI reported an error");
            return Err(SearchError::Api(msg));
        }

        let items = wire.items();
        debug!(results = items.len(), "SerpAPI results received");
        Ok(SearchResults { items })
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    error: Option<String>,
    /// Absent or `null` when the query has no organic hits.
    #[serde(default)]
    organic_results: Option<Vec<OrganicResult>>,
}

impl SerpResponse {
    fn items(self) -> Vec<SearchItem> {
        self.organic_results
            .unwrap_or_default()
            .into_iter()
            .map(SearchItem::from)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

impl From<OrganicResult> for SearchItem {
    fn from(r: OrganicResult) -> Self {
        let link = r
            .link
            .filter(|l| !l.is_empty())
            .or(r.url)
            .unwrap_or_default();
        SearchItem {
            title: r.title.unwrap_or_default(),
            link,
            snippet: r.snippet.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organic_results_mapped() {
        let wire: SerpResponse = serde_json::from_str(
            r#"{"organic_results":[
                {"title":"NE555 datasheet","link":"https://www.ti.com/ne555","snippet":"Precision timer"},
                {"title":"Mirror","url":"https://mirror.example/ne555"},
                {"position": 3}
            ]}"#,
        )
        .unwrap();
        let items = wire.items();
        assert_eq!(items[0].link, "https://www.ti.com/ne555");
        assert_eq!(items[0].snippet, "Precision timer");
        assert_eq!(items[1].link, "https://mirror.example/ne555");
        assert_eq!(items[2], SearchItem::default());
    }

    #[test]
    fn missing_organic_results_is_empty() {
        let wire: SerpResponse = serde_json::from_str(r#"{"search_metadata":{}}"#).unwrap();
        assert!(wire.error.is_none());
        assert!(wire.items().is_empty());
    }

    #[test]
    fn null_organic_results_is_empty() {
        let wire: SerpResponse =
            serde_json::from_str(r#"{"organic_results":null,"error":null}"#).unwrap();
        assert!(wire.error.is_none());
        assert!(wire.items().is_empty());
    }

    #[test]
    fn missing_key_short_circuits() {
        let client = SerpApiClient::new("http://127.0.0.1:9/search".into(), None, 1).unwrap();
        assert_eq!(client.search("NE555", 5), Err(SearchError::MissingKey));
    }
}
