//! Time-bounded memoization of search queries.
//!
//! Entries are keyed by query and result count and live for the process.
//! Errors are cached too, so a failing query is not retried inside the window.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{SearchEngine, SearchOutcome};

pub struct CachedSearch {
    engine: Box<dyn SearchEngine>,
    ttl: Duration,
    /// cache key -> (fetched at, outcome)
    entries: RefCell<HashMap<String, (Instant, Arc<SearchOutcome>)>>,
}

impl CachedSearch {
    pub fn new(engine: Box<dyn SearchEngine>, ttl: Duration) -> Self {
        Self { engine, ttl, entries: RefCell::new(HashMap::new()) }
    }

    pub fn search(&self, query: &str, num: usize) -> Arc<SearchOutcome> {
        self.search_at(query, num, Instant::now())
    }

    /// Same as [`search`](Self::search) with an explicit clock reading.
    pub fn search_at(&self, query: &str, num: usize, now: Instant) -> Arc<SearchOutcome> {
        let key = cache_key(query, num);

        if let Some((fetched_at, outcome)) = self.entries.borrow().get(&key) {
            if now.saturating_duration_since(*fetched_at) < self.ttl {
                debug!(%key, "search cache hit");
                return Arc::clone(outcome);
            }
        }

        debug!(%key, "search cache miss");
        let outcome = Arc::new(self.engine.search(query, num));
        self.entries
            .borrow_mut()
            .insert(key, (now, Arc::clone(&outcome)));
        outcome
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

fn cache_key(query: &str, num: usize) -> String {
    format!("q={query}&n={num}")
}
