//! In-memory provider with canned results.
//!
//! Serves preloaded candidates without network access and records every
//! call, so tests can assert how often a source actually hit its provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MovieLookupProvider, MovieSearchProvider, SearchQuery};
use crate::candidate::SearchCandidate;
use crate::errors::SourceError;
use crate::session::Session;

/// Provider serving canned search results and id records.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    name: &'static str,
    results: Vec<SearchCandidate>,
    records: HashMap<String, SearchCandidate>,
    extended: HashMap<String, SearchCandidate>,
    fail_searches: bool,
    fail_lookups: bool,
    search_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
    extended_calls: AtomicUsize,
    queries: Mutex<Vec<SearchQuery>>,
    looked_up: Mutex<Vec<String>>,
}

impl InMemoryProvider {
    /// Creates a provider with no results, reporting `name`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Candidates returned, in order, by every search.
    pub fn with_results(mut self, results: Vec<SearchCandidate>) -> Self {
        self.results = results;
        self
    }

    /// Record returned by `get_by_id(id)`.
    pub fn with_record(mut self, id: &str, record: SearchCandidate) -> Self {
        self.records.insert(id.to_string(), record);
        self
    }

    /// Record returned by `get_extended(id)`.
    pub fn with_extended(mut self, id: &str, record: SearchCandidate) -> Self {
        self.extended.insert(id.to_string(), record);
        self
    }

    /// Makes every search fail with a network error.
    pub fn failing_searches(mut self) -> Self {
        self.fail_searches = true;
        self
    }

    /// Makes every id lookup fail with a network error.
    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Number of searches served so far.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_by_id` calls served so far.
    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_extended` calls served so far.
    pub fn extended_calls(&self) -> usize {
        self.extended_calls.load(Ordering::SeqCst)
    }

    /// Every query searched so far, oldest first.
    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().clone()
    }

    /// Every id looked up so far (main and extended), oldest first.
    pub fn looked_up_ids(&self) -> Vec<String> {
        self.looked_up.lock().clone()
    }

    fn lookup_failure(&self) -> SourceError {
        SourceError::Network {
            reason: format!("{} lookup unavailable", self.name),
        }
    }
}

#[async_trait]
impl MovieSearchProvider for InMemoryProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(
        &self,
        _session: &Session,
        query: &SearchQuery,
    ) -> Result<Vec<SearchCandidate>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(query.clone());

        if self.fail_searches {
            return Err(SourceError::Network {
                reason: format!("{} search unavailable", self.name),
            });
        }
        Ok(self.results.clone())
    }
}

#[async_trait]
impl MovieLookupProvider for InMemoryProvider {
    async fn get_by_id(
        &self,
        _session: &Session,
        id: &str,
    ) -> Result<Option<SearchCandidate>, SourceError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.looked_up.lock().push(id.to_string());

        if self.fail_lookups {
            return Err(self.lookup_failure());
        }
        Ok(self.records.get(id).cloned())
    }

    async fn get_extended(
        &self,
        _session: &Session,
        id: &str,
    ) -> Result<Option<SearchCandidate>, SourceError> {
        self.extended_calls.fetch_add(1, Ordering::SeqCst);
        self.looked_up.lock().push(id.to_string());

        if self.fail_lookups {
            return Err(self.lookup_failure());
        }
        Ok(self
            .extended
            .get(id)
            .or_else(|| self.records.get(id))
            .cloned())
    }
}
