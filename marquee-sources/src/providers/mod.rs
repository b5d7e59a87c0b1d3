//! Provider interfaces and implementations for movie data lookup.
//!
//! Adapters never talk HTTP themselves: they call these traits, and the
//! concrete clients are injected through [`SourceProviders`].

use std::sync::Arc;

use async_trait::async_trait;
use marquee_core::config::{MarqueeConfig, TMDB_API_KEY_ENV};

use crate::candidate::SearchCandidate;
use crate::errors::SourceError;
use crate::session::Session;

pub mod memory;
pub mod metacritic;
pub mod omdb;
pub mod rotten_tomatoes;
pub mod tmdb;

pub use memory::InMemoryProvider;
pub use metacritic::MetacriticClient;
pub use omdb::OmdbClient;
pub use rotten_tomatoes::RottenTomatoesClient;
pub use tmdb::TmdbClient;

/// Free-text search request handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text title
    pub title: String,
    /// Narrows the search for providers that support it
    pub year: Option<i32>,
}

impl SearchQuery {
    /// Creates a query for `title`, optionally narrowed by `year`.
    pub fn new(title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            title: title.into(),
            year,
        }
    }
}

/// Trait for providers that can search movies by title.
#[async_trait]
pub trait MovieSearchProvider: Send + Sync + std::fmt::Debug {
    /// Display name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Search for movies matching `query`, in the provider's own ranking order.
    ///
    /// # Errors
    /// - `SourceError::Network` - Network connectivity issues
    /// - `SourceError::Parse` - Response could not be parsed
    /// - `SourceError::Provider` - Provider answered with an error
    async fn search(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<Vec<SearchCandidate>, SourceError>;
}

/// Trait for providers that can also fetch a single movie by id.
#[async_trait]
pub trait MovieLookupProvider: MovieSearchProvider {
    /// Fetch the main record for `id`. `Ok(None)` means the id is unknown.
    ///
    /// # Errors
    /// - `SourceError::Network` - Network connectivity issues
    /// - `SourceError::Parse` - Response could not be parsed
    /// - `SourceError::Provider` - Provider answered with an error
    async fn get_by_id(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<Option<SearchCandidate>, SourceError>;

    /// Fetch the extended record for `id` (long-form fields such as the full plot).
    ///
    /// # Errors
    /// Same as [`MovieLookupProvider::get_by_id`].
    async fn get_extended(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<Option<SearchCandidate>, SourceError> {
        self.get_by_id(session, id).await
    }
}

/// The provider instances an aggregator builds its adapters from.
#[derive(Debug, Clone)]
pub struct SourceProviders {
    /// IMDb lookups
    pub imdb: Arc<dyn MovieLookupProvider>,
    /// Metacritic search
    pub metacritic: Arc<dyn MovieSearchProvider>,
    /// Rotten Tomatoes search
    pub rotten_tomatoes: Arc<dyn MovieSearchProvider>,
    /// Absent when no TMDB API key is configured
    pub tmdb: Option<Arc<dyn MovieLookupProvider>>,
}

impl SourceProviders {
    /// Builds the real HTTP-backed clients from configuration.
    pub fn from_config(config: &MarqueeConfig) -> Self {
        let endpoints = &config.endpoints;

        let tmdb = config.api_keys.resolve_tmdb(None).map(|key| {
            Arc::new(TmdbClient::new(endpoints.tmdb_base_url.clone(), key))
                as Arc<dyn MovieLookupProvider>
        });

        Self {
            imdb: Arc::new(OmdbClient::new(
                endpoints.omdb_base_url.clone(),
                config.api_keys.omdb.clone(),
            )),
            metacritic: Arc::new(MetacriticClient::new(endpoints.metacritic_base_url.clone())),
            rotten_tomatoes: Arc::new(RottenTomatoesClient::new(
                endpoints.rotten_tomatoes_base_url.clone(),
            )),
            tmdb,
        }
    }

    /// Returns the TMDB provider.
    ///
    /// # Errors
    /// - `SourceError::MissingApiKey` - If no TMDB key was configured
    pub fn tmdb(&self) -> Result<Arc<dyn MovieLookupProvider>, SourceError> {
        self.tmdb.clone().ok_or(SourceError::MissingApiKey {
            provider: "TMDB",
            env_var: TMDB_API_KEY_ENV,
        })
    }
}
