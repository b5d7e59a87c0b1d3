//! TMDB REST client.

use std::collections::BTreeMap;

use async_trait::async_trait;
use marquee_core::config::{MarqueeConfig, TMDB_API_KEY_ENV};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{MovieLookupProvider, MovieSearchProvider, SearchQuery};
use crate::candidate::SearchCandidate;
use crate::errors::SourceError;
use crate::session::Session;

const PROVIDER: &str = "TMDB";

/// Client for The Movie Database API (v3).
///
/// Candidates are TMDB's own JSON objects, untouched: `release_date` is a
/// date string, `genres` an array of `{id, name}` objects, and detail
/// records carry `credits` appended.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    base_url: String,
    api_key: String,
    language: String,
    region: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WatchProvidersResponse {
    #[serde(default)]
    results: Map<String, Value>,
}

impl TmdbClient {
    /// Creates a client for the API at `base_url`, using the US region.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            language: "en-US".to_string(),
            region: "US".to_string(),
        }
    }

    /// Builds a client from configuration. `explicit_key` takes precedence
    /// over the configured key.
    ///
    /// # Errors
    ///
    /// - `SourceError::MissingApiKey` - If neither source provides a non-blank key
    pub fn from_config(
        config: &MarqueeConfig,
        explicit_key: Option<String>,
    ) -> Result<Self, SourceError> {
        let api_key =
            config
                .api_keys
                .resolve_tmdb(explicit_key)
                .ok_or(SourceError::MissingApiKey {
                    provider: PROVIDER,
                    env_var: TMDB_API_KEY_ENV,
                })?;
        Ok(Self::new(config.endpoints.tmdb_base_url.clone(), api_key))
    }

    /// Sets the ISO 3166-1 region sent with searches (affects `release_date`).
    pub fn with_region(mut self, region: &str) -> Self {
        self.region = region.to_uppercase();
        self
    }

    /// ISO 3166-1 region sent with searches.
    pub fn region(&self) -> &str {
        &self.region
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn search_params(&self, query: &str, year: Option<i32>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("include_adult", "false".to_string()),
            ("language", self.language.clone()),
            ("page", "1".to_string()),
            ("query", query.to_string()),
            ("region", self.region.clone()),
        ];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }
        params
    }

    async fn get<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<Option<T>, SourceError> {
        let response = session
            .client()
            .get(self.url(path))
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Provider {
                provider: PROVIDER,
                reason: format!("HTTP {status}: {body}"),
            });
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| SourceError::Parse {
                reason: format!("TMDB JSON parsing failed: {e}"),
            })
    }

    /// Searches movies by title, optionally narrowed to a release year.
    ///
    /// # Errors
    ///
    /// - `SourceError::Network` - Network connectivity issues
    /// - `SourceError::Provider` - TMDB rejected the request (e.g. invalid key)
    pub async fn search_movies(
        &self,
        session: &Session,
        query: &str,
        year: Option<i32>,
    ) -> Result<Vec<SearchCandidate>, SourceError> {
        let params = self.search_params(query, year);
        let response: Option<SearchResponse> = self.get(session, "/search/movie", &params).await?;

        Ok(response
            .map(|r| {
                r.results
                    .into_iter()
                    .filter_map(SearchCandidate::from_value)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Fetches a movie with its credits. Unknown ids yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Same as [`TmdbClient::search_movies`].
    pub async fn get_movie(
        &self,
        session: &Session,
        movie_id: &str,
    ) -> Result<Option<SearchCandidate>, SourceError> {
        let params = [
            ("language", self.language.clone()),
            ("append_to_response", "credits".to_string()),
        ];
        let path = format!("/movie/{}", urlencoding::encode(movie_id.trim()));
        let movie: Option<Value> = self.get(session, &path, &params).await?;

        Ok(movie
            .filter(|m| m.get("success") != Some(&Value::Bool(false)))
            .and_then(SearchCandidate::from_value))
    }

    /// Fetches streaming availability for a movie, keyed by lowercase region.
    ///
    /// Regions without data map to an empty object.
    ///
    /// # Errors
    ///
    /// - `SourceError::Provider` - Unknown movie id or rejected request
    pub async fn streaming_providers(
        &self,
        session: &Session,
        movie_id: &str,
        regions: &[String],
    ) -> Result<BTreeMap<String, Value>, SourceError> {
        let path = format!("/movie/{}/watch/providers", urlencoding::encode(movie_id.trim()));
        let response: WatchProvidersResponse =
            self.get(session, &path, &[])
                .await?
                .ok_or_else(|| SourceError::Provider {
                    provider: PROVIDER,
                    reason: format!("movie {movie_id} not found"),
                })?;

        Ok(select_regions(response.results, regions))
    }
}

fn select_regions(available: Map<String, Value>, regions: &[String]) -> BTreeMap<String, Value> {
    regions
        .iter()
        .map(|region| {
            let data = available
                .get(&region.to_uppercase())
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            (region.to_lowercase(), data)
        })
        .collect()
}

#[async_trait]
impl MovieSearchProvider for TmdbClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<Vec<SearchCandidate>, SourceError> {
        self.search_movies(session, &query.title, query.year).await
    }
}

#[async_trait]
impl MovieLookupProvider for TmdbClient {
    async fn get_by_id(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<Option<SearchCandidate>, SourceError> {
        self.get_movie(session, id).await
    }
}
