//! One-shot lookups that do not go through an aggregator.

use std::collections::BTreeMap;

use marquee_core::config::MarqueeConfig;
use serde::Serialize;
use serde_json::Value;

use crate::candidate::{SearchCandidate, fields};
use crate::errors::SourceError;
use crate::providers::{MovieSearchProvider, SearchQuery, TmdbClient};
use crate::session::Session;

/// Condensed IMDb search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieSummary {
    /// Movie title
    pub title: Option<String>,
    /// Media kind, e.g. `movie`
    pub kind: Option<String>,
    /// Release year
    pub year: Option<i32>,
    /// IMDb id (`tt…`)
    pub imdb_id: Option<String>,
    /// Poster image URL
    pub cover_url: Option<String>,
}

impl From<&SearchCandidate> for MovieSummary {
    fn from(candidate: &SearchCandidate) -> Self {
        Self {
            title: candidate.title(),
            kind: candidate.text(fields::KIND),
            year: candidate
                .integer(fields::YEAR)
                .and_then(|year| i32::try_from(year).ok()),
            imdb_id: candidate.text(fields::ID),
            cover_url: candidate.text(fields::COVER_URL),
        }
    }
}

/// Searches IMDb and returns every hit, in provider order.
///
/// # Errors
///
/// Any error raised by the provider.
pub async fn search_imdb_movies<P: MovieSearchProvider + ?Sized>(
    provider: &P,
    session: &Session,
    query: &str,
) -> Result<Vec<MovieSummary>, SourceError> {
    let results = provider
        .search(session, &SearchQuery::new(query, None))
        .await?;
    Ok(results.iter().map(MovieSummary::from).collect())
}

/// Searches TMDB in `region` (ISO 3166-1, e.g. `"us"` or `"gb"`), which
/// affects the returned `release_date`.
///
/// # Errors
///
/// - `SourceError::MissingApiKey` - If no key is given or configured
/// - Any error raised by the TMDB client
pub async fn search_tmdb_movies(
    config: &MarqueeConfig,
    session: &Session,
    query: &str,
    api_key: Option<String>,
    region: &str,
) -> Result<Vec<SearchCandidate>, SourceError> {
    let client = TmdbClient::from_config(config, api_key)?.with_region(region);
    client.search_movies(session, query, None).await
}

/// Streaming providers for a TMDB movie, keyed by lowercase region.
///
/// # Errors
///
/// - `SourceError::MissingApiKey` - If no key is given or configured
/// - `SourceError::Provider` - If the movie id is unknown
pub async fn streaming_providers(
    config: &MarqueeConfig,
    session: &Session,
    tmdb_movie_id: &str,
    regions: &[String],
    api_key: Option<String>,
) -> Result<BTreeMap<String, Value>, SourceError> {
    let client = TmdbClient::from_config(config, api_key)?;
    client
        .streaming_providers(session, tmdb_movie_id, regions)
        .await
}

#[cfg(test)]
mod tests {
    use marquee_core::config::HttpConfig;

    use super::*;
    use crate::providers::InMemoryProvider;

    #[tokio::test]
    async fn test_search_imdb_movies_summaries() {
        let provider = InMemoryProvider::new("IMDb").with_results(vec![
            SearchCandidate::new()
                .with(fields::TITLE, "The Matrix")
                .with(fields::KIND, "movie")
                .with(fields::YEAR, 1999)
                .with(fields::ID, "tt0133093")
                .with(fields::COVER_URL, "https://example.com/matrix.jpg"),
            SearchCandidate::new().with(fields::TITLE, "The Matrix Online"),
        ]);
        let session = Session::open(&HttpConfig::default()).unwrap();

        let results = search_imdb_movies(&provider, &session, "The Matrix")
            .await
            .unwrap();

        assert_eq!(
            results[0],
            MovieSummary {
                title: Some("The Matrix".to_string()),
                kind: Some("movie".to_string()),
                year: Some(1999),
                imdb_id: Some("tt0133093".to_string()),
                cover_url: Some("https://example.com/matrix.jpg".to_string()),
            }
        );
        assert_eq!(results[1].year, None);
    }

    #[tokio::test]
    async fn test_tmdb_tools_require_key() {
        let session = Session::open(&HttpConfig::default()).unwrap();
        let config = MarqueeConfig::default();

        let err = search_tmdb_movies(&config, &session, "The Matrix", None, "us")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingApiKey { .. }));

        let err = streaming_providers(&config, &session, "603", &["gb".to_string()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingApiKey { .. }));
    }
}
