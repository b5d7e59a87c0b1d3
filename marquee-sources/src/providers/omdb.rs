//! IMDb data via the OMDb API.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use marquee_core::config::OMDB_API_KEY_ENV;

use super::{MovieLookupProvider, MovieSearchProvider, SearchQuery};
use crate::candidate::{SearchCandidate, fields};
use crate::errors::SourceError;
use crate::session::Session;

const PROVIDER: &str = "IMDb";

/// IMDb provider backed by OMDb.
///
/// Search hits carry title, year, kind and id only; `get_by_id` returns the
/// main record with a short plot and `get_extended` the full plot. OMDb
/// rejects keyless requests, so every call fails with
/// `SourceError::MissingApiKey` before any request is sent when no key is set.
#[derive(Debug, Clone)]
pub struct OmdbClient {
    base_url: String,
    api_key: Option<String>,
}

/// Response from the OMDb search endpoint (`?s=`).
#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    search: Vec<OmdbSearchItem>,
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

/// Single search hit from OMDb.
#[derive(Debug, Deserialize)]
struct OmdbSearchItem {
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    #[serde(rename = "Type")]
    media_type: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
}

/// Response from OMDb for movie details (`?i=`).
#[derive(Debug, Deserialize)]
struct OmdbDetail {
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Type")]
    media_type: Option<String>,
    #[serde(rename = "Genre")]
    genre: Option<String>,
    #[serde(rename = "Director")]
    director: Option<String>,
    #[serde(rename = "Actors")]
    actors: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl OmdbClient {
    /// Creates a client; blank keys count as missing.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    fn api_key(&self) -> Result<&str, SourceError> {
        self.api_key.as_deref().ok_or(SourceError::MissingApiKey {
            provider: PROVIDER,
            env_var: OMDB_API_KEY_ENV,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        session: &Session,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let api_key = self.api_key()?;
        let request = session
            .client()
            .get(format!("{}/", self.base_url.trim_end_matches('/')))
            .query(params)
            .query(&[("apikey", api_key)]);

        let response = request.send().await.map_err(|e| SourceError::Network {
            reason: format!("OMDb request failed: {e}"),
        })?;

        if !response.status().is_success() {
            return Err(SourceError::Provider {
                provider: PROVIDER,
                reason: format!("OMDb HTTP {}", response.status()),
            });
        }

        response.json().await.map_err(|e| SourceError::Parse {
            reason: format!("OMDb JSON parsing failed: {e}"),
        })
    }

    async fn fetch_detail(
        &self,
        session: &Session,
        id: &str,
        plot: &str,
    ) -> Result<Option<SearchCandidate>, SourceError> {
        let id = normalize_imdb_id(id);
        let detail: OmdbDetail = self
            .fetch(session, &[("i", id.as_str()), ("plot", plot)])
            .await?;

        if detail.response.as_deref() == Some("False") {
            return no_data_or_error(detail.error).map(|()| None);
        }

        Ok(Some(detail_candidate(detail)))
    }
}

#[async_trait]
impl MovieSearchProvider for OmdbClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<Vec<SearchCandidate>, SourceError> {
        let response: OmdbSearchResponse =
            self.fetch(session, &[("s", query.title.as_str())]).await?;

        if response.response.as_deref() == Some("False") {
            return no_data_or_error(response.error).map(|()| Vec::new());
        }

        Ok(response.search.into_iter().map(search_candidate).collect())
    }
}

#[async_trait]
impl MovieLookupProvider for OmdbClient {
    async fn get_by_id(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<Option<SearchCandidate>, SourceError> {
        self.fetch_detail(session, id, "short").await
    }

    async fn get_extended(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<Option<SearchCandidate>, SourceError> {
        self.fetch_detail(session, id, "full").await
    }
}

/// OMDb reports both "no data" and real failures as `Response: False`.
fn no_data_or_error(error: Option<String>) -> Result<(), SourceError> {
    let message = error.unwrap_or_else(|| "Unknown error".to_string());
    let lowered = message.to_lowercase();

    if lowered.contains("not found")
        || lowered.contains("incorrect imdb id")
        || lowered.contains("too many results")
    {
        tracing::debug!("OMDb returned no data: {message}");
        return Ok(());
    }

    Err(SourceError::Provider {
        provider: PROVIDER,
        reason: message,
    })
}

/// Accepts bare numeric ids ("0133093") as well as "tt"-prefixed ones.
pub fn normalize_imdb_id(id: &str) -> String {
    let id = id.trim();
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        format!("tt{id}")
    } else {
        id.to_string()
    }
}

fn search_candidate(item: OmdbSearchItem) -> SearchCandidate {
    let mut candidate = SearchCandidate::new();
    insert_text(&mut candidate, fields::TITLE, item.title);
    insert_year(&mut candidate, item.year);
    insert_text(&mut candidate, fields::ID, item.imdb_id);
    insert_text(&mut candidate, fields::KIND, item.media_type);
    insert_text(&mut candidate, fields::COVER_URL, item.poster);
    candidate
}

fn detail_candidate(detail: OmdbDetail) -> SearchCandidate {
    let mut candidate = SearchCandidate::new();
    insert_text(&mut candidate, fields::TITLE, detail.title);
    insert_year(&mut candidate, detail.year);
    insert_text(&mut candidate, fields::ID, detail.imdb_id);
    insert_text(&mut candidate, fields::KIND, detail.media_type);
    insert_list(&mut candidate, fields::GENRES, detail.genre);
    insert_list(&mut candidate, fields::DIRECTORS, detail.director);
    insert_list(&mut candidate, fields::CAST, detail.actors);
    insert_text(
        &mut candidate,
        fields::RUNTIME,
        available(detail.runtime)
            .and_then(|r| r.split_whitespace().next().map(str::to_string)),
    );
    if let Some(rating) = available(detail.imdb_rating).and_then(|r| r.parse::<f64>().ok()) {
        candidate.insert(fields::RATING, rating);
    }
    insert_text(&mut candidate, fields::PLOT, detail.plot);
    insert_text(&mut candidate, fields::COVER_URL, detail.poster);
    candidate
}

/// OMDb uses "N/A" for missing values.
fn available(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}

fn insert_text(candidate: &mut SearchCandidate, key: &str, value: Option<String>) {
    if let Some(value) = available(value) {
        candidate.insert(key, value);
    }
}

/// Years like "2019–2021" keep their leading year.
fn insert_year(candidate: &mut SearchCandidate, value: Option<String>) {
    let year = available(value).and_then(|y| {
        y.chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse::<i64>()
            .ok()
    });
    if let Some(year) = year {
        candidate.insert(fields::YEAR, year);
    }
}

fn insert_list(candidate: &mut SearchCandidate, key: &str, value: Option<String>) {
    if let Some(value) = available(value) {
        let items: Vec<Value> = value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect();
        candidate.insert(key, items);
    }
}

#[cfg(test)]
mod tests {
    use marquee_core::config::HttpConfig;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_requires_key_before_request() {
        // Unroutable base URL: a sent request would surface as a network error
        let client = OmdbClient::new("http://127.0.0.1:9", Some("  ".to_string()));
        let session = Session::open(&HttpConfig::default()).unwrap();

        let err = client
            .search(&session, &SearchQuery::new("Dune", None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SourceError::MissingApiKey {
                provider: "IMDb",
                env_var: OMDB_API_KEY_ENV
            }
        ));

        let err = client.get_by_id(&session, "tt0087182").await.unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_search_item_mapping() {
        let response: OmdbSearchResponse = serde_json::from_value(json!({
            "Search": [
                {"Title": "The Matrix", "Year": "1999", "imdbID": "tt0133093", "Type": "movie", "Poster": "N/A"},
                {"Title": "The Matrix", "Year": "2019–2021", "imdbID": "tt1", "Type": "series"}
            ],
            "totalResults": "2",
            "Response": "True"
        }))
        .unwrap();

        let candidates: Vec<_> = response.search.into_iter().map(search_candidate).collect();

        assert_eq!(candidates[0].title().as_deref(), Some("The Matrix"));
        assert_eq!(candidates[0].integer(fields::YEAR), Some(1999));
        assert_eq!(candidates[0].text(fields::ID).as_deref(), Some("tt0133093"));
        assert!(!candidates[0].contains(fields::COVER_URL));
        assert_eq!(candidates[1].integer(fields::YEAR), Some(2019));
        assert_eq!(candidates[1].text(fields::KIND).as_deref(), Some("series"));
    }

    #[test]
    fn test_detail_mapping() {
        let detail: OmdbDetail = serde_json::from_value(json!({
            "Title": "The Matrix",
            "Year": "1999",
            "Type": "movie",
            "Genre": "Action, Sci-Fi",
            "Director": "Lana Wachowski, Lilly Wachowski",
            "Actors": "Keanu Reeves, Laurence Fishburne, Carrie-Anne Moss",
            "Runtime": "136 min",
            "imdbRating": "8.7",
            "Plot": "When a beautiful stranger leads computer hacker Neo to a forbidding underworld...",
            "imdbID": "tt0133093",
            "Response": "True"
        }))
        .unwrap();

        let candidate = detail_candidate(detail);

        assert_eq!(candidate.string_list(fields::GENRES, 3), vec!["Action", "Sci-Fi"]);
        assert_eq!(candidate.string_list(fields::DIRECTORS, 1), vec!["Lana Wachowski"]);
        assert_eq!(candidate.string_list(fields::CAST, 1), vec!["Keanu Reeves"]);
        assert_eq!(candidate.text(fields::RUNTIME).as_deref(), Some("136"));
        assert_eq!(candidate.float(fields::RATING), Some(8.7));
        assert!(candidate.contains(fields::PLOT));
    }

    #[test]
    fn test_missing_values_are_dropped() {
        let detail: OmdbDetail = serde_json::from_value(json!({
            "Title": "Obscure",
            "Runtime": "N/A",
            "imdbRating": "N/A",
            "Plot": "N/A",
            "Response": "True"
        }))
        .unwrap();

        let candidate = detail_candidate(detail);

        assert!(!candidate.contains(fields::RUNTIME));
        assert!(!candidate.contains(fields::RATING));
        assert!(!candidate.contains(fields::PLOT));
    }

    #[test]
    fn test_no_data_errors() {
        assert!(no_data_or_error(Some("Movie not found!".to_string())).is_ok());
        assert!(no_data_or_error(Some("Incorrect IMDb ID.".to_string())).is_ok());
        assert!(matches!(
            no_data_or_error(Some("Invalid API key!".to_string())),
            Err(SourceError::Provider { .. })
        ));
    }

    #[test]
    fn test_normalize_imdb_id() {
        assert_eq!(normalize_imdb_id("0133093"), "tt0133093");
        assert_eq!(normalize_imdb_id("tt0133093"), "tt0133093");
    }
}
