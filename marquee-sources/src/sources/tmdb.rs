//! TMDB adapter.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use super::{MovieSource, SourceKind, SourceQuery, SourceRecord};
use crate::candidate::SearchCandidate;
use crate::errors::SourceError;
use crate::providers::{MovieLookupProvider, SearchQuery};
use crate::resolver::ResolvedMatch;
use crate::session::Session;

/// TMDB source.
///
/// Looks the movie up by id when one is given; otherwise takes the first
/// search hit (narrowed by year) and fetches its full record. Accessors read
/// TMDB's native fields.
#[derive(Debug, Clone)]
pub struct Tmdb {
    record: SourceRecord,
    provider: Arc<dyn MovieLookupProvider>,
}

impl Tmdb {
    /// Creates an unloaded TMDB source.
    pub fn new(query: SourceQuery, provider: Arc<dyn MovieLookupProvider>) -> Self {
        Self {
            record: SourceRecord::new(query),
            provider,
        }
    }

    /// Release date as `YYYY-MM-DD`.
    pub fn release_date(&self) -> Option<String> {
        self.record.read(|c| c.text("release_date"))
    }

    /// Year of `release_date`.
    pub fn year(&self) -> Option<i32> {
        let date = self.release_date()?;
        NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .ok()
            .map(|d| d.year())
    }

    /// Average vote; an unrated movie reads as `None`.
    pub fn rating(&self) -> Option<f64> {
        self.record
            .read(|c| c.float("vote_average"))
            .filter(|rating| *rating != 0.0)
    }

    /// Runtime in minutes; zero reads as `None`.
    pub fn runtime(&self) -> Option<u32> {
        self.record
            .read(|c| c.integer("runtime"))
            .and_then(|minutes| u32::try_from(minutes).ok())
            .filter(|minutes| *minutes != 0)
    }

    /// Overview text.
    pub fn plot(&self) -> Option<String> {
        self.record.read(|c| c.text("overview"))
    }

    /// IMDb id cross-reference.
    pub fn imdb_id(&self) -> Option<String> {
        self.record.read(|c| c.text("imdb_id"))
    }

    async fn fetch(&self, session: &Session) -> Result<Option<SearchCandidate>, SourceError> {
        let query = self.record.query();

        if let Some(id) = query.movie_id() {
            return self.provider.get_by_id(session, id).await;
        }
        let Some(title) = query.raw_title() else {
            return Ok(None);
        };

        let hits = self
            .provider
            .search(session, &SearchQuery::new(title, query.raw_year()))
            .await?;
        let Some(id) = hits.first().and_then(|hit| hit.text("id")) else {
            return Ok(None);
        };

        self.provider.get_by_id(session, &id).await
    }
}

#[async_trait]
impl MovieSource for Tmdb {
    fn kind(&self) -> SourceKind {
        SourceKind::Tmdb
    }

    fn record(&self) -> &SourceRecord {
        &self.record
    }

    async fn load(&mut self, session: &Session) -> Result<(), SourceError> {
        let resolved = self.fetch(session).await?.map(|candidate| ResolvedMatch {
            candidate,
            low_confidence: false,
        });
        self.record.finish(SourceKind::Tmdb, resolved);
        Ok(())
    }

    fn genres(&self, limit: usize) -> Vec<String> {
        self.record
            .read(|c| Some(names(c.get("genres"), limit)))
            .unwrap_or_default()
    }

    fn cast(&self, limit: usize) -> Vec<String> {
        self.record
            .read(|c| Some(names(c.get("credits").and_then(|cr| cr.get("cast")), limit)))
            .unwrap_or_default()
    }

    fn directors(&self, limit: usize) -> Vec<String> {
        self.record
            .read(|c| {
                let crew = c.get("credits").and_then(|cr| cr.get("crew"))?.as_array()?;
                Some(
                    crew.iter()
                        .filter(|member| member.get("job").and_then(Value::as_str) == Some("Director"))
                        .filter_map(|member| member.get("name").and_then(Value::as_str))
                        .take(limit)
                        .map(str::to_string)
                        .collect(),
                )
            })
            .unwrap_or_default()
    }
}

/// `name` of each object in a TMDB array such as `genres` or `credits.cast`.
fn names(array: Option<&Value>, limit: usize) -> Vec<String> {
    array
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .take(limit)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use marquee_core::config::HttpConfig;
    use serde_json::json;

    use super::*;
    use crate::providers::InMemoryProvider;
    use crate::sources::SourceState;

    fn matrix() -> SearchCandidate {
        SearchCandidate::from_value(json!({
            "id": 603,
            "imdb_id": "tt0133093",
            "title": "The Matrix",
            "release_date": "1999-03-30",
            "vote_average": 8.2,
            "runtime": 136,
            "overview": "Set in the 22nd century, The Matrix tells the story of a computer hacker...",
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "credits": {
                "cast": [{"name": "Keanu Reeves"}, {"name": "Laurence Fishburne"}],
                "crew": [
                    {"name": "Bill Pope", "job": "Director of Photography"},
                    {"name": "Lilly Wachowski", "job": "Director"},
                    {"name": "Lana Wachowski", "job": "Director"}
                ]
            }
        }))
        .unwrap()
    }

    fn session() -> Session {
        Session::open(&HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_id_lookup_first() {
        let provider = Arc::new(InMemoryProvider::new("TMDB").with_record("603", matrix()));
        let query =
            SourceQuery::new(Some("Not It".to_string()), Some("603".to_string()), None).unwrap();
        let mut source = Tmdb::new(query, provider.clone());

        source.load(&session()).await.unwrap();

        assert_eq!(provider.search_calls(), 0);
        assert_eq!(source.id().as_deref(), Some("603"));
        assert_eq!(source.imdb_id().as_deref(), Some("tt0133093"));
        assert_eq!(source.year(), Some(1999));
        assert_eq!(source.release_date().as_deref(), Some("1999-03-30"));
        assert_eq!(source.rating(), Some(8.2));
        assert_eq!(source.runtime(), Some(136));
        assert!(source.plot().is_some());
        assert_eq!(source.genres(1), vec!["Action"]);
        assert_eq!(source.cast(5), vec!["Keanu Reeves", "Laurence Fishburne"]);
        assert_eq!(source.directors(3), vec!["Lilly Wachowski", "Lana Wachowski"]);
        assert!(!source.low_confidence());
    }

    #[tokio::test]
    async fn test_search_then_get_by_first_hit() {
        let hits = vec![
            SearchCandidate::new().with("id", 603).with("title", "The Matrix"),
            SearchCandidate::new().with("id", 604).with("title", "The Matrix Reloaded"),
        ];
        let provider = Arc::new(
            InMemoryProvider::new("TMDB")
                .with_results(hits)
                .with_record("603", matrix()),
        );
        let query = SourceQuery::title("The Matrix").unwrap().with_year(Some(1999));
        let mut source = Tmdb::new(query, provider.clone());

        source.load(&session()).await.unwrap();

        assert_eq!(
            provider.queries(),
            vec![SearchQuery::new("The Matrix", Some(1999))]
        );
        assert_eq!(provider.looked_up_ids(), vec!["603"]);
        assert_eq!(source.title().as_deref(), Some("The Matrix"));
    }

    #[tokio::test]
    async fn test_unknown_id_is_empty() {
        let provider = Arc::new(InMemoryProvider::new("TMDB"));
        let query = SourceQuery::new(None, Some("xxxxx".to_string()), None).unwrap();
        let mut source = Tmdb::new(query, provider);

        source.load(&session()).await.unwrap();

        assert_eq!(source.record().state(), &SourceState::Empty);
        assert!(source.title().is_none());
        assert!(source.genres(3).is_empty());
    }

    #[tokio::test]
    async fn test_zero_values_read_as_none() {
        let unrated = SearchCandidate::new()
            .with("id", 1)
            .with("title", "Unreleased")
            .with("vote_average", 0)
            .with("runtime", 0)
            .with("release_date", "");
        let provider = Arc::new(InMemoryProvider::new("TMDB").with_record("1", unrated));
        let query = SourceQuery::new(None, Some("1".to_string()), None).unwrap();
        let mut source = Tmdb::new(query, provider);

        source.load(&session()).await.unwrap();

        assert!(source.rating().is_none());
        assert!(source.runtime().is_none());
        assert!(source.year().is_none());
    }
}
