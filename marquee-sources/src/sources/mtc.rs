//! Metacritic adapter.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use super::{MovieSource, SourceKind, SourceQuery, SourceRecord};
use crate::candidate::{SearchCandidate, fields};
use crate::errors::SourceError;
use crate::providers::{MovieSearchProvider, SearchQuery};
use crate::resolver::MatchResolver;
use crate::session::Session;

/// Metacritic source. The search is by title only; the year pass reads each
/// result's year out of its free-text subtitle.
#[derive(Debug, Clone)]
pub struct Metacritic {
    record: SourceRecord,
    provider: Arc<dyn MovieSearchProvider>,
    resolver: MatchResolver,
}

impl Metacritic {
    /// Creates an unloaded Metacritic source.
    pub fn new(query: SourceQuery, provider: Arc<dyn MovieSearchProvider>) -> Self {
        Self {
            record: SourceRecord::new(query),
            provider,
            resolver: MatchResolver::new(SearchCandidate::title, |candidate, year| {
                subtitle_year(candidate) == Some(year)
            }),
        }
    }

    /// First four-digit run in the subtitle, e.g. 1999 from "Movie, R, 1999".
    pub fn year(&self) -> Option<i32> {
        self.record.read(subtitle_year)
    }

    /// Metascore, as shown on the page.
    pub fn rating(&self) -> Option<String> {
        self.record.read(|c| c.text(fields::RATING))
    }

    /// Link to the Metacritic page.
    pub fn url(&self) -> Option<String> {
        self.record.read(|c| c.text(fields::URL))
    }
}

fn subtitle_year(candidate: &SearchCandidate) -> Option<i32> {
    let subtitle = candidate.text(fields::SUBTITLE)?;
    let year = Regex::new(r"\d{4}").ok()?.find(&subtitle)?;
    year.as_str().parse().ok()
}

#[async_trait]
impl MovieSource for Metacritic {
    fn kind(&self) -> SourceKind {
        SourceKind::Metacritic
    }

    fn record(&self) -> &SourceRecord {
        &self.record
    }

    async fn load(&mut self, session: &Session) -> Result<(), SourceError> {
        let query = self.record.query().clone();
        let Some(title) = query.raw_title() else {
            self.record.finish(SourceKind::Metacritic, None);
            return Ok(());
        };

        let candidates = self
            .provider
            .search(session, &SearchQuery::new(title, None))
            .await?;
        let resolved = self
            .resolver
            .resolve(candidates, Some(title), query.raw_year());

        self.record.finish(SourceKind::Metacritic, resolved);
        Ok(())
    }
}
