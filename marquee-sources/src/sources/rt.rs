//! Rotten Tomatoes adapter.

use std::sync::Arc;

use async_trait::async_trait;

use super::{MovieSource, SourceKind, SourceQuery, SourceRecord};
use crate::candidate::{SearchCandidate, fields};
use crate::errors::SourceError;
use crate::providers::{MovieSearchProvider, SearchQuery};
use crate::resolver::MatchResolver;
use crate::session::Session;

/// Rotten Tomatoes source.
///
/// Title matches only count when the result carries a tomatometer score, and
/// the fallback prefers the first scored result.
#[derive(Debug, Clone)]
pub struct RottenTomatoes {
    record: SourceRecord,
    provider: Arc<dyn MovieSearchProvider>,
    resolver: MatchResolver,
}

fn has_score(candidate: &SearchCandidate) -> bool {
    candidate.is_truthy(fields::SCORE)
}

impl RottenTomatoes {
    /// Creates an unloaded Rotten Tomatoes source.
    pub fn new(query: SourceQuery, provider: Arc<dyn MovieSearchProvider>) -> Self {
        Self {
            record: SourceRecord::new(query),
            provider,
            resolver: MatchResolver::default().with_score_requirement(has_score),
        }
    }

    /// Release year as shown on the page.
    pub fn year(&self) -> Option<String> {
        self.record.read(|c| c.text(fields::YEAR))
    }

    /// Tomatometer score as shown on the page.
    pub fn score(&self) -> Option<String> {
        self.record.read(|c| c.text(fields::SCORE))
    }

    /// Link to the Rotten Tomatoes page.
    pub fn url(&self) -> Option<String> {
        self.record.read(|c| c.text(fields::URL))
    }
}

#[async_trait]
impl MovieSource for RottenTomatoes {
    fn kind(&self) -> SourceKind {
        SourceKind::RottenTomatoes
    }

    fn record(&self) -> &SourceRecord {
        &self.record
    }

    async fn load(&mut self, session: &Session) -> Result<(), SourceError> {
        let query = self.record.query().clone();
        let Some(title) = query.raw_title() else {
            self.record.finish(SourceKind::RottenTomatoes, None);
            return Ok(());
        };

        let candidates = self
            .provider
            .search(session, &SearchQuery::new(title, None))
            .await?;
        let resolved = self
            .resolver
            .resolve(candidates, Some(title), query.raw_year());

        self.record.finish(SourceKind::RottenTomatoes, resolved);
        Ok(())
    }
}
