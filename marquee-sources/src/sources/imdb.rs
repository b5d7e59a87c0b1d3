//! IMDb adapter.

use std::sync::Arc;

use async_trait::async_trait;
use marquee_core::config::HttpConfig;

use super::{MovieSource, SourceKind, SourceQuery, SourceRecord};
use crate::candidate::{SearchCandidate, fields};
use crate::errors::SourceError;
use crate::providers::{MovieLookupProvider, SearchQuery};
use crate::resolver::{MatchResolver, ResolvedMatch};
use crate::session::{Session, block_on};

/// IMDb source.
///
/// Prefers an id lookup and falls back to a title search. Only results of
/// kind `movie` take part in matching. The plot is fetched on first access
/// when the main record lacks one.
#[derive(Debug, Clone)]
pub struct Imdb {
    record: SourceRecord,
    provider: Arc<dyn MovieLookupProvider>,
    resolver: MatchResolver,
    /// Extended record, fetched at most once for the plot
    extended: Option<SearchCandidate>,
}

impl Imdb {
    /// Creates an unloaded IMDb source.
    pub fn new(query: SourceQuery, provider: Arc<dyn MovieLookupProvider>) -> Self {
        Self {
            record: SourceRecord::new(query),
            provider,
            resolver: MatchResolver::default(),
            extended: None,
        }
    }

    /// Release year.
    pub fn year(&self) -> Option<i32> {
        self.record
            .read(|c| c.integer(fields::YEAR))
            .and_then(|year| i32::try_from(year).ok())
    }

    /// Runtime in minutes, as the provider reports it (e.g. `"136"`).
    pub fn runtime(&self) -> Option<String> {
        self.record.read(|c| c.text(fields::RUNTIME))
    }

    /// IMDb user rating out of 10.
    pub fn rating(&self) -> Option<f64> {
        self.record.read(|c| c.float(fields::RATING))
    }

    /// Plot from the main record or an already fetched extended record.
    /// Never performs I/O.
    pub fn cached_plot(&self) -> Option<String> {
        self.record
            .read(plot_of)
            .or_else(|| self.extended.as_ref().and_then(plot_of))
    }

    /// Plot, fetching the extended record on first access if needed.
    ///
    /// A failed fetch is logged and returns `None`; the next call retries.
    pub async fn plot(&mut self, session: &Session) -> Option<String> {
        if let Some(plot) = self.cached_plot() {
            return Some(plot);
        }
        if self.extended.is_some() {
            return None;
        }

        let id = self.id()?;
        match self.provider.get_extended(session, &id).await {
            Ok(extended) => {
                self.extended = Some(extended.unwrap_or_default());
                self.cached_plot()
            }
            Err(e) => {
                tracing::warn!("IMDb plot lookup for {id} failed: {e}");
                None
            }
        }
    }

    /// Blocking variant of [`Imdb::plot`]. Inside an async runtime nothing is
    /// fetched and only a cached plot is returned.
    pub fn plot_blocking(&mut self, http: &HttpConfig) -> Option<String> {
        if let Some(plot) = self.cached_plot() {
            return Some(plot);
        }

        let fetched = block_on(async {
            let session = Session::open(http).ok()?;
            let plot = self.plot(&session).await;
            session.close();
            plot
        });

        fetched.unwrap_or_else(|e| {
            tracing::warn!("IMDb plot lookup failed: {e}");
            None
        })
    }

    async fn lookup_by_id(&self, session: &Session, id: &str) -> Option<SearchCandidate> {
        match self.provider.get_by_id(session, id).await {
            Ok(Some(candidate)) => Some(candidate),
            Ok(None) => {
                tracing::warn!("IMDb has no record for id {id}, searching by title");
                None
            }
            Err(e) => {
                tracing::warn!("IMDb lookup for id {id} failed, searching by title: {e}");
                None
            }
        }
    }

    async fn search(
        &self,
        session: &Session,
        title: &str,
    ) -> Result<Option<ResolvedMatch>, SourceError> {
        let year = self.record.query().raw_year();
        let candidates = self
            .provider
            .search(session, &SearchQuery::new(title, year))
            .await?;

        let movies: Vec<_> = candidates.into_iter().filter(is_movie).collect();
        let Some(mut resolved) = self.resolver.resolve(movies, Some(title), year) else {
            return Ok(None);
        };

        // Search hits are summaries; swap in the main record when available.
        if let Some(id) = resolved.candidate.text(fields::ID) {
            match self.provider.get_by_id(session, &id).await {
                Ok(Some(detail)) => resolved.candidate = detail,
                Ok(None) => {}
                Err(e) => tracing::warn!("IMDb detail fetch for {id} failed: {e}"),
            }
        }

        Ok(Some(resolved))
    }
}

#[async_trait]
impl MovieSource for Imdb {
    fn kind(&self) -> SourceKind {
        SourceKind::Imdb
    }

    fn record(&self) -> &SourceRecord {
        &self.record
    }

    async fn load(&mut self, session: &Session) -> Result<(), SourceError> {
        let query = self.record.query().clone();

        if let Some(id) = query.movie_id()
            && let Some(candidate) = self.lookup_by_id(session, id).await
        {
            let resolved = ResolvedMatch {
                candidate,
                low_confidence: false,
            };
            self.record.finish(SourceKind::Imdb, Some(resolved));
            return Ok(());
        }

        let resolved = match query.raw_title() {
            Some(title) => self.search(session, title).await?,
            None => None,
        };
        self.record.finish(SourceKind::Imdb, resolved);
        Ok(())
    }
}

/// Candidates without a kind are assumed to be movies.
fn is_movie(candidate: &SearchCandidate) -> bool {
    candidate
        .text(fields::KIND)
        .is_none_or(|kind| kind.eq_ignore_ascii_case("movie"))
}

/// Plot text without a trailing `::author` credit.
fn plot_of(candidate: &SearchCandidate) -> Option<String> {
    let plot = candidate.text(fields::PLOT)?;
    let plot = plot.split("::").next().unwrap_or_default().trim();
    (!plot.is_empty()).then(|| plot.to_string())
}
