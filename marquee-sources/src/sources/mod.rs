//! Source adapters: one per provider, each turning a query into a single
//! resolved record with normalized accessors.
//!
//! Every adapter starts `Unloaded`, reads as empty until loaded, and moves to
//! `Loaded` or `Empty` exactly once. Reloading is not guarded here; the
//! aggregator loads each source at most once.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use marquee_core::config::HttpConfig;

use crate::candidate::{SearchCandidate, fields};
use crate::errors::SourceError;
use crate::resolver::ResolvedMatch;
use crate::session::{Session, block_on};

pub mod imdb;
pub mod mtc;
pub mod rt;
pub mod tmdb;

pub use imdb::Imdb;
pub use mtc::Metacritic;
pub use rt::RottenTomatoes;
pub use tmdb::Tmdb;

/// Number of genres shown when the caller does not choose a limit.
pub const DEFAULT_GENRE_LIMIT: usize = 3;
/// Number of cast members shown when the caller does not choose a limit.
pub const DEFAULT_CAST_LIMIT: usize = 5;
/// Number of directors shown when the caller does not choose a limit.
pub const DEFAULT_DIRECTOR_LIMIT: usize = 3;

/// The four recognized sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// IMDb, via OMDb
    Imdb,
    /// Metacritic search pages
    Metacritic,
    /// Rotten Tomatoes search pages
    RottenTomatoes,
    /// The Movie Database
    Tmdb,
}

impl SourceKind {
    /// Every source, in load order.
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Imdb,
        SourceKind::Metacritic,
        SourceKind::RottenTomatoes,
        SourceKind::Tmdb,
    ];

    /// Short key used to request the source by name.
    pub fn key(self) -> &'static str {
        match self {
            SourceKind::Imdb => "imdb",
            SourceKind::Metacritic => "mtc",
            SourceKind::RottenTomatoes => "rt",
            SourceKind::Tmdb => "tmdb",
        }
    }

    /// Human-readable name used in errors and output.
    pub fn display_name(self) -> &'static str {
        match self {
            SourceKind::Imdb => "IMDb",
            SourceKind::Metacritic => "Metacritic",
            SourceKind::RottenTomatoes => "Rotten Tomatoes",
            SourceKind::Tmdb => "TMDB",
        }
    }

    /// Whether the source can look movies up by a provider id.
    pub fn accepts_id(self) -> bool {
        matches!(self, SourceKind::Imdb | SourceKind::Tmdb)
    }
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.key() == name)
            .ok_or_else(|| SourceError::UnrecognizedSource {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Search terms an adapter is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    raw_title: Option<String>,
    movie_id: Option<String>,
    raw_year: Option<i32>,
}

impl SourceQuery {
    /// Validates and builds a query. Blank strings count as absent.
    ///
    /// # Errors
    ///
    /// - `SourceError::MissingSearchTerm` - If neither a title nor an id is given
    pub fn new(
        raw_title: Option<String>,
        movie_id: Option<String>,
        raw_year: Option<i32>,
    ) -> Result<Self, SourceError> {
        let raw_title = raw_title.filter(|t| !t.trim().is_empty());
        let movie_id = movie_id.filter(|id| !id.trim().is_empty());

        if raw_title.is_none() && movie_id.is_none() {
            return Err(SourceError::MissingSearchTerm);
        }

        Ok(Self {
            raw_title,
            movie_id,
            raw_year,
        })
    }

    /// Title-only query.
    ///
    /// # Errors
    ///
    /// - `SourceError::MissingSearchTerm` - If `title` is blank
    pub fn title(title: impl Into<String>) -> Result<Self, SourceError> {
        Self::new(Some(title.into()), None, None)
    }

    /// Sets the year used by the resolver's year pass.
    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.raw_year = year;
        self
    }

    /// Title as given by the caller.
    pub fn raw_title(&self) -> Option<&str> {
        self.raw_title.as_deref()
    }

    /// Provider id to look up directly.
    pub fn movie_id(&self) -> Option<&str> {
        self.movie_id.as_deref()
    }

    /// Year as given by the caller.
    pub fn raw_year(&self) -> Option<i32> {
        self.raw_year
    }
}

/// Load state of an adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceState {
    /// Not loaded yet; every accessor reads as empty.
    Unloaded,
    /// A match was resolved.
    Loaded(ResolvedMatch),
    /// Loaded, but the provider had nothing for the query.
    Empty,
}

/// Query plus load state, shared by every adapter.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    query: SourceQuery,
    state: SourceState,
}

impl SourceRecord {
    /// Creates an unloaded record for `query`.
    pub fn new(query: SourceQuery) -> Self {
        Self {
            query,
            state: SourceState::Unloaded,
        }
    }

    /// The query the source was built with.
    pub fn query(&self) -> &SourceQuery {
        &self.query
    }

    /// Current load state.
    pub fn state(&self) -> &SourceState {
        &self.state
    }

    /// The resolved candidate, if the source loaded one.
    pub fn resolved(&self) -> Option<&SearchCandidate> {
        match &self.state {
            SourceState::Loaded(resolved) => Some(&resolved.candidate),
            _ => None,
        }
    }

    /// Set when the match was a fallback pick.
    pub fn low_confidence(&self) -> bool {
        matches!(&self.state, SourceState::Loaded(resolved) if resolved.low_confidence)
    }

    /// Whether a load has finished, with or without a match.
    pub fn is_loaded(&self) -> bool {
        !matches!(self.state, SourceState::Unloaded)
    }

    /// Records the outcome of a load.
    pub fn finish(&mut self, kind: SourceKind, resolved: Option<ResolvedMatch>) {
        self.state = match resolved {
            Some(resolved) => {
                tracing::info!(
                    "Loaded {kind}: {:?} (low_confidence={})",
                    resolved.candidate.title(),
                    resolved.low_confidence
                );
                SourceState::Loaded(resolved)
            }
            None => {
                tracing::info!("Loaded {kind}: no data for {:?}", self.query);
                SourceState::Empty
            }
        };
    }

    pub(crate) fn read<T>(&self, read: impl FnOnce(&SearchCandidate) -> Option<T>) -> Option<T> {
        self.resolved().and_then(read)
    }
}

/// Common interface of the four source adapters.
///
/// Accessors never fail: before loading, or when the provider had no data,
/// they return `None` or an empty list.
#[async_trait]
pub trait MovieSource: Send + Sync + fmt::Debug {
    /// Which source this adapter reads.
    fn kind(&self) -> SourceKind;

    /// Query and load state.
    fn record(&self) -> &SourceRecord;

    /// Queries the provider, resolves one match and stores it.
    ///
    /// # Errors
    /// - `SourceError::Network` - Network connectivity issues
    /// - `SourceError::Parse` - Provider response could not be parsed
    /// - `SourceError::Provider` - Provider answered with an error
    async fn load(&mut self, session: &Session) -> Result<(), SourceError>;

    /// Runs [`MovieSource::load`] to completion on a private runtime with
    /// its own session.
    ///
    /// # Errors
    /// Same as [`MovieSource::load`], plus `SourceError::Runtime` when called
    /// from inside an async runtime.
    fn load_blocking(&mut self, http: &HttpConfig) -> Result<(), SourceError> {
        block_on(async {
            let session = Session::open(http)?;
            let result = self.load(&session).await;
            session.close();
            result
        })?
    }

    /// Title of the match.
    fn title(&self) -> Option<String> {
        self.record().read(SearchCandidate::title)
    }

    /// Provider id of the match.
    fn id(&self) -> Option<String> {
        self.record().read(|c| c.text(fields::ID))
    }

    /// Up to `limit` genres.
    fn genres(&self, limit: usize) -> Vec<String> {
        self.record()
            .read(|c| Some(c.string_list(fields::GENRES, limit)))
            .unwrap_or_default()
    }

    /// Up to `limit` cast members.
    fn cast(&self, limit: usize) -> Vec<String> {
        self.record()
            .read(|c| Some(c.string_list(fields::CAST, limit)))
            .unwrap_or_default()
    }

    /// Up to `limit` directors.
    fn directors(&self, limit: usize) -> Vec<String> {
        self.record()
            .read(|c| Some(c.string_list(fields::DIRECTORS, limit)))
            .unwrap_or_default()
    }

    /// Set when the match was a fallback pick rather than a year or title match.
    fn low_confidence(&self) -> bool {
        self.record().low_confidence()
    }

    /// Whether the source has been loaded.
    fn is_loaded(&self) -> bool {
        self.record().is_loaded()
    }
}
