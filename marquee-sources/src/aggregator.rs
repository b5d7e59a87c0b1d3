//! Multi-source aggregation for a single movie.
//!
//! [`MovieAggregator`] builds adapters on demand, loads each at most once,
//! and fails fast when a source is read before it was loaded.

use std::fmt;

use futures::future::join_all;
use marquee_core::config::{HttpConfig, MarqueeConfig};

use crate::errors::SourceError;
use crate::providers::SourceProviders;
use crate::session::{Session, block_on};
use crate::sources::{
    Imdb, Metacritic, MovieSource, RottenTomatoes, SourceKind, SourceQuery, Tmdb,
};

/// Aggregated view of one movie across every loaded source.
#[derive(Debug)]
pub struct MovieAggregator {
    title: String,
    year: Option<i32>,
    imdb_id: Option<String>,
    tmdb_id: Option<String>,
    providers: SourceProviders,
    http: HttpConfig,
    imdb: Option<Imdb>,
    mtc: Option<Metacritic>,
    rt: Option<RottenTomatoes>,
    tmdb: Option<Tmdb>,
}

/// An adapter that has been built but not yet stored in its slot.
#[derive(Debug)]
enum PendingSource {
    Imdb(Imdb),
    Metacritic(Metacritic),
    RottenTomatoes(RottenTomatoes),
    Tmdb(Tmdb),
}

impl PendingSource {
    fn as_source_mut(&mut self) -> &mut dyn MovieSource {
        match self {
            PendingSource::Imdb(source) => source,
            PendingSource::Metacritic(source) => source,
            PendingSource::RottenTomatoes(source) => source,
            PendingSource::Tmdb(source) => source,
        }
    }

    async fn load(mut self, session: &Session) -> Result<Self, SourceError> {
        self.as_source_mut().load(session).await?;
        Ok(self)
    }
}

impl MovieAggregator {
    /// Creates an aggregator using providers configured from the environment.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_config(title, &MarqueeConfig::from_env())
    }

    /// Creates an aggregator using providers and HTTP settings from `config`.
    pub fn with_config(title: impl Into<String>, config: &MarqueeConfig) -> Self {
        Self {
            title: title.into(),
            year: None,
            imdb_id: None,
            tmdb_id: None,
            providers: SourceProviders::from_config(config),
            http: config.http.clone(),
            imdb: None,
            mtc: None,
            rt: None,
            tmdb: None,
        }
    }

    /// Sets the release year used by every source's year pass.
    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    /// Sets the IMDb id looked up instead of searching.
    pub fn with_imdb_id(mut self, imdb_id: Option<String>) -> Self {
        self.imdb_id = imdb_id;
        self
    }

    /// Sets the TMDB id looked up instead of searching.
    pub fn with_tmdb_id(mut self, tmdb_id: Option<String>) -> Self {
        self.tmdb_id = tmdb_id;
        self
    }

    /// Replaces the providers adapters are built from.
    pub fn with_providers(mut self, providers: SourceProviders) -> Self {
        self.providers = providers;
        self
    }

    /// Title the sources are searched with.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Release year, when given.
    pub fn year(&self) -> Option<i32> {
        self.year
    }

    /// IMDb id, when given.
    pub fn imdb_id(&self) -> Option<&str> {
        self.imdb_id.as_deref()
    }

    /// TMDB id, when given.
    pub fn tmdb_id(&self) -> Option<&str> {
        self.tmdb_id.as_deref()
    }

    /// HTTP settings used for sessions the aggregator opens itself.
    pub fn http_config(&self) -> &HttpConfig {
        &self.http
    }

    /// Loads one source by key (`imdb`, `mtc`, `rt` or `tmdb`).
    ///
    /// A source that is already loaded is left untouched. `id_override` wins
    /// over the stored id and only applies to IMDb and TMDB. Without a
    /// `session`, a temporary one is opened for this load.
    ///
    /// # Errors
    ///
    /// - `SourceError::UnrecognizedSource` - If `name` is not a source key
    /// - `SourceError::MissingApiKey` - If TMDB is requested without a key
    /// - `SourceError::MissingSearchTerm` - If there is neither a title nor an id
    /// - Any error raised by the provider while loading
    pub async fn load_source(
        &mut self,
        name: &str,
        id_override: Option<&str>,
        session: Option<&Session>,
    ) -> Result<&mut Self, SourceError> {
        let kind: SourceKind = name.parse()?;
        if self.is_loaded(kind) {
            tracing::debug!("{kind} already loaded for '{}'", self.title);
            return Ok(self);
        }

        let pending = self.build_source(kind, id_override)?;
        let loaded = match session {
            Some(session) => pending.load(session).await?,
            None => {
                let session = Session::open(&self.http)?;
                let result = pending.load(&session).await;
                session.close();
                result?
            }
        };

        self.store(loaded);
        Ok(self)
    }

    /// Blocking variant of [`MovieAggregator::load_source`].
    ///
    /// # Errors
    ///
    /// Same as [`MovieAggregator::load_source`], plus `SourceError::Runtime`
    /// when called from inside an async runtime.
    pub fn load_source_blocking(
        &mut self,
        name: &str,
        id_override: Option<&str>,
    ) -> Result<&mut Self, SourceError> {
        block_on(self.load_source(name, id_override, None))?
    }

    /// Loads several sources concurrently over one shared session.
    ///
    /// Unknown names, duplicates and already-loaded sources are skipped.
    /// Every source that loads successfully is stored even when another one
    /// fails; the first error is returned afterwards, unknown names first.
    ///
    /// # Errors
    ///
    /// Same as [`MovieAggregator::load_source`].
    pub async fn load_sources<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> Result<&mut Self, SourceError> {
        let mut first_error = None;
        let mut kinds: Vec<SourceKind> = Vec::new();

        for name in names {
            match name.as_ref().parse::<SourceKind>() {
                Ok(kind) if kinds.contains(&kind) || self.is_loaded(kind) => {}
                Ok(kind) => kinds.push(kind),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if !kinds.is_empty() {
            let built: Vec<_> = kinds
                .iter()
                .map(|kind| self.build_source(*kind, None))
                .collect();

            let session = Session::open(&self.http)?;
            let loads = built.into_iter().map(|pending| {
                let session = &session;
                async move { pending?.load(session).await }
            });
            let results = join_all(loads).await;
            session.close();

            for (kind, result) in kinds.into_iter().zip(results) {
                match result {
                    Ok(loaded) => self.store(loaded),
                    Err(e) => {
                        tracing::warn!("Failed to load {kind} for '{}': {e}", self.title);
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }

    /// Blocking variant of [`MovieAggregator::load_sources`].
    ///
    /// # Errors
    ///
    /// Same as [`MovieAggregator::load_sources`], plus `SourceError::Runtime`
    /// when called from inside an async runtime.
    pub fn load_sources_blocking<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> Result<&mut Self, SourceError> {
        block_on(self.load_sources(names))?
    }

    /// Whether the slot for `kind` holds a loaded adapter.
    pub fn is_loaded(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Imdb => self.imdb.is_some(),
            SourceKind::Metacritic => self.mtc.is_some(),
            SourceKind::RottenTomatoes => self.rt.is_some(),
            SourceKind::Tmdb => self.tmdb.is_some(),
        }
    }

    /// Every loaded source, in [`SourceKind::ALL`] order.
    pub fn loaded_sources(&self) -> Vec<&dyn MovieSource> {
        let mut sources: Vec<&dyn MovieSource> = Vec::new();
        if let Some(source) = &self.imdb {
            sources.push(source);
        }
        if let Some(source) = &self.mtc {
            sources.push(source);
        }
        if let Some(source) = &self.rt {
            sources.push(source);
        }
        if let Some(source) = &self.tmdb {
            sources.push(source);
        }
        sources
    }

    /// # Errors
    ///
    /// - `SourceError::SourceNotLoaded` - If IMDb has not been loaded
    pub fn imdb(&self) -> Result<&Imdb, SourceError> {
        self.imdb.as_ref().ok_or_else(|| not_loaded(SourceKind::Imdb))
    }

    /// Mutable IMDb access, needed to fetch the plot lazily.
    ///
    /// # Errors
    ///
    /// - `SourceError::SourceNotLoaded` - If IMDb has not been loaded
    pub fn imdb_mut(&mut self) -> Result<&mut Imdb, SourceError> {
        self.imdb.as_mut().ok_or_else(|| not_loaded(SourceKind::Imdb))
    }

    /// # Errors
    ///
    /// - `SourceError::SourceNotLoaded` - If Metacritic has not been loaded
    pub fn mtc(&self) -> Result<&Metacritic, SourceError> {
        self.mtc
            .as_ref()
            .ok_or_else(|| not_loaded(SourceKind::Metacritic))
    }

    /// # Errors
    ///
    /// - `SourceError::SourceNotLoaded` - If Rotten Tomatoes has not been loaded
    pub fn rt(&self) -> Result<&RottenTomatoes, SourceError> {
        self.rt
            .as_ref()
            .ok_or_else(|| not_loaded(SourceKind::RottenTomatoes))
    }

    /// # Errors
    ///
    /// - `SourceError::SourceNotLoaded` - If TMDB has not been loaded
    pub fn tmdb(&self) -> Result<&Tmdb, SourceError> {
        self.tmdb.as_ref().ok_or_else(|| not_loaded(SourceKind::Tmdb))
    }

    fn build_source(
        &self,
        kind: SourceKind,
        id_override: Option<&str>,
    ) -> Result<PendingSource, SourceError> {
        let stored_id = match kind {
            SourceKind::Imdb => self.imdb_id.as_deref(),
            SourceKind::Tmdb => self.tmdb_id.as_deref(),
            SourceKind::Metacritic | SourceKind::RottenTomatoes => None,
        };
        let movie_id = if kind.accepts_id() {
            id_override.or(stored_id).map(str::to_string)
        } else {
            None
        };

        let query = SourceQuery::new(Some(self.title.clone()), movie_id, self.year)?;
        tracing::debug!("Building {kind} source for {query:?}");

        Ok(match kind {
            SourceKind::Imdb => PendingSource::Imdb(Imdb::new(query, self.providers.imdb.clone())),
            SourceKind::Metacritic => PendingSource::Metacritic(Metacritic::new(
                query,
                self.providers.metacritic.clone(),
            )),
            SourceKind::RottenTomatoes => PendingSource::RottenTomatoes(RottenTomatoes::new(
                query,
                self.providers.rotten_tomatoes.clone(),
            )),
            SourceKind::Tmdb => PendingSource::Tmdb(Tmdb::new(query, self.providers.tmdb()?)),
        })
    }

    fn store(&mut self, loaded: PendingSource) {
        match loaded {
            PendingSource::Imdb(source) => self.imdb = Some(source),
            PendingSource::Metacritic(source) => self.mtc = Some(source),
            PendingSource::RottenTomatoes(source) => self.rt = Some(source),
            PendingSource::Tmdb(source) => self.tmdb = Some(source),
        }
    }
}

impl fmt::Display for MovieAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MovieAggregator(title: '{}')", self.title)
    }
}

fn not_loaded(kind: SourceKind) -> SourceError {
    SourceError::SourceNotLoaded {
        source_name: kind.display_name(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::candidate::{SearchCandidate, fields};
    use crate::providers::{InMemoryProvider, MovieLookupProvider, SearchQuery};

    struct Fixture {
        imdb: Arc<InMemoryProvider>,
        mtc: Arc<InMemoryProvider>,
        rt: Arc<InMemoryProvider>,
        tmdb: Arc<InMemoryProvider>,
    }

    impl Fixture {
        fn new() -> Self {
            let movie = SearchCandidate::new()
                .with(fields::TITLE, "The Movie")
                .with(fields::ID, "tt1")
                .with(fields::YEAR, 2001);
            let tmdb_movie = SearchCandidate::new()
                .with("id", 42)
                .with(fields::TITLE, "The Movie");

            Self {
                imdb: Arc::new(
                    InMemoryProvider::new("IMDb")
                        .with_results(vec![movie.clone()])
                        .with_record("tt1", movie.clone()),
                ),
                mtc: Arc::new(InMemoryProvider::new("Metacritic").with_results(vec![movie])),
                rt: Arc::new(InMemoryProvider::new("Rotten Tomatoes").failing_searches()),
                tmdb: Arc::new(
                    InMemoryProvider::new("TMDB")
                        .with_results(vec![tmdb_movie.clone()])
                        .with_record("42", tmdb_movie),
                ),
            }
        }

        fn providers(&self, with_tmdb: bool) -> SourceProviders {
            SourceProviders {
                imdb: self.imdb.clone(),
                metacritic: self.mtc.clone(),
                rotten_tomatoes: self.rt.clone(),
                tmdb: with_tmdb.then(|| self.tmdb.clone() as Arc<dyn MovieLookupProvider>),
            }
        }

        fn aggregator(&self) -> MovieAggregator {
            MovieAggregator::with_config("The Movie", &MarqueeConfig::default())
                .with_providers(self.providers(true))
        }
    }

    #[test]
    fn test_display() {
        let aggregator = MovieAggregator::with_config("Alien", &MarqueeConfig::default());
        assert_eq!(aggregator.to_string(), "MovieAggregator(title: 'Alien')");
    }

    #[test]
    fn test_read_before_load_fails_fast() {
        let aggregator = Fixture::new().aggregator();

        let err = aggregator.rt().unwrap_err();
        assert_eq!(
            err.to_string(),
            "The data for Rotten Tomatoes has not yet been loaded"
        );
        assert!(matches!(
            aggregator.imdb(),
            Err(SourceError::SourceNotLoaded { source_name: "IMDb" })
        ));
    }

    #[tokio::test]
    async fn test_load_source_is_idempotent() {
        let fixture = Fixture::new();
        let mut aggregator = fixture.aggregator();

        aggregator.load_source("imdb", None, None).await.unwrap();
        aggregator.load_source("imdb", None, None).await.unwrap();

        assert_eq!(fixture.imdb.search_calls(), 1);
        assert_eq!(aggregator.imdb().unwrap().title().as_deref(), Some("The Movie"));
    }

    #[tokio::test]
    async fn test_unrecognized_source() {
        let mut aggregator = Fixture::new().aggregator();

        let err = aggregator.load_source("bar", None, None).await.unwrap_err();
        assert_eq!(err.to_string(), "bar is not a recognized source");
    }

    #[tokio::test]
    async fn test_id_override_beats_stored_id() {
        let fixture = Fixture::new();
        let mut aggregator = fixture
            .aggregator()
            .with_tmdb_id(Some("7".to_string()))
            .with_year(Some(2001));

        aggregator.load_source("tmdb", Some("42"), None).await.unwrap();

        assert_eq!(fixture.tmdb.looked_up_ids(), vec!["42"]);
        assert_eq!(fixture.tmdb.search_calls(), 0);
        assert_eq!(aggregator.tmdb().unwrap().id().as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_ids_ignored_by_title_only_sources() {
        let fixture = Fixture::new();
        let mut aggregator = fixture.aggregator().with_year(Some(2001));

        aggregator.load_source("mtc", Some("tt9"), None).await.unwrap();

        assert_eq!(fixture.mtc.queries(), vec![SearchQuery::new("The Movie", None)]);
        assert!(aggregator.mtc().unwrap().is_loaded());
    }

    #[tokio::test]
    async fn test_tmdb_without_key() {
        let fixture = Fixture::new();
        let mut aggregator = MovieAggregator::with_config("The Movie", &MarqueeConfig::default())
            .with_providers(fixture.providers(false));

        let err = aggregator.load_source("tmdb", None, None).await.unwrap_err();

        assert!(matches!(err, SourceError::MissingApiKey { .. }));
        assert!(!aggregator.is_loaded(SourceKind::Tmdb));
    }

    #[tokio::test]
    async fn test_load_sources_keeps_successes() {
        let fixture = Fixture::new();
        let mut aggregator = fixture.aggregator();

        let err = aggregator
            .load_sources(&["imdb", "rt", "mtc", "imdb"])
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Network { .. }));
        assert!(aggregator.is_loaded(SourceKind::Imdb));
        assert!(aggregator.is_loaded(SourceKind::Metacritic));
        assert!(!aggregator.is_loaded(SourceKind::RottenTomatoes));
        assert_eq!(fixture.imdb.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_load_sources_reports_unrecognized_first() {
        let fixture = Fixture::new();
        let mut aggregator = fixture.aggregator();

        let err = aggregator
            .load_sources(&["rt", "bar", "tmdb"])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "bar is not a recognized source");
        assert!(aggregator.is_loaded(SourceKind::Tmdb));
    }

    #[tokio::test]
    async fn test_load_sources_skips_loaded() {
        let fixture = Fixture::new();
        let mut aggregator = fixture.aggregator();

        aggregator.load_source("mtc", None, None).await.unwrap();
        aggregator.load_sources(&["mtc", "tmdb"]).await.unwrap();

        assert_eq!(fixture.mtc.search_calls(), 1);
        assert_eq!(aggregator.loaded_sources().len(), 2);
    }

    #[test]
    fn test_blocking_load() {
        let fixture = Fixture::new();
        let mut aggregator = fixture.aggregator();

        aggregator.load_sources_blocking(&["imdb", "mtc"]).unwrap();
        aggregator.load_source_blocking("mtc", None).unwrap();

        assert_eq!(fixture.mtc.search_calls(), 1);
        assert_eq!(aggregator.mtc().unwrap().title().as_deref(), Some("The Movie"));
    }

    #[tokio::test]
    async fn test_blocking_load_inside_runtime_is_error() {
        let fixture = Fixture::new();
        let mut aggregator = fixture.aggregator();

        let err = aggregator.load_source_blocking("mtc", None).unwrap_err();

        assert!(matches!(err, SourceError::Runtime { .. }));
        assert!(!aggregator.is_loaded(SourceKind::Metacritic));
        assert_eq!(fixture.mtc.search_calls(), 0);
    }
}
