//! Marquee Sources - Movie metadata sources and aggregation

#![deny(missing_docs)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Looks a movie up on IMDb, Metacritic, Rotten Tomatoes and TMDB, picks one
//! match per source with a shared exact-match resolver, and exposes the
//! results through a single [`MovieAggregator`].

pub mod aggregator;
pub mod candidate;
pub mod errors;
pub mod lookup;
pub mod providers;
pub mod resolver;
pub mod session;
pub mod sources;

// Re-export main types
pub use aggregator::MovieAggregator;
pub use candidate::SearchCandidate;
pub use errors::SourceError;
pub use lookup::{MovieSummary, search_imdb_movies, search_tmdb_movies, streaming_providers};
pub use providers::{MovieLookupProvider, MovieSearchProvider, SearchQuery, SourceProviders};
pub use resolver::{MatchResolver, ResolvedMatch};
pub use session::Session;
pub use sources::{
    DEFAULT_CAST_LIMIT, DEFAULT_DIRECTOR_LIMIT, DEFAULT_GENRE_LIMIT, Imdb, Metacritic,
    MovieSource, RottenTomatoes, SourceKind, SourceQuery, SourceState, Tmdb,
};

/// Convenience type alias for Results with SourceError.
pub type Result<T> = std::result::Result<T, SourceError>;
