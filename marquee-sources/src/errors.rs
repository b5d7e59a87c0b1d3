//! Error types for source loading and aggregation.

use thiserror::Error;

/// Errors that can occur while building, loading or reading movie sources.
///
/// No-match conditions (empty search results, unknown ids, missing fields)
/// are not errors: they surface as empty accessors instead.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A provider that needs credentials was used without an API key.
    #[error("An `api_key` must be provided to use this service (set {env_var})")]
    MissingApiKey {
        /// Display name of the provider
        provider: &'static str,
        /// Environment variable the key can be supplied through
        env_var: &'static str,
    },

    /// An adapter was built with neither a title nor an id to search by.
    #[error("At least one of raw_title and movie_id must be given")]
    MissingSearchTerm,

    /// A source name outside the recognized keys was requested.
    #[error("{name} is not a recognized source")]
    UnrecognizedSource {
        /// The offending source name
        name: String,
    },

    /// Source data was read before the source was loaded.
    #[error("The data for {source_name} has not yet been loaded")]
    SourceNotLoaded {
        /// Display name of the source
        source_name: &'static str,
    },

    /// Network communication with a provider failed.
    #[error("Network error: {reason}")]
    Network {
        /// The reason for the network error
        reason: String,
    },

    /// A provider response could not be parsed.
    #[error("Parse error: {reason}")]
    Parse {
        /// The reason for the parse error
        reason: String,
    },

    /// A provider answered with an error status.
    #[error("{provider} error: {reason}")]
    Provider {
        /// Display name of the provider
        provider: &'static str,
        /// The reason reported by the provider
        reason: String,
    },

    /// The runtime backing a blocking call could not be created.
    #[error("Runtime error: {reason}")]
    Runtime {
        /// The reason for the runtime failure
        reason: String,
    },
}

impl SourceError {
    /// Checks if this error was caused by caller input rather than a provider.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SourceError::MissingApiKey { .. }
                | SourceError::MissingSearchTerm
                | SourceError::UnrecognizedSource { .. }
                | SourceError::SourceNotLoaded { .. }
        )
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse {
                reason: err.to_string(),
            }
        } else {
            SourceError::Network {
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = SourceError::UnrecognizedSource {
            name: "bar".to_string(),
        };
        assert_eq!(err.to_string(), "bar is not a recognized source");

        let err = SourceError::SourceNotLoaded {
            source_name: "Rotten Tomatoes",
        };
        assert_eq!(
            err.to_string(),
            "The data for Rotten Tomatoes has not yet been loaded"
        );
        assert!(err.is_user_error());

        let err = SourceError::Network {
            reason: "reset".to_string(),
        };
        assert!(!err.is_user_error());
    }
}
