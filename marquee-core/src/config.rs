//! Centralized configuration for Marquee.
//!
//! All tunable parameters and provider settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::time::Duration;

/// Environment variable holding the TMDB API key.
pub const TMDB_API_KEY_ENV: &str = "TMDB_API_KEY";

/// Environment variable holding the OMDb API key.
pub const OMDB_API_KEY_ENV: &str = "OMDB_API_KEY";

/// Environment variable overriding the HTTP request timeout, in seconds.
pub const HTTP_TIMEOUT_ENV: &str = "MARQUEE_HTTP_TIMEOUT_SECS";

/// Central configuration for all Marquee components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct MarqueeConfig {
    pub http: HttpConfig,
    pub api_keys: ApiKeyConfig,
    pub endpoints: EndpointConfig,
}

/// HTTP client behaviour shared by every provider session.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// User agent sent with every request
    pub user_agent: String,
    /// Whole-request timeout
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            // Review sites reject unknown agents
            user_agent: "Mozilla/5.0".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Credentials for the providers that require them.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyConfig {
    /// TMDB API key, required before any TMDB request
    pub tmdb: Option<String>,
    /// OMDb API key, required before any IMDb request
    pub omdb: Option<String>,
}

impl ApiKeyConfig {
    /// Returns the TMDB key, preferring an explicit argument over the configured one.
    ///
    /// Blank keys are treated as missing.
    pub fn resolve_tmdb(&self, explicit: Option<String>) -> Option<String> {
        non_blank(explicit).or_else(|| non_blank(self.tmdb.clone()))
    }
}

/// Base URLs for each provider. Overridable so tests can point at local servers.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub omdb_base_url: String,
    pub tmdb_base_url: String,
    pub metacritic_base_url: String,
    pub rotten_tomatoes_base_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            omdb_base_url: "https://www.omdbapi.com".to_string(),
            tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
            metacritic_base_url: "https://www.metacritic.com".to_string(),
            rotten_tomatoes_base_url: "https://www.rottentomatoes.com".to_string(),
        }
    }
}

impl MarqueeConfig {
    /// Builds configuration from defaults plus process environment overrides.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from defaults plus overrides read through `lookup`.
    ///
    /// Invalid timeout values are ignored and logged.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.api_keys.tmdb = non_blank(lookup(TMDB_API_KEY_ENV));
        config.api_keys.omdb = non_blank(lookup(OMDB_API_KEY_ENV));

        if let Some(raw) = lookup(HTTP_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.http.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!("Ignoring invalid {HTTP_TIMEOUT_ENV} value: {raw:?}"),
            }
        }

        config
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
