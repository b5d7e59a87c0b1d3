//! Search candidates: the raw, provider-specific records returned by a search.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names shared by the provider clients when building candidates.
pub mod fields {
    /// Movie title.
    pub const TITLE: &str = "title";
    /// Release year, a number or a string depending on the provider.
    pub const YEAR: &str = "year";
    /// Provider id of the movie.
    pub const ID: &str = "id";
    /// Media kind, e.g. `movie` or `series`.
    pub const KIND: &str = "kind";
    /// List of genres.
    pub const GENRES: &str = "genres";
    /// List of cast members.
    pub const CAST: &str = "cast";
    /// List of directors.
    pub const DIRECTORS: &str = "directors";
    /// Runtime in minutes.
    pub const RUNTIME: &str = "runtime";
    /// Provider rating.
    pub const RATING: &str = "rating";
    /// Critic score.
    pub const SCORE: &str = "score";
    /// Plot summary.
    pub const PLOT: &str = "plot";
    /// Free-text line under a scraped result.
    pub const SUBTITLE: &str = "subtitle";
    /// Link to the movie page.
    pub const URL: &str = "url";
    /// Poster image URL.
    pub const COVER_URL: &str = "cover_url";
}

/// One raw search result from a provider, not yet chosen as the match.
///
/// A mapping of field name to JSON value. Values keep the provider's native
/// representation: a year scraped from HTML stays a string, a year from a
/// JSON API stays a number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchCandidate(Map<String, Value>);

impl SearchCandidate {
    /// Creates an empty candidate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, replacing any previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Raw JSON value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `key` is present and not null.
    pub fn contains(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }

    /// The underlying field map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Title field, as stored.
    pub fn title(&self) -> Option<String> {
        self.text(fields::TITLE)
    }

    /// Reads a scalar as text. Numbers are rendered, empty strings are `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Reads an integer from a number or a numeric string.
    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Reads a float from a number or a numeric string.
    pub fn float(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Reads up to `limit` strings from an array field. Non-string items are skipped.
    pub fn string_list(&self, key: &str, limit: usize) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .take(limit)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Exact year equality against the native representation.
    ///
    /// Integers compare numerically; strings must equal the decimal rendering
    /// of `year`. No tolerance window.
    pub fn year_equals(&self, key: &str, year: i32) -> bool {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.as_i64() == Some(i64::from(year)),
            Some(Value::String(s)) => s.trim() == year.to_string(),
            _ => false,
        }
    }

    /// Truthiness of a field: non-empty string, non-zero number or `true`.
    pub fn is_truthy(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::Bool(b)) => *b,
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Null) | None => false,
        }
    }
}

impl From<Map<String, Value>> for SearchCandidate {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
