//! Match selection: picks one candidate out of a provider's search results.
//!
//! Matching is exact. A candidate is chosen by year equality,
//! then by case- and whitespace-insensitive title equality, and otherwise the
//! first result is taken and flagged as low confidence.

use crate::candidate::{SearchCandidate, fields};

/// The single candidate chosen for a query, plus its confidence flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMatch {
    /// The chosen search result
    pub candidate: SearchCandidate,
    /// Set when the candidate was a fallback pick rather than a year or title match
    pub low_confidence: bool,
}

/// Title extractor used by the title pass.
pub type TitleFn = fn(&SearchCandidate) -> Option<String>;

/// Exact year comparison against a candidate's native year representation.
pub type YearMatchFn = fn(&SearchCandidate, i32) -> bool;

/// Score predicate for providers that prefer scored results.
pub type ScoredFn = fn(&SearchCandidate) -> bool;

/// Match-selection strategy parametrized per provider.
///
/// Each pass scans candidates in provider order and the first hit wins;
/// candidates are never re-sorted.
#[derive(Debug, Clone, Copy)]
pub struct MatchResolver {
    title_of: TitleFn,
    year_matches: YearMatchFn,
    is_scored: Option<ScoredFn>,
}

impl Default for MatchResolver {
    fn default() -> Self {
        Self::new(SearchCandidate::title, |candidate, year| {
            candidate.year_equals(fields::YEAR, year)
        })
    }
}

impl MatchResolver {
    /// Creates a resolver from a provider's title extractor and year comparison.
    pub fn new(title_of: TitleFn, year_matches: YearMatchFn) -> Self {
        Self {
            title_of,
            year_matches,
            is_scored: None,
        }
    }

    /// Requires a score for the title pass and prefers scored candidates on fallback.
    ///
    /// The year pass is unaffected.
    pub fn with_score_requirement(mut self, is_scored: ScoredFn) -> Self {
        self.is_scored = Some(is_scored);
        self
    }

    /// Selects one candidate, or `None` when there are no candidates.
    ///
    /// 1. With `raw_year`, the first candidate whose year equals it exactly.
    /// 2. With `raw_title`, the first candidate whose trimmed, lowercased title
    ///    equals the trimmed, lowercased `raw_title`.
    /// 3. Otherwise the first candidate (first scored one, for scored
    ///    resolvers), flagged `low_confidence`.
    pub fn resolve(
        &self,
        candidates: Vec<SearchCandidate>,
        raw_title: Option<&str>,
        raw_year: Option<i32>,
    ) -> Option<ResolvedMatch> {
        if candidates.is_empty() {
            return None;
        }

        let (index, low_confidence) = self.select_index(&candidates, raw_title, raw_year);
        let candidate = candidates.into_iter().nth(index)?;

        tracing::debug!(
            "resolve: picked index={index} title={:?} low_confidence={low_confidence}",
            (self.title_of)(&candidate)
        );

        Some(ResolvedMatch {
            candidate,
            low_confidence,
        })
    }

    fn select_index(
        &self,
        candidates: &[SearchCandidate],
        raw_title: Option<&str>,
        raw_year: Option<i32>,
    ) -> (usize, bool) {
        if let Some(year) = raw_year
            && let Some(index) = candidates
                .iter()
                .position(|candidate| (self.year_matches)(candidate, year))
        {
            return (index, false);
        }

        if let Some(title) = raw_title {
            let wanted = normalize_title(title);
            let title_hit = candidates.iter().position(|candidate| {
                self.has_required_score(candidate)
                    && (self.title_of)(candidate).is_some_and(|t| normalize_title(&t) == wanted)
            });
            if let Some(index) = title_hit {
                return (index, false);
            }
        }

        let fallback = match self.is_scored {
            Some(is_scored) => candidates.iter().position(is_scored).unwrap_or(0),
            None => 0,
        };
        (fallback, true)
    }

    fn has_required_score(&self, candidate: &SearchCandidate) -> bool {
        self.is_scored.is_none_or(|is_scored| is_scored(candidate))
    }
}

/// Lowercases and trims a title for comparison.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn titled(title: &str) -> SearchCandidate {
        SearchCandidate::new().with(fields::TITLE, title)
    }

    fn dated(title: &str, year: i32) -> SearchCandidate {
        titled(title).with(fields::YEAR, year)
    }

    fn scored(title: &str, score: &str) -> SearchCandidate {
        titled(title).with(fields::SCORE, score)
    }

    fn scored_resolver() -> MatchResolver {
        MatchResolver::default().with_score_requirement(|c| c.is_truthy(fields::SCORE))
    }

    #[test]
    fn test_empty_candidates() {
        let resolver = MatchResolver::default();
        assert!(resolver.resolve(Vec::new(), Some("Alien"), Some(1979)).is_none());
    }

    #[test]
    fn test_exact_title_match() {
        let resolved = MatchResolver::default()
            .resolve(
                vec![titled("A Movie"), titled("The Movie")],
                Some("The Movie"),
                None,
            )
            .unwrap();

        assert_eq!(resolved.candidate.title().as_deref(), Some("The Movie"));
        assert!(!resolved.low_confidence);
    }

    #[test]
    fn test_title_match_ignores_case_and_whitespace() {
        let resolved = MatchResolver::default()
            .resolve(
                vec![titled("A Movie"), titled("  The MOVIE ")],
                Some(" the movie  "),
                None,
            )
            .unwrap();

        assert_eq!(resolved.candidate.title().as_deref(), Some("  The MOVIE "));
        assert!(!resolved.low_confidence);
    }

    #[test]
    fn test_no_match_falls_back_to_first() {
        let resolved = MatchResolver::default()
            .resolve(
                vec![titled("A Movie"), titled("Another Movie")],
                Some("The Movie"),
                None,
            )
            .unwrap();

        assert_eq!(resolved.candidate.title().as_deref(), Some("A Movie"));
        assert!(resolved.low_confidence);
    }

    #[test]
    fn test_year_match_beats_first_title_match() {
        let resolved = MatchResolver::default()
            .resolve(
                vec![dated("Dune", 2021), dated("Dune", 1984)],
                Some("Dune"),
                Some(1984),
            )
            .unwrap();

        assert_eq!(resolved.candidate.integer(fields::YEAR), Some(1984));
        assert!(!resolved.low_confidence);
    }

    #[test]
    fn test_year_miss_uses_title_pass() {
        let resolved = MatchResolver::default()
            .resolve(
                vec![dated("Dune Drifter", 2020), dated("Dune", 2021)],
                Some("Dune"),
                Some(1965),
            )
            .unwrap();

        assert_eq!(resolved.candidate.title().as_deref(), Some("Dune"));
        assert!(!resolved.low_confidence);
    }

    #[test]
    fn test_id_only_query_skips_title_pass() {
        let resolved = MatchResolver::default()
            .resolve(vec![dated("Alien", 1979), dated("Aliens", 1986)], None, Some(2000))
            .unwrap();

        assert_eq!(resolved.candidate.title().as_deref(), Some("Alien"));
        assert!(resolved.low_confidence);
    }

    #[test]
    fn test_scored_title_match_requires_score() {
        let resolved = scored_resolver()
            .resolve(
                vec![
                    scored("The Matrix", ""),
                    scored("The Matrix Reloaded", "74"),
                    scored("The Matrix", "88"),
                ],
                Some("The Matrix"),
                None,
            )
            .unwrap();

        assert_eq!(resolved.candidate.text(fields::SCORE).as_deref(), Some("88"));
        assert!(!resolved.low_confidence);
    }

    #[test]
    fn test_scored_fallback_prefers_first_scored() {
        let resolved = scored_resolver()
            .resolve(
                vec![
                    titled("The Matrix Experiment"),
                    scored("The Matrix Resurrections", "63"),
                    scored("The Matrix", "88"),
                ],
                Some("blort"),
                None,
            )
            .unwrap();

        assert_eq!(
            resolved.candidate.title().as_deref(),
            Some("The Matrix Resurrections")
        );
        assert!(resolved.low_confidence);
    }

    #[test]
    fn test_scored_fallback_without_any_score() {
        let resolved = scored_resolver()
            .resolve(vec![titled("One"), titled("Two")], Some("Three"), None)
            .unwrap();

        assert_eq!(resolved.candidate.title().as_deref(), Some("One"));
        assert!(resolved.low_confidence);
    }

    proptest! {
        #[test]
        fn prop_year_match_found_at_any_position(len in 1usize..12, pick in 0usize..12) {
            let target = pick % len;
            let candidates: Vec<_> = (0..len)
                .map(|i| dated(&format!("Movie {i}"), 1900 + i as i32))
                .collect();

            let resolved = MatchResolver::default()
                .resolve(candidates, Some("Unrelated"), Some(1900 + target as i32))
                .unwrap();

            let expected = format!("Movie {target}");
            prop_assert_eq!(resolved.candidate.title(), Some(expected));
            prop_assert!(!resolved.low_confidence);
        }

        #[test]
        fn prop_unmatched_query_picks_first(len in 1usize..12) {
            let candidates: Vec<_> = (0..len)
                .map(|i| dated(&format!("Movie {i}"), 1900 + i as i32))
                .collect();

            let resolved = MatchResolver::default()
                .resolve(candidates, Some("Nothing Like It"), Some(2500))
                .unwrap();

            prop_assert_eq!(resolved.candidate.title(), Some("Movie 0".to_string()));
            prop_assert!(resolved.low_confidence);
        }
    }
}
