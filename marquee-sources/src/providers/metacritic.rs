//! Metacritic search-page scraper.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use super::{MovieSearchProvider, SearchQuery};
use crate::candidate::{SearchCandidate, fields};
use crate::errors::SourceError;
use crate::session::Session;

const PROVIDER: &str = "Metacritic";

/// Scrapes Metacritic's movie search results.
///
/// Candidates carry `title`, `url`, a free-text `subtitle` (which contains the
/// release year somewhere) and the metascore as a string `rating`.
#[derive(Debug, Clone)]
pub struct MetacriticClient {
    base_url: String,
}

impl MetacriticClient {
    /// Creates a scraper for the site at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn search_url(&self, title: &str) -> String {
        format!(
            "{}/search/movie/{}/results",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(title)
        )
    }
}

#[async_trait]
impl MovieSearchProvider for MetacriticClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<Vec<SearchCandidate>, SourceError> {
        let url = self.search_url(&query.title);
        tracing::debug!("Fetching Metacritic search page: {url}");

        let response = session.client().get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Provider {
                provider: PROVIDER,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let html = response.text().await?;
        parse_search_page(&html)
    }
}

/// Parses a search results page into candidates, in page order.
///
/// # Errors
///
/// - `SourceError::Parse` - If a CSS selector fails to compile
pub fn parse_search_page(html: &str) -> Result<Vec<SearchCandidate>, SourceError> {
    let document = Html::parse_document(html);
    let result_selector = selector("li.result")?;
    let link_selector = selector("a")?;
    let subtitle_selector = selector("p")?;
    let score_selector = selector("span.metascore_w")?;

    let candidates = document
        .select(&result_selector)
        .filter_map(|result| {
            let link = result.select(&link_selector).next()?;
            let mut candidate = SearchCandidate::new().with(fields::TITLE, element_text(link));

            if let Some(href) = link.value().attr("href") {
                candidate.insert(fields::URL, href);
            }
            if let Some(subtitle) = result.select(&subtitle_selector).next() {
                candidate.insert(fields::SUBTITLE, element_text(subtitle));
            }
            if let Some(score) = result.select(&score_selector).next() {
                candidate.insert(fields::RATING, element_text(score));
            }
            Some(candidate)
        })
        .collect();

    Ok(candidates)
}

pub(crate) fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse {
        reason: format!("invalid selector {css:?}: {e}"),
    })
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
