//! Rotten Tomatoes search-page scraper.

use async_trait::async_trait;
use scraper::Html;

use super::metacritic::{element_text, selector};
use super::{MovieSearchProvider, SearchQuery};
use crate::candidate::{SearchCandidate, fields};
use crate::errors::SourceError;
use crate::session::Session;

const PROVIDER: &str = "Rotten Tomatoes";

/// Scrapes Rotten Tomatoes search results.
///
/// Year and tomatometer score are kept as the strings found in the page
/// attributes; a movie without reviews has an empty score.
#[derive(Debug, Clone)]
pub struct RottenTomatoesClient {
    base_url: String,
}

impl RottenTomatoesClient {
    /// Creates a scraper for the site at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn search_url(&self, title: &str) -> String {
        format!(
            "{}/search?search={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(title)
        )
    }
}

#[async_trait]
impl MovieSearchProvider for RottenTomatoesClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<Vec<SearchCandidate>, SourceError> {
        let url = self.search_url(&query.title);
        tracing::debug!("Fetching Rotten Tomatoes search page: {url}");

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

/// Parses `search-page-media-row` elements into candidates, in page order.
///
/// # Errors
///
/// - `SourceError::Parse` - If a CSS selector fails to compile
pub fn parse_search_page(html: &str) -> Result<Vec<SearchCandidate>, SourceError> {
    let document = Html::parse_document(html);
    let row_selector = selector("search-page-media-row")?;
    let link_selector = selector("a")?;

    let candidates = document
        .select(&row_selector)
        .filter_map(|row| {
            // The last link holds the title; the first wraps the poster.
            let link = row.select(&link_selector).last()?;
            let mut candidate = SearchCandidate::new().with(fields::TITLE, element_text(link));

            if let Some(href) = link.value().attr("href") {
                candidate.insert(fields::URL, href);
            }
            let attrs = row.value();
            candidate.insert(fields::YEAR, attrs.attr("releaseyear").unwrap_or_default());
            candidate.insert(
                fields::SCORE,
                attrs.attr("tomatometerscore").unwrap_or_default(),
            );
            Some(candidate)
        })
        .collect();

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body><search-page-result type="movie"><ul>
          <search-page-media-row releaseyear="2021" tomatometerscore="63" tomatometerstate="rotten">
            <a href="https://www.rottentomatoes.com/m/the_matrix_resurrections" slot="thumbnail"><img alt="poster"></a>
            <a href="https://www.rottentomatoes.com/m/the_matrix_resurrections" slot="title"> The Matrix Resurrections </a>
          </search-page-media-row>
          <search-page-media-row releaseyear="1999" tomatometerscore="88">
            <a href="https://www.rottentomatoes.com/m/matrix" slot="thumbnail"><img alt="poster"></a>
            <a href="https://www.rottentomatoes.com/m/matrix" slot="title">The Matrix</a>
          </search-page-media-row>
          <search-page-media-row releaseyear="" tomatometerscore="">
            <a href="https://www.rottentomatoes.com/m/matrix_fan_cut" slot="title">The Matrix Fan Cut</a>
          </search-page-media-row>
        </ul></search-page-result></body></html>
    "#;

    #[test]
    fn test_parse_search_page() {
        let candidates = parse_search_page(RESULTS_PAGE).unwrap();

        assert_eq!(candidates.len(), 3);
        assert_eq!(
            candidates[0].title().as_deref(),
            Some("The Matrix Resurrections")
        );
        assert_eq!(candidates[1].text(fields::YEAR).as_deref(), Some("1999"));
        assert_eq!(candidates[1].text(fields::SCORE).as_deref(), Some("88"));
        assert_eq!(
            candidates[1].text(fields::URL).as_deref(),
            Some("https://www.rottentomatoes.com/m/matrix")
        );
        assert!(!candidates[2].is_truthy(fields::SCORE));
    }

    #[test]
    fn test_search_url_is_encoded() {
        let client = RottenTomatoesClient::new("https://www.rottentomatoes.com");
        assert_eq!(
            client.search_url("The Matrix"),
            "https://www.rottentomatoes.com/search?search=The%20Matrix"
        );
    }
}
