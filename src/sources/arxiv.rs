//! arXiv research source implementation.

use async_trait::async_trait;
use chrono::Datelike;
use feed_rs::parser;
use std::sync::Arc;

use crate::config::ArxivConfig;
use crate::models::{Article, ArticleBuilder, SearchQuery, SourceType, YearRange};
use crate::sources::{success_body, FilterSupport, QueryDialect, Source, SourceError};
use crate::utils::{encode_query, HttpClient};

/// arXiv research source
///
/// The API has no publication-year filter, so year bounds are applied to
/// the returned entries. A search can therefore yield fewer than
/// `max_results` articles.
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    config: ArxivConfig,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new(client: Arc<HttpClient>, config: ArxivConfig) -> Self {
        Self { client, config }
    }

    fn build_url(&self, search_query: &str, max_results: usize) -> String {
        let params = [
            ("search_query", search_query.to_string()),
            ("start", "0".to_string()),
            ("max_results", max_results.to_string()),
            ("sortBy", "relevance".to_string()),
            ("sortOrder", "descending".to_string()),
        ];
        format!("{}?{}", self.config.base_url, encode_query(&params))
    }

    /// Parse an Atom feed, keeping entries published inside `years`
    fn parse_feed(bytes: &[u8], years: YearRange) -> Result<Vec<Article>, SourceError> {
        let feed = parser::parse(bytes)
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        let articles = feed
            .entries
            .iter()
            .filter(|entry| match entry.published {
                Some(published) => years.contains(published.year()),
                None => years.is_unbounded(),
            })
            .map(Self::parse_entry)
            .collect();

        Ok(articles)
    }

    /// Parse arXiv Atom feed entry into Article
    fn parse_entry(entry: &feed_rs::model::Entry) -> Article {
        let title = entry.title.as_ref().map(|t| collapse_whitespace(&t.content));

        let authors = entry
            .authors
            .iter()
            .map(|a| collapse_whitespace(&a.name))
            .filter(|name| !name.is_empty())
            .collect();

        let abstract_text = entry.summary.as_ref().map(|s| s.content.trim().to_string());
        let pubdate = entry.published.map(|d| d.format("%Y-%m-%d").to_string());

        ArticleBuilder::new(SourceType::Arxiv)
            .title(title)
            .authors(authors)
            .journal("arXiv".to_string())
            .pubdate(pubdate)
            .id(entry.id.clone())
            .abstract_text(abstract_text)
            .build()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl QueryDialect for ArxivSource {
    type Native = String;

    /// Free text with an `au:` clause appended when an author is given
    fn translate(&self, query: &SearchQuery) -> String {
        match (&query.filters.author, query.query.trim().is_empty()) {
            (Some(author), true) => format!("au:{}", author),
            (Some(author), false) => format!("{} AND au:{}", query.query, author),
            (None, _) => query.query.clone(),
        }
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        SourceType::Arxiv.id()
    }

    fn name(&self) -> &str {
        SourceType::Arxiv.name()
    }

    fn supported_filters(&self) -> FilterSupport {
        FilterSupport::AUTHOR | FilterSupport::YEAR_RANGE
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>, SourceError> {
        let years = YearRange::from_filters(&query.filters)?;

        if query.max_results == 0 {
            return Ok(Vec::new());
        }

        let search_query = self.translate(query);
        let url = self.build_url(&search_query, query.max_results);
        tracing::debug!(url = %url, "arXiv search");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/atom+xml")
            .send()
            .await?;
        let body = success_body(response, "arXiv").await?;

        let articles = Self::parse_feed(body.as_bytes(), years)?;
        tracing::debug!("arXiv returned {} articles after year filter", articles.len());
        Ok(articles)
    }
}
