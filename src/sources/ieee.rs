//! IEEE Xplore research source implementation.
//!
//! Uses the IEEE Xplore API for searching and retrieving research papers.
//! API documentation: <https://developer.ieee.org/>

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::IeeeConfig;
use crate::models::{Article, ArticleBuilder, SearchQuery, SourceType, NOT_AVAILABLE};
use crate::sources::{FilterSupport, QueryDialect, Source, SourceError};
use crate::utils::{encode_query, HttpClient};

/// Body fragment IEEE sends with a 403 for keys that are not yet activated
const DEVELOPER_INACTIVE: &str = "Developer Inactive";

/// Error text for an inactive IEEE developer account
pub const INACTIVE_ACCOUNT_MESSAGE: &str =
    "IEEE API account is not yet active. Please check your account status.";

/// IEEE Xplore research source
///
/// API requires a free API key from https://developer.ieee.org/
#[derive(Debug, Clone)]
pub struct IeeeXploreSource {
    client: Arc<HttpClient>,
    config: IeeeConfig,
}

impl IeeeXploreSource {
    pub fn new(client: Arc<HttpClient>, config: IeeeConfig) -> Self {
        Self { client, config }
    }

    fn parse_response(body: &str) -> Result<Vec<Article>, SourceError> {
        let response: IeeeXploreResponse = serde_json::from_str(body)?;
        tracing::debug!(
            total_records = response.total_records.unwrap_or(0),
            "IEEE Xplore response"
        );
        Ok(response.articles.into_iter().map(Self::parse_result).collect())
    }

    fn parse_result(item: IeeeXploreArticle) -> Article {
        let authors = item
            .authors
            .map(|a| a.authors)
            .unwrap_or_default()
            .into_iter()
            .map(|author| {
                author
                    .full_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string())
            })
            .collect();

        ArticleBuilder::new(SourceType::IeeeXplore)
            .title(item.title)
            .authors(authors)
            .journal(item.publication_title)
            .pubdate(item.publication_year.as_ref().and_then(scalar_to_string))
            .id(item.article_number.as_ref().and_then(scalar_to_string))
            .abstract_text(item.abstract_text)
            .build()
    }
}

/// IEEE sends some fields as numbers in one record and strings in the next
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl QueryDialect for IeeeXploreSource {
    type Native = Vec<(&'static str, String)>;

    /// Structured query parameters, one key per filter. The API key is
    /// added at request time so translated queries are safe to log.
    fn translate(&self, query: &SearchQuery) -> Self::Native {
        let filters = &query.filters;
        let mut params = vec![
            ("format", "json".to_string()),
            ("max_records", query.max_results.to_string()),
            ("start_record", "1".to_string()),
            ("sort_order", "desc".to_string()),
            ("sort_field", "relevance".to_string()),
            ("querytext", query.query.clone()),
        ];

        if let Some(author) = &filters.author {
            params.push(("author", author.clone()));
        }
        if let Some(journal) = &filters.journal {
            params.push(("publication_title", journal.clone()));
        }
        if let Some(year_from) = &filters.year_from {
            params.push(("start_year", year_from.clone()));
        }
        if let Some(year_to) = &filters.year_to {
            params.push(("end_year", year_to.clone()));
        }

        params
    }
}

#[async_trait]
impl Source for IeeeXploreSource {
    fn id(&self) -> &str {
        SourceType::IeeeXplore.id()
    }

    fn name(&self) -> &str {
        SourceType::IeeeXplore.name()
    }

    fn supported_filters(&self) -> FilterSupport {
        FilterSupport::AUTHOR | FilterSupport::JOURNAL | FilterSupport::YEAR_RANGE
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>, SourceError> {
        if query.max_results == 0 {
            return Ok(Vec::new());
        }

        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            SourceError::MissingCredential("IEEE Xplore API key is not configured".to_string())
        })?;

        let params = self.translate(query);
        tracing::debug!(params = ?params, "IEEE Xplore search");

        let mut all_params = vec![("apikey", api_key.to_string())];
        all_params.extend(params);
        let url = format!("{}?{}", self.config.base_url, encode_query(&all_params));

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        if status == reqwest::StatusCode::FORBIDDEN {
            if body.contains(DEVELOPER_INACTIVE) {
                return Err(SourceError::AccountInactive(INACTIVE_ACCOUNT_MESSAGE.to_string()));
            }
            return Err(SourceError::Forbidden(body.trim().to_string()));
        }

        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "IEEE Xplore API returned status {}: {}",
                status,
                body.trim()
            )));
        }

        let articles = Self::parse_response(&body)?;
        tracing::debug!("IEEE Xplore returned {} articles", articles.len());
        Ok(articles)
    }
}

/// IEEE Xplore API response
#[derive(Debug, Deserialize)]
struct IeeeXploreResponse {
    total_records: Option<u64>,
    #[serde(default)]
    articles: Vec<IeeeXploreArticle>,
}

#[derive(Debug, Deserialize)]
struct IeeeXploreArticle {
    article_number: Option<Value>,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    publication_title: Option<String>,
    publication_year: Option<Value>,
    authors: Option<IeeeXploreAuthors>,
}

#[derive(Debug, Deserialize)]
struct IeeeXploreAuthors {
    #[serde(default)]
    authors: Vec<IeeeXploreAuthor>,
}

#[derive(Debug, Deserialize)]
struct IeeeXploreAuthor {
    full_name: Option<String>,
}
