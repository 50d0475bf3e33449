//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::{Article, ArticleBuilder, SearchQuery, SourceType};
use crate::sources::{FilterSupport, Source, SourceError};

/// A mock source that returns a scripted outcome and records every query it receives.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    name: String,
    filters: FilterSupport,
    articles: Mutex<Vec<Article>>,
    failure: Mutex<Option<String>>,
    queries: Mutex<Vec<SearchQuery>>,
}

impl MockSource {
    /// Create a new mock source that understands every filter.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            filters: FilterSupport::all(),
            articles: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Restrict the filters this source claims to support.
    pub fn with_filters(mut self, filters: FilterSupport) -> Self {
        self.filters = filters;
        self
    }

    /// Set the articles to return. At most `max_results` are returned per call.
    pub fn set_articles(&self, articles: Vec<Article>) {
        *self.articles.lock().unwrap() = articles;
    }

    /// Make every search fail with [`SourceError::Network`] carrying `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn supported_filters(&self) -> FilterSupport {
        self.filters
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>, SourceError> {
        self.queries.lock().unwrap().push(query.clone());

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(SourceError::Network(message));
        }

        let articles = self.articles.lock().unwrap();
        Ok(articles.iter().take(query.max_results).cloned().collect())
    }
}

/// Helper function to create a mock article for testing.
pub fn make_article(id: &str, title: &str, source: SourceType) -> Article {
    ArticleBuilder::new(source)
        .id(id.to_string())
        .title(title.to_string())
        .build()
}
