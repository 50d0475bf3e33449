//! Multi-source aggregation.
//!
//! The aggregator divides the requested result budget by the number of
//! identifiers the request lists, runs each matching source once in registry
//! order and folds the outcomes into one [`SearchResult`]. A failing source
//! contributes an error line and never stops the sources after it.

use std::sync::Arc;

use crate::models::{SearchQuery, SearchRequest, SearchResult};
use crate::sources::{Source, SourceRegistry};

/// Errors that reject a request before any source is contacted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("No sources selected: choose at least one of {0}")]
    NoSourcesSelected(String),
}

/// Per-source share of the requested result count, rounded down.
///
/// `listed` is the length of the request's source list. Returns `None` when
/// the list is empty.
pub fn per_source_quota(max_results: usize, listed: usize) -> Option<usize> {
    max_results.checked_div(listed)
}

/// Fans one request out to the registered sources
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: Arc<SourceRegistry>,
}

impl Aggregator {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Run `request` against every selected source, one after another.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, AggregateError> {
        let selection = self.registry.select(request.sources.as_slice());

        // every listed identifier counts, repeated or unknown ones included
        let quota = per_source_quota(request.max_results, request.sources.len())
            .ok_or_else(|| {
                AggregateError::NoSourcesSelected(self.registry.ids().collect::<Vec<_>>().join(", "))
            })?;

        tracing::info!(
            query = %request.query,
            sources = selection.sources.len(),
            quota,
            "Aggregated search"
        );

        let mut result = SearchResult::new();

        for id in &selection.unknown {
            tracing::warn!("Ignoring unknown source '{}'", id);
            result.errors.push(format!("Unknown source: {}", id));
        }

        for source in &selection.sources {
            match run_source(source.as_ref(), request, quota).await {
                Ok(articles) => result.articles.extend(articles),
                Err(message) => result.errors.push(message),
            }
        }

        Ok(result)
    }
}

/// Query one source, turning a failure into a line naming the source.
async fn run_source(
    source: &dyn Source,
    request: &SearchRequest,
    quota: usize,
) -> Result<Vec<crate::models::Article>, String> {
    let query = SearchQuery::new(request.query.clone())
        .max_results(quota)
        .filters(source.supported_filters().apply(&request.filters));

    match source.search(&query).await {
        Ok(articles) => {
            tracing::debug!("{} returned {} articles", source.name(), articles.len());
            Ok(articles)
        }
        Err(e) => {
            tracing::warn!("{} search failed: {}", source.name(), e);
            Err(format!("{} search error: {}", source.name(), e))
        }
    }
}
