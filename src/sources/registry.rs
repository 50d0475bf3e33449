//! Registry for managing source adapters.

use std::sync::Arc;

use super::{Source, SourceError};
use crate::config::AppConfig;
use crate::models::Filters;
use crate::utils::HttpClient;

bitflags::bitflags! {
    /// Filters that a source can express in its own dialect
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FilterSupport: u32 {
        const AUTHOR = 1 << 0;
        const JOURNAL = 1 << 1;
        const YEAR_RANGE = 1 << 2;
        const ARTICLE_TYPE = 1 << 3;
    }
}

impl FilterSupport {
    /// Keep only the filters in this set
    pub fn apply(&self, filters: &Filters) -> Filters {
        let keep = |flag: FilterSupport, value: &Option<String>| {
            if self.contains(flag) {
                value.clone()
            } else {
                None
            }
        };

        Filters {
            author: keep(FilterSupport::AUTHOR, &filters.author),
            journal: keep(FilterSupport::JOURNAL, &filters.journal),
            year_from: keep(FilterSupport::YEAR_RANGE, &filters.year_from),
            year_to: keep(FilterSupport::YEAR_RANGE, &filters.year_to),
            article_type: keep(FilterSupport::ARTICLE_TYPE, &filters.article_type),
        }
    }

    /// Lowercase filter names, for listings
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names()
            .map(|(name, _)| match name {
                "AUTHOR" => "author",
                "JOURNAL" => "journal",
                "YEAR_RANGE" => "year_range",
                "ARTICLE_TYPE" => "article_type",
                other => other,
            })
            .collect()
    }
}

/// Registry of the available sources, kept in processing order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

/// Sources picked by a request, plus the identifiers nothing matched.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub sources: Vec<Arc<dyn Source>>,
    pub unknown: Vec<String>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every compiled-in source, wired to `config`
    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        let client = Arc::new(HttpClient::new(&config.http)?);
        let mut registry = Self::new();

        #[cfg(feature = "source-pubmed")]
        registry.register(Arc::new(super::PubMedSource::new(
            Arc::clone(&client),
            config.pubmed.clone(),
        )));
        #[cfg(feature = "source-arxiv")]
        registry.register(Arc::new(super::ArxivSource::new(
            Arc::clone(&client),
            config.arxiv.clone(),
        )));
        #[cfg(feature = "source-ieee")]
        registry.register(Arc::new(super::IeeeXploreSource::new(
            Arc::clone(&client),
            config.ieee.clone(),
        )));

        Ok(registry)
    }

    /// Register a new source. A source with the same id is replaced in place.
    pub fn register(&mut self, source: Arc<dyn Source>) {
        match self.sources.iter_mut().find(|s| s.id() == source.id()) {
            Some(existing) => *existing = source,
            None => self.sources.push(source),
        }
    }

    /// Get a source by ID (case-insensitive)
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        let id = id.trim();
        self.sources.iter().find(|s| s.id().eq_ignore_ascii_case(id))
    }

    /// Get all registered sources in processing order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Get all source IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    /// Resolve requested identifiers.
    ///
    /// The result follows registry order, not request order, and names a
    /// source at most once.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Selection {
        let sources = self
            .sources
            .iter()
            .filter(|s| ids.iter().any(|id| s.id().eq_ignore_ascii_case(id.as_ref().trim())))
            .cloned()
            .collect();

        let mut unknown: Vec<String> = Vec::new();
        for id in ids {
            let id = id.as_ref().trim();
            if self.get(id).is_none() && !unknown.iter().any(|u| u == id) {
                unknown.push(id.to_string());
            }
        }

        Selection { sources, unknown }
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
