//! Core data models for articles and search operations.

mod article;
mod search;

pub use article::{or_not_available, Article, ArticleBuilder, SourceType, NOT_AVAILABLE};
pub use search::{
    Filters, InvalidYear, RequestError, SearchQuery, SearchRequest, SearchResult, YearRange,
    DEFAULT_MAX_RESULTS,
};
