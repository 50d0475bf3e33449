//! # Scholar Aggregator
//!
//! Searches PubMed, arXiv and IEEE Xplore with one query and returns one
//! normalized article list, with a per-source error list alongside.
//!
//! ## Architecture
//!
//! - [`models`]: Core data structures (Article, SearchRequest, SearchResult)
//! - [`sources`]: Source adapters behind the [`Source`] and [`sources::QueryDialect`] traits
//! - [`aggregator`]: Quota split, sequential dispatch and failure isolation
//! - [`server`]: HTTP endpoint
//! - [`utils`]: HTTP client and terminal rendering
//! - [`config`]: Configuration management

pub mod aggregator;
pub mod config;
pub mod models;
pub mod server;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use aggregator::{AggregateError, Aggregator};
pub use models::{Article, SearchRequest, SearchResult};
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
