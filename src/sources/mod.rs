//! Source adapters with a trait-based architecture.
//!
//! Each adapter implements two traits:
//!
//! - [`QueryDialect`] translates the unified [`SearchQuery`] into the native
//!   request shape of one remote service (a boolean term string for PubMed,
//!   an `au:`-qualified query for arXiv, a parameter list for IEEE Xplore).
//! - [`Source`] performs the request and reduces the response to [`Article`]s.
//!
//! Every adapter reports through the same contract, `Result<Vec<Article>,
//! SourceError>`, so the aggregator has a single handling path.
//!
//! # Feature Flags
//!
//! Individual sources can be disabled at compile time using Cargo features:
//!
//! - `pubmed` - Enable PubMed source (default: enabled)
//! - `arxiv` - Enable arXiv source (default: enabled)
//! - `ieee` - Enable IEEE Xplore source (default: enabled)

#[cfg(feature = "source-arxiv")]
mod arxiv;
#[cfg(feature = "source-ieee")]
mod ieee;
#[cfg(feature = "source-pubmed")]
mod pubmed;
mod registry;

pub mod mock;

#[cfg(feature = "source-arxiv")]
pub use arxiv::ArxivSource;
#[cfg(feature = "source-ieee")]
pub use ieee::{IeeeXploreSource, INACTIVE_ACCOUNT_MESSAGE};
pub use mock::MockSource;
#[cfg(feature = "source-pubmed")]
pub use pubmed::PubMedSource;
pub use registry::{FilterSupport, Selection, SourceRegistry};

use crate::models::{Article, SearchQuery};
use async_trait::async_trait;

/// The Source trait defines the interface for all source adapters.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `Source` (and usually [`QueryDialect`])
/// 2. Declare the filters it understands in `supported_filters`
/// 3. Register it with the [`SourceRegistry`]
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Identifier used in request payloads (e.g. "pubmed", "arxiv")
    fn id(&self) -> &str;

    /// Human-readable name, used to prefix error messages
    fn name(&self) -> &str;

    /// Filters this source can express; the rest are dropped before `search`
    fn supported_filters(&self) -> FilterSupport {
        FilterSupport::empty()
    }

    /// Run one search. A `max_results` of zero yields no articles.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>, SourceError>;
}

/// Translation of the unified query into one service's native request shape.
pub trait QueryDialect {
    /// The native request representation
    type Native;

    fn translate(&self, query: &SearchQuery) -> Self::Native;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (XML, JSON, Atom)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),

    /// The account behind the API key has not been activated
    #[error("{0}")]
    AccountInactive(String),

    /// The service refused the credentials
    #[error("Access forbidden. Response content: {0}")]
    Forbidden(String),

    /// A credential the source requires was not configured
    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Network(format!("request timed out: {}", err))
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(err: quick_xml::DeError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}

impl From<crate::models::InvalidYear> for SourceError {
    fn from(err: crate::models::InvalidYear) -> Self {
        SourceError::InvalidRequest(err.to_string())
    }
}

/// Read a response body, mapping any non-2xx status to [`SourceError::Api`].
pub(crate) async fn success_body(
    response: reqwest::Response,
    service: &str,
) -> Result<String, SourceError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(SourceError::Api(format!(
            "{} API returned status {}: {}",
            service,
            status,
            body.trim()
        )));
    }

    Ok(body)
}
