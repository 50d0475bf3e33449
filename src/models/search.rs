//! Search request and response models.
//!
//! [`SearchRequest`] is the inbound payload as a client sends it; the
//! aggregator splits it into one [`SearchQuery`] per selected source and
//! folds the outcomes into a [`SearchResult`].

use serde::{Deserialize, Serialize};

use super::{Article, SourceType};

/// Result budget used when a request does not name one
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Optional filters shared by all sources.
///
/// Blank values are normalized to `None` when deserialized, so a present
/// filter is always a non-empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Author name
    #[serde(default, deserialize_with = "de::optional_text", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Journal or publication title
    #[serde(default, deserialize_with = "de::optional_text", skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,

    /// Earliest publication year (inclusive)
    #[serde(default, deserialize_with = "de::optional_text", skip_serializing_if = "Option::is_none")]
    pub year_from: Option<String>,

    /// Latest publication year (inclusive)
    #[serde(default, deserialize_with = "de::optional_text", skip_serializing_if = "Option::is_none")]
    pub year_to: Option<String>,

    /// Publication type, e.g. "Review" or "Clinical Trial"
    #[serde(default, deserialize_with = "de::optional_text", skip_serializing_if = "Option::is_none")]
    pub article_type: Option<String>,
}

impl Filters {
    /// Trim every value and unset the blank ones, as payload decoding does
    pub fn normalized(self) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            author: clean(self.author),
            journal: clean(self.journal),
            year_from: clean(self.year_from),
            year_to: clean(self.year_to),
            article_type: clean(self.article_type),
        }
    }

    /// True when no filter is set
    pub fn is_empty(&self) -> bool {
        self.author.is_none()
            && self.journal.is_none()
            && self.year_from.is_none()
            && self.year_to.is_none()
            && self.article_type.is_none()
    }
}

/// The query one source adapter receives: text, its quota and the filters it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text search terms, passed through unmodified
    pub query: String,

    /// Maximum number of results to request from the source
    pub max_results: usize,

    /// Filters to translate into the source's dialect
    pub filters: Filters,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: DEFAULT_MAX_RESULTS,
            filters: Filters::default(),
        }
    }
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Replace all filters
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Set author filter
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.filters.author = Some(author.into());
        self
    }

    /// Set journal filter
    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.filters.journal = Some(journal.into());
        self
    }

    /// Set the lower year bound
    pub fn year_from(mut self, year: impl Into<String>) -> Self {
        self.filters.year_from = Some(year.into());
        self
    }

    /// Set the upper year bound
    pub fn year_to(mut self, year: impl Into<String>) -> Self {
        self.filters.year_to = Some(year.into());
        self
    }

    /// Set article type filter
    pub fn article_type(mut self, article_type: impl Into<String>) -> Self {
        self.filters.article_type = Some(article_type.into());
        self
    }
}

/// Inbound search payload.
///
/// Every field is optional on the wire: `query` defaults to the empty string,
/// `max_results` to [`DEFAULT_MAX_RESULTS`] (a numeric string is accepted),
/// `sources` to every known source and each filter to unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default, deserialize_with = "de::text")]
    pub query: String,

    #[serde(default = "default_max_results", deserialize_with = "de::max_results")]
    pub max_results: usize,

    #[serde(default = "default_sources", deserialize_with = "de::sources")]
    pub sources: Vec<String>,

    #[serde(flatten)]
    pub filters: Filters,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: DEFAULT_MAX_RESULTS,
            sources: default_sources(),
            filters: Filters::default(),
        }
    }
}

impl SearchRequest {
    /// Create a request for `query` against every source
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Parse a raw request body; it must be UTF-8
    pub fn from_bytes(body: &[u8]) -> Result<Self, RequestError> {
        Self::from_json(std::str::from_utf8(body)?)
    }

    /// Parse a JSON payload. An empty body is treated as `{}`.
    pub fn from_json(body: &str) -> Result<Self, RequestError> {
        if body.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(body)?)
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Select the sources to query
    pub fn sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_sources() -> Vec<String> {
    SourceType::ALL.iter().map(|s| s.id().to_string()).collect()
}

/// Errors raised while parsing an inbound payload
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid request payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid request payload: body is not UTF-8 ({0})")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Combined outcome of one aggregated search.
///
/// `articles` keeps source-processing order; `errors` holds one line per
/// source that failed. A failure never removes articles already collected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub articles: Vec<Article>,
    pub errors: Vec<String>,
}

impl SearchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when at least one source failed
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Inclusive publication-year window used for client-side filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearRange {
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl YearRange {
    /// Parse the year bounds of a filter set
    pub fn from_filters(filters: &Filters) -> Result<Self, InvalidYear> {
        Ok(Self {
            from: parse_year("year_from", filters.year_from.as_deref())?,
            to: parse_year("year_to", filters.year_to.as_deref())?,
        })
    }

    /// True when neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether `year` falls inside the window
    pub fn contains(&self, year: i32) -> bool {
        self.from.map_or(true, |from| year >= from) && self.to.map_or(true, |to| year <= to)
    }
}

fn parse_year(field: &'static str, value: Option<&str>) -> Result<Option<i32>, InvalidYear> {
    value
        .map(|v| {
            v.trim().parse::<i32>().map_err(|_| InvalidYear {
                field,
                value: v.to_string(),
            })
        })
        .transpose()
}

/// A year filter that is not an integer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} must be a year, got '{value}'")]
pub struct InvalidYear {
    pub field: &'static str,
    pub value: String,
}

/// Lenient field decoders for the inbound payload.
mod de {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(optional_text(deserializer)?.unwrap_or_default())
    }

    /// Strings and numbers are accepted; null and blank strings become `None`.
    pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(D::Error::custom(format!(
                "expected a string or number, got {}",
                other
            ))),
        }
    }

    pub fn max_results<'de, D>(deserializer: D) -> Result<usize, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(super::DEFAULT_MAX_RESULTS),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    D::Error::custom(format!("max_results must be a non-negative integer, got {}", n))
                }),
            Some(Value::String(s)) => s.trim().parse::<usize>().map_err(|_| {
                D::Error::custom(format!("max_results must be a non-negative integer, got '{}'", s))
            }),
            Some(other) => Err(D::Error::custom(format!(
                "max_results must be a non-negative integer, got {}",
                other
            ))),
        }
    }

    pub fn sources<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_else(super::default_sources))
    }
}
