//! Article model: the one record shape every source is reduced to.

use serde::{Deserialize, Serialize};

/// Placeholder for any field a source did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

/// The source an article was retrieved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "PubMed")]
    PubMed,
    #[serde(rename = "arXiv")]
    Arxiv,
    #[serde(rename = "IEEE Xplore")]
    IeeeXplore,
}

impl SourceType {
    /// Every source, in processing order.
    pub const ALL: [SourceType; 3] = [SourceType::PubMed, SourceType::Arxiv, SourceType::IeeeXplore];

    /// Returns the display name of the source (also the provenance tag on articles)
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::PubMed => "PubMed",
            SourceType::Arxiv => "arXiv",
            SourceType::IeeeXplore => "IEEE Xplore",
        }
    }

    /// Returns the source identifier used in request payloads
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::PubMed => "pubmed",
            SourceType::Arxiv => "arxiv",
            SourceType::IeeeXplore => "ieee",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A publication as returned by one source.
///
/// Scalar fields are never empty: anything the source left out reads
/// [`NOT_AVAILABLE`]. The same work found by two sources yields two articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Article title
    pub title: String,

    /// Author names in source order
    pub authors: Vec<String>,

    /// Journal, proceedings or repository name
    pub journal: String,

    /// Publication date at whatever granularity the source offers
    pub pubdate: String,

    /// Source-native identifier (PMID, arXiv entry URL, IEEE article number)
    #[serde(rename = "pmid")]
    pub id: String,

    /// Abstract text
    pub r#abstract: String,

    /// Source the article came from
    pub source: SourceType,
}

impl Article {
    /// Create an article with every scalar field set to [`NOT_AVAILABLE`]
    pub fn new(source: SourceType) -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            authors: Vec::new(),
            journal: NOT_AVAILABLE.to_string(),
            pubdate: NOT_AVAILABLE.to_string(),
            id: NOT_AVAILABLE.to_string(),
            r#abstract: NOT_AVAILABLE.to_string(),
            source,
        }
    }
}

/// Builder for constructing Article objects
///
/// Every setter takes an optional value; `None` and blank strings leave the
/// field at [`NOT_AVAILABLE`].
#[derive(Debug, Clone)]
pub struct ArticleBuilder {
    article: Article,
}

impl ArticleBuilder {
    pub fn new(source: SourceType) -> Self {
        Self {
            article: Article::new(source),
        }
    }

    pub fn title(mut self, title: impl Into<Option<String>>) -> Self {
        self.article.title = or_not_available(title.into());
        self
    }

    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.article.authors = authors;
        self
    }

    pub fn journal(mut self, journal: impl Into<Option<String>>) -> Self {
        self.article.journal = or_not_available(journal.into());
        self
    }

    pub fn pubdate(mut self, pubdate: impl Into<Option<String>>) -> Self {
        self.article.pubdate = or_not_available(pubdate.into());
        self
    }

    pub fn id(mut self, id: impl Into<Option<String>>) -> Self {
        self.article.id = or_not_available(id.into());
        self
    }

    pub fn abstract_text(mut self, abstract_text: impl Into<Option<String>>) -> Self {
        self.article.r#abstract = or_not_available(abstract_text.into());
        self
    }

    pub fn build(self) -> Article {
        self.article
    }
}

/// Trim a value, substituting [`NOT_AVAILABLE`] when it is missing or blank.
pub fn or_not_available(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
