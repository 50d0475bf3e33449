//! PubMed research source implementation using E-utilities API.
//!
//! A search is two calls: `esearch` resolves the boolean term to at most
//! `max_results` PMIDs, `efetch` returns the full records for those PMIDs.

use async_trait::async_trait;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::PubMedConfig;
use crate::models::{Article, ArticleBuilder, SearchQuery, SourceType};
use crate::sources::{success_body, FilterSupport, QueryDialect, Source, SourceError};
use crate::utils::{encode_query, HttpClient};

/// Sentinel lower bound for an open-ended publication date range
const EARLIEST_YEAR: &str = "1800";
/// Sentinel upper bound for an open-ended publication date range
const LATEST_YEAR: &str = "3000";

/// PubMed research source
///
/// Uses NCBI E-utilities API for searching and fetching PubMed records.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    config: PubMedConfig,
}

impl PubMedSource {
    /// Create a new PubMed source
    pub fn new(client: Arc<HttpClient>, config: PubMedConfig) -> Self {
        Self { client, config }
    }

    /// Registration parameters NCBI asks every caller to send
    fn contact_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(tool) = &self.config.tool {
            params.push(("tool", tool.clone()));
        }
        if let Some(email) = &self.config.email {
            params.push(("email", email.clone()));
        }
        if let Some(api_key) = &self.config.api_key {
            params.push(("api_key", api_key.clone()));
        }
        params
    }

    /// Build E-utilities search URL
    fn build_search_url(&self, term: &str, max_results: usize) -> String {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("term", term.to_string()),
            ("retmax", max_results.to_string()),
            ("retmode", "xml".to_string()),
        ];
        params.extend(self.contact_params());

        format!(
            "{}/esearch.fcgi?{}",
            self.config.base_url.trim_end_matches('/'),
            encode_query(&params)
        )
    }

    /// Build E-utilities fetch URL for specific PubMed IDs
    fn build_fetch_url(&self, ids: &[String]) -> String {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", ids.join(",")),
            ("retmode", "xml".to_string()),
        ];
        params.extend(self.contact_params());

        format!(
            "{}/efetch.fcgi?{}",
            self.config.base_url.trim_end_matches('/'),
            encode_query(&params)
        )
    }

    /// Parse E-utilities search response XML
    fn parse_search_response(xml: &str) -> Result<Vec<String>, SourceError> {
        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct ESearchResult {
            IdList: Option<IdList>,
            #[serde(rename = "ERROR")]
            error: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        struct IdList {
            #[serde(rename = "Id", default)]
            ids: Vec<String>,
        }

        let result: ESearchResult = from_str(xml)
            .map_err(|e| SourceError::Parse(format!("Failed to parse PubMed search XML: {}", e)))?;

        if let Some(error) = result.error {
            return Err(SourceError::Api(format!("PubMed esearch error: {}", error)));
        }

        Ok(result.IdList.map(|list| list.ids).unwrap_or_default())
    }

    /// Parse E-utilities fetch response XML.
    ///
    /// Titles and abstracts carry inline markup (`<i>`, `<sub>`, ...), so the
    /// records are read event by event and nested text is flattened. A
    /// malformed document keeps the records completed before the fault.
    fn parse_fetch_response(xml: &str) -> Result<Vec<Article>, SourceError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Frame> = Vec::new();
        let mut record: Option<FetchRecord> = None;
        let mut text = String::new();
        let mut articles = Vec::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) if articles.is_empty() => {
                    return Err(SourceError::Parse(format!(
                        "Failed to parse PubMed fetch XML: {}",
                        e
                    )));
                }
                Err(e) => {
                    tracing::warn!(
                        "PubMed fetch XML broken after {} records: {}",
                        articles.len(),
                        e
                    );
                    break;
                }
            };

            match event {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    match name.as_str() {
                        "PubmedArticle" => record = Some(FetchRecord::default()),
                        "Author" => {
                            if let Some(record) = record.as_mut() {
                                record.author = AuthorName::default();
                            }
                        }
                        _ => {}
                    }
                    let field = Field::classify(&name, &stack);
                    if field.is_some() {
                        text.clear();
                    }
                    stack.push(Frame { name, field });
                }
                Event::Text(raw) => {
                    if stack.iter().any(|frame| frame.field.is_some()) {
                        match raw.unescape() {
                            Ok(unescaped) => text.push_str(&unescaped),
                            Err(_) => text.push_str(&String::from_utf8_lossy(&raw)),
                        }
                    }
                }
                Event::CData(data) => {
                    if stack.iter().any(|frame| frame.field.is_some()) {
                        text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::End(_) => {
                    let Some(frame) = stack.pop() else {
                        continue;
                    };
                    let Some(current) = record.as_mut() else {
                        continue;
                    };
                    if let Some(field) = frame.field {
                        current.set(field, collapse_whitespace(&text));
                        text.clear();
                    }
                    match frame.name.as_str() {
                        "Author" => {
                            if let Some(name) = current.author.display() {
                                current.authors.push(name);
                            }
                        }
                        "PubmedArticle" => {
                            if let Some(done) = record.take() {
                                articles.push(done.into_article());
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(articles)
    }

    async fn get_text(&self, url: &str, step: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                let e = SourceError::from(e);
                tracing::debug!("PubMed {} request failed: {}", step, e);
                e
            })?;

        success_body(response, "PubMed").await
    }
}

/// Open element while walking an efetch document
struct Frame {
    name: String,
    field: Option<Field>,
}

/// Elements whose flattened text is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Pmid,
    Title,
    Journal,
    Year,
    Month,
    Day,
    MedlineDate,
    AbstractText,
    LastName,
    Initials,
    CollectiveName,
}

impl Field {
    fn classify(name: &str, stack: &[Frame]) -> Option<Field> {
        let parent = stack.last().map(|frame| frame.name.as_str());
        let grandparent = stack
            .len()
            .checked_sub(2)
            .map(|i| stack[i].name.as_str());

        match (name, parent, grandparent) {
            ("PMID", Some("MedlineCitation"), _) => Some(Field::Pmid),
            ("ArticleTitle", Some("Article"), _) => Some(Field::Title),
            ("Title", Some("Journal"), _) => Some(Field::Journal),
            ("Year", Some("PubDate"), Some("JournalIssue")) => Some(Field::Year),
            ("Month", Some("PubDate"), Some("JournalIssue")) => Some(Field::Month),
            ("Day", Some("PubDate"), Some("JournalIssue")) => Some(Field::Day),
            ("MedlineDate", Some("PubDate"), Some("JournalIssue")) => Some(Field::MedlineDate),
            ("AbstractText", Some("Abstract"), _) => Some(Field::AbstractText),
            ("LastName", Some("Author"), Some("AuthorList")) => Some(Field::LastName),
            ("Initials", Some("Author"), Some("AuthorList")) => Some(Field::Initials),
            ("CollectiveName", Some("Author"), Some("AuthorList")) => Some(Field::CollectiveName),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct AuthorName {
    last_name: Option<String>,
    initials: Option<String>,
    collective: Option<String>,
}

impl AuthorName {
    /// "Smith JA", the MEDLINE AU form
    fn display(&self) -> Option<String> {
        if let Some(collective) = &self.collective {
            return Some(collective.clone());
        }
        let name = [&self.last_name, &self.initials]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }
}

/// Fields collected for one `PubmedArticle`
#[derive(Debug, Default)]
struct FetchRecord {
    pmid: Option<String>,
    title: Option<String>,
    journal: Option<String>,
    year: Option<String>,
    month: Option<String>,
    day: Option<String>,
    medline_date: Option<String>,
    abstract_parts: Vec<String>,
    authors: Vec<String>,
    author: AuthorName,
}

impl FetchRecord {
    fn set(&mut self, field: Field, value: String) {
        if value.is_empty() {
            return;
        }
        match field {
            Field::Pmid => self.pmid = Some(value),
            Field::Title => self.title = Some(value),
            Field::Journal => self.journal = Some(value),
            Field::Year => self.year = Some(value),
            Field::Month => self.month = Some(value),
            Field::Day => self.day = Some(value),
            Field::MedlineDate => self.medline_date = Some(value),
            Field::AbstractText => self.abstract_parts.push(value),
            Field::LastName => self.author.last_name = Some(value),
            Field::Initials => self.author.initials = Some(value),
            Field::CollectiveName => self.author.collective = Some(value),
        }
    }

    /// "2020 Feb 3" style, as MEDLINE prints the DP field
    fn pubdate(&self) -> Option<String> {
        match &self.year {
            Some(_) => Some(
                [&self.year, &self.month, &self.day]
                    .into_iter()
                    .flatten()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            None => self.medline_date.clone(),
        }
    }

    fn into_article(self) -> Article {
        let pubdate = self.pubdate();
        let abstract_text = (!self.abstract_parts.is_empty()).then(|| self.abstract_parts.join(" "));

        ArticleBuilder::new(SourceType::PubMed)
            .title(self.title)
            .authors(self.authors)
            .journal(self.journal)
            .pubdate(pubdate)
            .id(self.pmid)
            .abstract_text(abstract_text)
            .build()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl QueryDialect for PubMedSource {
    type Native = String;

    /// Boolean E-utilities term: free text followed by one field-tagged
    /// clause per filter, all joined with AND.
    fn translate(&self, query: &SearchQuery) -> String {
        let filters = &query.filters;
        let mut term = query.query.clone();

        if let Some(author) = &filters.author {
            term.push_str(&format!(" AND {}[Author]", author));
        }
        if let Some(journal) = &filters.journal {
            term.push_str(&format!(" AND {}[Journal]", journal));
        }
        match (&filters.year_from, &filters.year_to) {
            (Some(from), Some(to)) => {
                term.push_str(&format!(" AND {}:{}[Date - Publication]", from, to))
            }
            (Some(from), None) => {
                term.push_str(&format!(" AND {}:{}[Date - Publication]", from, LATEST_YEAR))
            }
            (None, Some(to)) => {
                term.push_str(&format!(" AND {}:{}[Date - Publication]", EARLIEST_YEAR, to))
            }
            (None, None) => {}
        }
        if let Some(article_type) = &filters.article_type {
            term.push_str(&format!(" AND {}[Publication Type]", article_type));
        }

        term
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn id(&self) -> &str {
        SourceType::PubMed.id()
    }

    fn name(&self) -> &str {
        SourceType::PubMed.name()
    }

    fn supported_filters(&self) -> FilterSupport {
        FilterSupport::all()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>, SourceError> {
        if query.max_results == 0 {
            return Ok(Vec::new());
        }

        let term = self.translate(query);
        tracing::debug!(term = %term, retmax = query.max_results, "PubMed esearch");

        let xml = self
            .get_text(&self.build_search_url(&term, query.max_results), "esearch")
            .await?;
        let ids = Self::parse_search_response(&xml)?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("PubMed efetch for {} ids", ids.len());
        let xml = self.get_text(&self.build_fetch_url(&ids), "efetch").await?;
        let articles = Self::parse_fetch_response(&xml)?;

        tracing::debug!("PubMed returned {} articles", articles.len());
        Ok(articles)
    }
}
