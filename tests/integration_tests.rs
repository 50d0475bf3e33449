//! Integration tests for Scholar Aggregator
//!
//! Each test stands up a mock HTTP server in place of the real services and
//! drives the full stack: configuration, registry, adapters and aggregator.

use mockito::{Matcher, Server, ServerGuard};
use scholar_aggregator::config::AppConfig;
use scholar_aggregator::models::{SearchRequest, SourceType};
use scholar_aggregator::{Aggregator, SourceRegistry};
use std::sync::Arc;
use tokio::net::TcpListener;

const ESEARCH_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSearchResult><Count>1</Count><RetMax>1</RetMax><RetStart>0</RetStart>
<IdList><Id>38012345</Id></IdList></eSearchResult>"#;

const EFETCH_XML: &str = r#"<?xml version="1.0" ?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">38012345</PMID>
      <Article>
        <Journal>
          <JournalIssue><PubDate><Year>2022</Year><Month>Mar</Month></PubDate></JournalIssue>
          <Title>The Lancet</Title>
        </Journal>
        <ArticleTitle>Cancer screening outcomes.</ArticleTitle>
        <Abstract><AbstractText>Screening works.</AbstractText></Abstract>
        <AuthorList>
          <Author><LastName>Doe</LastName><Initials>J</Initials></Author>
        </AuthorList>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

const ARXIV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query Results</title>
  <id>http://arxiv.org/api/query</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <updated>2021-01-02T00:00:00Z</updated>
    <published>2021-01-01T00:00:00Z</published>
    <title>Deep Learning for Cancer Detection</title>
    <summary>We detect cancer.</summary>
    <author><name>Grace Hopper</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/1501.00002v1</id>
    <updated>2015-01-02T00:00:00Z</updated>
    <published>2015-01-01T00:00:00Z</published>
    <title>An Older Preprint</title>
    <summary>Old news.</summary>
    <author><name>Alan Turing</name></author>
  </entry>
</feed>"#;

const IEEE_JSON: &str = r#"{
  "total_records": 1,
  "articles": [{
    "article_number": "9000001",
    "title": "Radar Signal Processing",
    "abstract": "Signals.",
    "publication_title": "IEEE Transactions on Signal Processing",
    "publication_year": 2020,
    "authors": {"authors": [{"full_name": "M. Skolnik"}]}
  }]
}"#;

/// Configuration pointing every source at the mock server
fn mock_config(server: &ServerGuard) -> AppConfig {
    let mut config = AppConfig::default();
    config.http.timeout_secs = 5;
    config.pubmed.base_url = format!("{}/entrez/eutils", server.url());
    config.pubmed.email = Some("dev@example.org".to_string());
    config.pubmed.tool = Some("scholar-aggregator-tests".to_string());
    config.arxiv.base_url = format!("{}/api/query", server.url());
    config.ieee.base_url = format!("{}/api/v1/search/articles", server.url());
    config.ieee.api_key = Some("test-key".to_string());
    config
}

fn aggregator(config: &AppConfig) -> Aggregator {
    let registry = SourceRegistry::from_config(config).expect("registry");
    Aggregator::new(Arc::new(registry))
}

#[cfg(feature = "source-pubmed")]
#[tokio::test]
async fn test_pubmed_search_and_fetch() {
    let mut server = Server::new_async().await;

    let esearch = server
        .mock("GET", "/entrez/eutils/esearch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("db".to_string(), "pubmed".to_string()),
            Matcher::UrlEncoded("term".to_string(), "cancer AND Doe[Author]".to_string()),
            Matcher::UrlEncoded("retmax".to_string(), "5".to_string()),
            Matcher::UrlEncoded("email".to_string(), "dev@example.org".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(ESEARCH_XML)
        .expect(1)
        .create_async()
        .await;

    let efetch = server
        .mock("GET", "/entrez/eutils/efetch.fcgi")
        .match_query(Matcher::UrlEncoded("id".to_string(), "38012345".to_string()))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(EFETCH_XML)
        .expect(1)
        .create_async()
        .await;

    let request = SearchRequest::from_json(
        r#"{"query": "cancer", "max_results": 5, "sources": ["pubmed"], "author": "Doe"}"#,
    )
    .unwrap();
    let result = aggregator(&mock_config(&server)).search(&request).await.unwrap();

    esearch.assert_async().await;
    efetch.assert_async().await;

    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    assert_eq!(result.articles.len(), 1);

    let article = &result.articles[0];
    assert_eq!(article.id, "38012345");
    assert_eq!(article.title, "Cancer screening outcomes.");
    assert_eq!(article.journal, "The Lancet");
    assert_eq!(article.pubdate, "2022 Mar");
    assert_eq!(article.authors, vec!["Doe J"]);
    assert_eq!(article.source, SourceType::PubMed);
}

#[cfg(feature = "source-pubmed")]
#[tokio::test]
async fn test_pubmed_empty_id_list_skips_fetch() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/entrez/eutils/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<eSearchResult><Count>0</Count><IdList></IdList></eSearchResult>")
        .create_async()
        .await;
    let efetch = server
        .mock("GET", "/entrez/eutils/efetch.fcgi")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let request = SearchRequest::new("nothing matches").sources(["pubmed"]);
    let result = aggregator(&mock_config(&server)).search(&request).await.unwrap();

    efetch.assert_async().await;
    assert!(result.articles.is_empty());
    assert!(result.errors.is_empty());
}

#[cfg(feature = "source-arxiv")]
#[tokio::test]
async fn test_arxiv_only_gets_full_quota_and_year_filter() {
    let mut server = Server::new_async().await;

    let feed = server
        .mock("GET", "/api/query")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("search_query".to_string(), "cancer".to_string()),
            Matcher::UrlEncoded("max_results".to_string(), "4".to_string()),
            Matcher::UrlEncoded("sortBy".to_string(), "relevance".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/atom+xml")
        .with_body(ARXIV_FEED)
        .expect(1)
        .create_async()
        .await;

    // journal has no arXiv equivalent and must not reach the query
    let request = SearchRequest::from_json(
        r#"{"query": "cancer", "max_results": 4, "sources": ["arxiv"], "year_from": "2020", "journal": "Nature"}"#,
    )
    .unwrap();
    let result = aggregator(&mock_config(&server)).search(&request).await.unwrap();

    feed.assert_async().await;
    assert!(result.errors.is_empty());
    assert_eq!(result.articles.len(), 1);
    assert_eq!(result.articles[0].title, "Deep Learning for Cancer Detection");
    assert_eq!(result.articles[0].journal, "arXiv");
    assert_eq!(result.articles[0].pubdate, "2021-01-01");
}

#[cfg(feature = "source-ieee")]
#[tokio::test]
async fn test_ieee_search() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/api/v1/search/articles")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("apikey".to_string(), "test-key".to_string()),
            Matcher::UrlEncoded("querytext".to_string(), "radar".to_string()),
            Matcher::UrlEncoded("publication_title".to_string(), "IEEE TSP".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(IEEE_JSON)
        .expect(1)
        .create_async()
        .await;

    let request = SearchRequest::from_json(
        r#"{"query": "radar", "sources": ["ieee"], "journal": "IEEE TSP"}"#,
    )
    .unwrap();
    let result = aggregator(&mock_config(&server)).search(&request).await.unwrap();

    mock.assert_async().await;
    assert!(result.errors.is_empty());
    assert_eq!(result.articles.len(), 1);
    assert_eq!(result.articles[0].id, "9000001");
    assert_eq!(result.articles[0].pubdate, "2020");
    assert_eq!(result.articles[0].source, SourceType::IeeeXplore);
}

#[cfg(feature = "source-ieee")]
#[tokio::test]
async fn test_ieee_inactive_account() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/api/v1/search/articles")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("<h1>Developer Inactive</h1>")
        .create_async()
        .await;

    let request = SearchRequest::new("radar").sources(["ieee"]);
    let result = aggregator(&mock_config(&server)).search(&request).await.unwrap();

    assert!(result.articles.is_empty());
    assert_eq!(
        result.errors,
        vec!["IEEE Xplore search error: IEEE API account is not yet active. Please check your account status."]
    );
}

#[cfg(feature = "source-ieee")]
#[tokio::test]
async fn test_ieee_other_forbidden() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/api/v1/search/articles")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("Not Authorized")
        .create_async()
        .await;

    let request = SearchRequest::new("radar").sources(["ieee"]);
    let result = aggregator(&mock_config(&server)).search(&request).await.unwrap();

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("IEEE Xplore search error: "));
    assert!(result.errors[0].contains("Access forbidden. Response content: Not Authorized"));
}

#[cfg(all(feature = "source-pubmed", feature = "source-arxiv", feature = "source-ieee"))]
#[tokio::test]
async fn test_all_sources_with_one_failure() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/entrez/eutils/esearch.fcgi")
        .match_query(Matcher::UrlEncoded("retmax".to_string(), "3".to_string()))
        .with_status(200)
        .with_body(ESEARCH_XML)
        .create_async()
        .await;
    server
        .mock("GET", "/entrez/eutils/efetch.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(EFETCH_XML)
        .create_async()
        .await;
    server
        .mock("GET", "/api/query")
        .match_query(Matcher::UrlEncoded("max_results".to_string(), "3".to_string()))
        .with_status(503)
        .with_body("Service Unavailable")
        .create_async()
        .await;
    server
        .mock("GET", "/api/v1/search/articles")
        .match_query(Matcher::UrlEncoded("max_records".to_string(), "3".to_string()))
        .with_status(200)
        .with_body(IEEE_JSON)
        .create_async()
        .await;

    // 10 results over three sources: 3 each
    let request = SearchRequest::new("cancer");
    let result = aggregator(&mock_config(&server)).search(&request).await.unwrap();

    assert_eq!(result.articles.len(), 2);
    assert_eq!(result.articles[0].source, SourceType::PubMed);
    assert_eq!(result.articles[1].source, SourceType::IeeeXplore);

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("arXiv search error: "));
    assert!(result.errors[0].contains("503"));
}

#[cfg(all(feature = "source-pubmed", feature = "source-ieee"))]
#[tokio::test]
async fn test_ieee_timeout_keeps_pubmed_articles() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/entrez/eutils/esearch.fcgi")
        .match_query(Matcher::UrlEncoded("retmax".to_string(), "5".to_string()))
        .with_status(200)
        .with_body(ESEARCH_XML)
        .create_async()
        .await;
    server
        .mock("GET", "/entrez/eutils/efetch.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(EFETCH_XML)
        .create_async()
        .await;

    // accepts connections and never writes a response
    let silent = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let silent_addr = silent.local_addr().unwrap();
    let holder = tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = silent.accept().await {
            open.push(socket);
        }
    });

    let mut config = mock_config(&server);
    config.http.timeout_secs = 1;
    config.ieee.base_url = format!("http://{}/api/v1/search/articles", silent_addr);

    let request = SearchRequest::new("cancer").sources(["pubmed", "ieee"]);
    let result = aggregator(&config).search(&request).await.unwrap();
    holder.abort();

    assert_eq!(result.articles.len(), 1);
    assert_eq!(result.articles[0].source, SourceType::PubMed);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("IEEE Xplore search error: "));
    assert!(result.errors[0].contains("timed out"), "got: {}", result.errors[0]);
}

#[cfg(feature = "source-pubmed")]
#[tokio::test]
async fn test_unreachable_source_is_reported() {
    let mut config = AppConfig::default();
    config.http.timeout_secs = 2;
    config.http.connect_timeout_secs = 1;
    config.pubmed.base_url = "http://127.0.0.1:9/entrez/eutils".to_string();

    let request = SearchRequest::new("cancer").sources(["pubmed"]);
    let result = aggregator(&config).search(&request).await.unwrap();

    assert!(result.articles.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("PubMed search error: Network error"));
}

#[tokio::test]
async fn test_empty_selection_is_rejected() {
    let request = SearchRequest::new("cancer").sources(Vec::<String>::new());
    let err = aggregator(&AppConfig::default())
        .search(&request)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("No sources selected"));
}
