//! Aggregation behaviour against scripted mock sources.

use scholar_aggregator::models::{Filters, SearchRequest, SourceType};
use scholar_aggregator::sources::mock::make_article;
use scholar_aggregator::sources::{FilterSupport, MockSource};
use scholar_aggregator::{AggregateError, Aggregator, SourceRegistry};
use std::sync::Arc;

struct Fixture {
    pubmed: Arc<MockSource>,
    arxiv: Arc<MockSource>,
    ieee: Arc<MockSource>,
    aggregator: Aggregator,
}

fn articles(prefix: &str, count: usize, source: SourceType) -> Vec<scholar_aggregator::Article> {
    (0..count)
        .map(|i| make_article(&format!("{}-{}", prefix, i), &format!("{} paper {}", prefix, i), source))
        .collect()
}

fn fixture() -> Fixture {
    let pubmed = Arc::new(MockSource::new("pubmed", "PubMed"));
    let arxiv = Arc::new(
        MockSource::new("arxiv", "arXiv").with_filters(FilterSupport::AUTHOR | FilterSupport::YEAR_RANGE),
    );
    let ieee = Arc::new(MockSource::new("ieee", "IEEE Xplore").with_filters(
        FilterSupport::AUTHOR | FilterSupport::JOURNAL | FilterSupport::YEAR_RANGE,
    ));

    pubmed.set_articles(articles("pm", 10, SourceType::PubMed));
    arxiv.set_articles(articles("ax", 10, SourceType::Arxiv));
    ieee.set_articles(articles("ie", 10, SourceType::IeeeXplore));

    let mut registry = SourceRegistry::new();
    registry.register(pubmed.clone());
    registry.register(arxiv.clone());
    registry.register(ieee.clone());

    Fixture {
        pubmed,
        arxiv,
        ieee,
        aggregator: Aggregator::new(Arc::new(registry)),
    }
}

#[tokio::test]
async fn test_quota_is_split_evenly() {
    let f = fixture();
    let result = f.aggregator.search(&SearchRequest::new("cancer")).await.unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(result.articles.len(), 9);
    for source in [&f.pubmed, &f.arxiv, &f.ieee] {
        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].max_results, 3);
        assert_eq!(queries[0].query, "cancer");
    }
}

#[tokio::test]
async fn test_articles_follow_registry_order() {
    let f = fixture();
    let request = SearchRequest::new("cancer").max_results(4).sources(["ieee", "pubmed"]);
    let result = f.aggregator.search(&request).await.unwrap();

    let sources: Vec<SourceType> = result.articles.iter().map(|a| a.source).collect();
    assert_eq!(
        sources,
        vec![SourceType::PubMed, SourceType::PubMed, SourceType::IeeeXplore, SourceType::IeeeXplore]
    );
    assert!(f.arxiv.queries().is_empty());
}

#[tokio::test]
async fn test_single_source_gets_whole_budget() {
    let f = fixture();
    let request = SearchRequest::new("cancer").max_results(4).sources(["arxiv"]);
    let result = f.aggregator.search(&request).await.unwrap();

    assert_eq!(result.articles.len(), 4);
    assert_eq!(f.arxiv.queries()[0].max_results, 4);
    assert!(f.pubmed.queries().is_empty());
    assert!(f.ieee.queries().is_empty());
}

#[tokio::test]
async fn test_quota_rounds_down_to_zero() {
    let f = fixture();
    let request = SearchRequest::new("cancer").max_results(2);
    let result = f.aggregator.search(&request).await.unwrap();

    assert!(result.articles.is_empty());
    assert!(result.errors.is_empty());
    assert_eq!(f.pubmed.queries()[0].max_results, 0);
}

#[tokio::test]
async fn test_empty_selection_contacts_nothing() {
    let f = fixture();
    let request = SearchRequest::new("cancer").sources(Vec::<String>::new());
    let err = f.aggregator.search(&request).await.unwrap_err();

    assert!(matches!(err, AggregateError::NoSourcesSelected(_)));
    assert!(err.to_string().contains("pubmed, arxiv, ieee"));
    assert!(f.pubmed.queries().is_empty());
    assert!(f.arxiv.queries().is_empty());
    assert!(f.ieee.queries().is_empty());
}

#[tokio::test]
async fn test_only_unknown_sources_runs_nothing() {
    let f = fixture();
    let request = SearchRequest::new("cancer").sources(["scopus"]);
    let result = f.aggregator.search(&request).await.unwrap();

    assert!(result.articles.is_empty());
    assert_eq!(result.errors, vec!["Unknown source: scopus"]);
    assert!(f.pubmed.queries().is_empty());
}

#[tokio::test]
async fn test_unknown_source_counts_toward_quota() {
    let f = fixture();
    let request = SearchRequest::new("cancer").max_results(10).sources(["pubmed", "scopus"]);
    let result = f.aggregator.search(&request).await.unwrap();

    assert_eq!(result.errors, vec!["Unknown source: scopus"]);
    assert_eq!(f.pubmed.queries()[0].max_results, 5);
    assert_eq!(result.articles.len(), 5);
}

#[tokio::test]
async fn test_unknown_source_reported_among_known() {
    let f = fixture();
    let request = SearchRequest::new("cancer").max_results(6).sources(["pubmed", "scopus", "arxiv"]);
    let result = f.aggregator.search(&request).await.unwrap();

    assert_eq!(result.errors, vec!["Unknown source: scopus"]);
    assert_eq!(f.pubmed.queries()[0].max_results, 2);
    assert_eq!(f.arxiv.queries()[0].max_results, 2);
    assert_eq!(result.articles.len(), 4);
}

#[tokio::test]
async fn test_failure_is_isolated() {
    let f = fixture();
    f.arxiv.fail_with("connection reset");

    let request = SearchRequest::new("cancer").max_results(6);
    let result = f.aggregator.search(&request).await.unwrap();

    assert_eq!(result.articles.len(), 4);
    assert!(result.articles.iter().all(|a| a.source != SourceType::Arxiv));
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("arXiv"));
    assert!(result.errors[0].contains("connection reset"));
    assert_eq!(f.ieee.queries().len(), 1);
}

#[tokio::test]
async fn test_all_sources_fail() {
    let f = fixture();
    f.pubmed.fail_with("down");
    f.arxiv.fail_with("down");
    f.ieee.fail_with("down");

    let result = f.aggregator.search(&SearchRequest::new("cancer")).await.unwrap();

    assert!(result.articles.is_empty());
    assert_eq!(result.errors.len(), 3);
    assert!(result.errors[0].starts_with("PubMed search error: "));
    assert!(result.errors[1].starts_with("arXiv search error: "));
    assert!(result.errors[2].starts_with("IEEE Xplore search error: "));
}

#[tokio::test]
async fn test_unsupported_filters_are_dropped() {
    let f = fixture();
    let request = SearchRequest::new("cancer").filters(Filters {
        author: Some("Smith".to_string()),
        journal: Some("Nature".to_string()),
        year_from: Some("2018".to_string()),
        year_to: Some("2020".to_string()),
        article_type: Some("Review".to_string()),
    });
    f.aggregator.search(&request).await.unwrap();

    let pubmed_queries = f.pubmed.queries();
    let pubmed = &pubmed_queries[0].filters;
    assert_eq!(pubmed.article_type.as_deref(), Some("Review"));
    assert_eq!(pubmed.journal.as_deref(), Some("Nature"));

    let arxiv_queries = f.arxiv.queries();
    let arxiv = &arxiv_queries[0].filters;
    assert_eq!(arxiv.author.as_deref(), Some("Smith"));
    assert_eq!(arxiv.year_from.as_deref(), Some("2018"));
    assert_eq!(arxiv.journal, None);
    assert_eq!(arxiv.article_type, None);

    let ieee_queries = f.ieee.queries();
    let ieee = &ieee_queries[0].filters;
    assert_eq!(ieee.journal.as_deref(), Some("Nature"));
    assert_eq!(ieee.article_type, None);
}

#[tokio::test]
async fn test_repeated_source_runs_once_but_counts_twice() {
    let f = fixture();
    let request = SearchRequest::new("cancer").max_results(4).sources(["PubMed", "pubmed"]);
    let result = f.aggregator.search(&request).await.unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(f.pubmed.queries().len(), 1);
    assert_eq!(f.pubmed.queries()[0].max_results, 2);
    assert_eq!(result.articles.len(), 2);
}
