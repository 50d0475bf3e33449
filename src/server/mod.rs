//! HTTP endpoint for aggregated searches.
//!
//! - `POST /search` takes the JSON search payload and answers
//!   `{"articles": [...], "errors": [...]}`. Source failures still answer 200;
//!   only an unparseable payload or an empty source selection is a 400.
//! - `GET /sources` lists the registered sources and the filters each accepts.
//! - `GET /health` is a liveness probe.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::aggregator::{AggregateError, Aggregator};
use crate::models::{RequestError, SearchRequest, SearchResult};

/// Errors surfaced to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

/// One entry of `GET /sources`
#[derive(Debug, Serialize)]
struct SourceInfo {
    id: String,
    name: String,
    filters: Vec<&'static str>,
}

/// Build the router
pub fn router(aggregator: Arc<Aggregator>) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/sources", get(sources))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(aggregator)
}

async fn search(
    State(aggregator): State<Arc<Aggregator>>,
    body: Bytes,
) -> Result<Json<SearchResult>, ApiError> {
    let request = SearchRequest::from_bytes(&body)?;
    let result = aggregator.search(&request).await?;
    Ok(Json(result))
}

async fn sources(State(aggregator): State<Arc<Aggregator>>) -> Json<Vec<SourceInfo>> {
    let sources = aggregator
        .registry()
        .all()
        .map(|source| SourceInfo {
            id: source.id().to_string(),
            name: source.name().to_string(),
            filters: source.supported_filters().names(),
        })
        .collect();
    Json(sources)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve until Ctrl-C
pub async fn serve(addr: SocketAddr, aggregator: Arc<Aggregator>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(aggregator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
