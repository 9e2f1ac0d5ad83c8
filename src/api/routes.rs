//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers;
use super::handlers::AppState;

/// Create RESTful API router, mounted under `/api`
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/rag/query", post(handlers::rag_query))
        .with_state(state)
}

/// Chat-platform webhook router, mounted at the root
pub fn webhook_routes(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handlers::webhook))
        .with_state(state)
}
