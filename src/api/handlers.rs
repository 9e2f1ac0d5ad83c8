//! API request handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use crate::api::types::ApiResponse;
use crate::api::types::HealthResponse;
use crate::api::types::RagQueryRequest;
use crate::api::types::WebhookRequest;
use crate::api::types::WebhookResponse;
use crate::chat::ChatService;
use crate::rag::RagQuery;
use crate::rag::RagResponse;
use crate::rag::RagService;
use crate::vector::MetadataFilter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rag: Arc<RagService>,
    pub chat: Arc<ChatService>,
}

type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// RAG query
pub async fn rag_query(
    State(state): State<AppState>,
    Json(req): Json<RagQueryRequest>,
) -> Result<Json<ApiResponse<RagResponse>>, ApiError> {
    info!("POST /api/rag/query: {}", req.question);

    if req.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    let mut query = RagQuery::new(req.question);
    if let Some(threshold) = req.threshold {
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(bad_request(format!(
                "threshold must be within [-1, 1], got {threshold}"
            )));
        }
        query = query.with_threshold(threshold);
    }
    if let Some(source) = req.source {
        query = query.with_filter(MetadataFilter::new().eq("source", source));
    }

    let response = state.rag.query_with_options(query).await;
    Ok(Json(ApiResponse::success(response)))
}

/// Chat-platform webhook: one reply per answered text message
pub async fn webhook(
    State(state): State<AppState>,
    Json(req): Json<WebhookRequest>,
) -> Json<WebhookResponse> {
    info!("POST /webhook: {} events", req.events.len());

    let mut response = WebhookResponse::default();
    for event in &req.events {
        if let Some(reply) = state.chat.handle_event(event).await {
            response.replies.push(reply);
        }
    }

    Json(response)
}
