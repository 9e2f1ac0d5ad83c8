//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::chat::Reply;
use crate::chat::WebhookEvent;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// RAG query request
#[derive(Debug, Deserialize)]
pub struct RagQueryRequest {
    pub question: String,
    /// Overrides `rag.similarity_threshold` for this query
    #[serde(default)]
    pub threshold: Option<f32>,
    /// Restrict retrieval to one source document
    #[serde(default)]
    pub source: Option<String>,
}

/// Chat-platform webhook payload
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// Replies for the events that warranted one
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub replies: Vec<Reply>,
}
