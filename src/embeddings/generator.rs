//! Embedding service used by the query pipeline

use std::sync::Arc;

use tracing::warn;

use super::client::EmbeddingClient;
use super::Embedder;
use super::TaskType;
use crate::config::AppConfig;
use crate::errors::Result;

/// Service for generating embeddings that never fails the caller
#[derive(Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingService {
    /// Create a new embedding service backed by the Gemini client
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = EmbeddingClient::from_app_config(config)?;
        Ok(Self::from_embedder(Arc::new(client)))
    }

    /// Wrap an existing embedder
    #[must_use]
    pub fn from_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed `text`, returning an empty vector for empty input or on failure.
    ///
    /// Callers must treat an empty vector as "skip", never as a zero vector.
    pub async fn embed(&self, text: &str, task: TaskType) -> Vec<f32> {
        match self.try_embed(text, task).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Embedding failed, skipping text: {}", e);
                Vec::new()
            }
        }
    }

    /// Embed `text`, surfacing provider errors
    pub async fn try_embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        self.embedder.embed(text, task).await
    }

    /// Embed several texts; empty texts map to empty vectors without a remote call
    pub async fn try_embed_batch(&self, texts: &[String], task: TaskType) -> Result<Vec<Vec<f32>>> {
        let non_empty: Vec<String> = texts.iter().filter(|t| !t.is_empty()).cloned().collect();
        if non_empty.is_empty() {
            return Ok(vec![Vec::new(); texts.len()]);
        }

        let mut generated = self.embedder.embed_batch(&non_empty, task).await?.into_iter();
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            if text.is_empty() {
                embeddings.push(Vec::new());
            } else {
                embeddings.push(generated.next().unwrap_or_default());
            }
        }
        Ok(embeddings)
    }
}
