//! Gemini embedding API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::Embedder;
use super::TaskType;
use super::MAX_BATCH_SIZE;
use crate::config::AppConfig;
use crate::errors::ChatRagError;
use crate::errors::Result;

/// Client for generating embeddings with the Gemini API
pub struct EmbeddingClient {
    model: String,
    endpoint: String,
    api_key: String,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

impl EmbeddingClient {
    /// Create a new embedding client from application config
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        if config.gemini_api_key().is_empty() {
            return Err(ChatRagError::ConfigError(
                "gemini.api_key is not set (or GEMINI_API_KEY)".to_string(),
            ));
        }

        Self::new(
            config.embedding_model().to_string(),
            config.gemini.endpoint.clone(),
            config.gemini_api_key().to_string(),
            Duration::from_secs(config.gemini.timeout_secs),
        )
    }

    /// Create a new embedding client
    pub fn new(model: String, endpoint: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ChatRagError::HttpError(e.to_string()))?;

        Ok(Self {
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn request<'a>(&self, text: &'a str, task: TaskType) -> EmbedRequest<'a> {
        EmbedRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: vec![EmbedPart { text }],
            },
            task_type: task.as_api_str(),
        }
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R> {
        let url = format!("{}/models/{}:{}", self.endpoint, self.model, method);
        debug!("Calling Gemini embeddings API: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatRagError::EmbeddingError(format!(
                "Gemini API error ({status}): {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ChatRagError::EmbeddingError(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>> {
        let result: EmbedResponse = self.post("embedContent", &self.request(text, task)).await?;
        Ok(result.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String], task: TaskType) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH_SIZE) {
            let request = BatchEmbedRequest {
                requests: batch.iter().map(|t| self.request(t, task)).collect(),
            };
            let result: BatchEmbedResponse = self.post("batchEmbedContents", &request).await?;

            if result.embeddings.len() != batch.len() {
                return Err(ChatRagError::EmbeddingError(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    result.embeddings.len()
                )));
            }
            embeddings.extend(result.embeddings.into_iter().map(|e| e.values));
        }

        Ok(embeddings)
    }
}
