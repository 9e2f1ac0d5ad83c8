//! Pinecone data-plane REST client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use super::ChunkMetadata;
use super::IndexStats;
use super::Match;
use super::MetadataFilter;
use super::VectorIndex;
use super::VectorRecord;
use crate::config::AppConfig;
use crate::errors::ChatRagError;
use crate::errors::Result;

/// Client for one Pinecone index
pub struct PineconeIndex {
    host: String,
    api_key: String,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    namespace: &'a str,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Deserialize)]
struct RawMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    delete_all: bool,
    namespace: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    total_vector_count: u64,
    #[serde(default)]
    namespaces: HashMap<String, NamespaceStats>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: u64,
}

impl PineconeIndex {
    /// Create a client from application config
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        if config.pinecone.api_key.is_empty() || config.pinecone.index_host.is_empty() {
            return Err(ChatRagError::ConfigError(
                "pinecone.api_key and pinecone.index_host must be set".to_string(),
            ));
        }

        Self::new(
            config.pinecone.index_host.clone(),
            config.pinecone.api_key.clone(),
            Duration::from_secs(config.pinecone.timeout_secs),
        )
    }

    /// Create a client for the index served at `host`
    pub fn new(host: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatRagError::HttpError(e.to_string()))?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}{}", self.host, path);
        debug!("Calling Pinecone: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatRagError::VectorIndexError(format!(
                "Pinecone API error ({status}): {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ChatRagError::VectorIndexError(format!("Failed to parse response: {e}")))
    }
}

fn decode_matches(raw: Vec<RawMatch>) -> Vec<Match> {
    raw.into_iter()
        .filter_map(|m| {
            let metadata = m.metadata.as_ref().and_then(ChunkMetadata::from_value);
            if metadata.is_none() {
                warn!("Dropping match {} without source/text metadata", m.id);
            }
            metadata.map(|metadata| Match {
                id: m.id,
                score: m.score,
                metadata,
            })
        })
        .collect()
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Match>> {
        let request = QueryRequest {
            vector,
            top_k,
            namespace,
            include_metadata: true,
            include_values: false,
            filter: filter.filter(|f| !f.is_empty()).map(MetadataFilter::to_pinecone),
        };

        let response: QueryResponse = self.post("/query", &request).await?;
        Ok(decode_matches(response.matches))
    }

    async fn upsert(&self, records: Vec<VectorRecord>, namespace: &str) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let request = UpsertRequest {
            vectors: &records,
            namespace,
        };
        let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;
        Ok(response.upserted_count)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        let request = DeleteRequest {
            delete_all: true,
            namespace,
        };
        let _: Value = self.post("/vectors/delete", &request).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let response: StatsResponse = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?;

        Ok(IndexStats {
            total_vector_count: response.total_vector_count,
            namespaces: response
                .namespaces
                .into_iter()
                .map(|(name, stats)| (name, stats.vector_count))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_matches_drops_untyped_metadata() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({
            "matches": [
                { "id": "a", "score": 0.91, "metadata": { "source": "policy.pdf", "text": "支払いは月末" } },
                { "id": "b", "score": 0.80, "metadata": { "text": "no source" } },
                { "id": "c", "score": 0.70 }
            ],
            "namespace": "company-docs"
        }))
        .unwrap();

        let matches = decode_matches(response.matches);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[0].metadata.source, "policy.pdf");
    }

    #[test]
    fn test_query_request_wire_format() {
        let filter = MetadataFilter::new().eq("source", "faq.txt");
        let request = QueryRequest {
            vector: &[0.1, 0.2],
            top_k: 3,
            namespace: "company-docs",
            include_metadata: true,
            include_values: false,
            filter: Some(filter.to_pinecone()),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topK"], 3);
        assert_eq!(json["includeMetadata"], true);
        assert_eq!(json["filter"]["source"]["$eq"], "faq.txt");
    }
}
