//! Vector index contract and implementations
//!
//! The RAG pipeline consumes only [`VectorIndex::query`]; ingestion also uses
//! `upsert`, `delete_namespace` and `stats`.

pub mod memory;
pub mod pinecone;

use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

pub use memory::InMemoryIndex;
pub use pinecone::PineconeIndex;

use crate::errors::Result;

/// Typed metadata stored next to every chunk vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Document filename the chunk came from
    pub source: String,
    /// Chunk content
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ChunkMetadata {
    #[must_use]
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            chapter: None,
            title: None,
        }
    }

    /// Decode an untyped metadata object; `None` if `source` or `text` is missing
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let source = object.get("source")?.as_str()?.to_string();
        let text = object.get("text")?.as_str()?.to_string();

        Some(Self {
            source,
            text,
            chapter: object.get("chapter").and_then(scalar_to_string),
            title: object.get("title").and_then(scalar_to_string),
        })
    }

    /// Look up a field by name, used by metadata filters
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "source" => Some(&self.source),
            "text" => Some(&self.text),
            "chapter" => self.chapter.as_deref(),
            "title" => self.title.as_deref(),
            _ => None,
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One similarity-search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    /// Higher is more relevant
    pub score: f32,
    pub metadata: ChunkMetadata,
}

/// A vector to write into the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Equality filter over metadata fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    equals: BTreeMap<String, String>,
}

impl MetadataFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    #[must_use]
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        self.equals
            .iter()
            .all(|(field, value)| metadata.field(field) == Some(value.as_str()))
    }

    /// Render as a Pinecone filter expression
    #[must_use]
    pub fn to_pinecone(&self) -> Value {
        let clauses: serde_json::Map<String, Value> = self
            .equals
            .iter()
            .map(|(field, value)| (field.clone(), serde_json::json!({ "$eq": value })))
            .collect();
        Value::Object(clauses)
    }
}

/// Vector counts reported by the index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vector_count: u64,
    pub namespaces: HashMap<String, u64>,
}

/// A similarity-search index partitioned into namespaces
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `top_k` nearest items, ordered by descending score
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Match>>;

    async fn upsert(&self, records: Vec<VectorRecord>, namespace: &str) -> Result<usize>;

    async fn delete_namespace(&self, namespace: &str) -> Result<()>;

    async fn stats(&self) -> Result<IndexStats>;
}
