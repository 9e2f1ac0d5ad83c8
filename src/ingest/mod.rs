//! Document ingestion: load, chunk, embed and upsert into the vector index

pub mod chunker;
pub mod loader;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing::warn;
use uuid::Uuid;

pub use chunker::split_text;
pub use loader::load_documents;
pub use loader::Document;

use crate::config::IngestConfig;
use crate::embeddings::EmbeddingService;
use crate::embeddings::TaskType;
use crate::errors::Result;
use crate::vector::ChunkMetadata;
use crate::vector::VectorIndex;
use crate::vector::VectorRecord;

/// A chunk of a source document awaiting embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChunk {
    pub source: String,
    pub text: String,
}

/// Counters reported after an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub documents: usize,
    pub chunks: usize,
    pub upserted: usize,
    /// Chunks dropped because no embedding could be produced
    pub skipped: usize,
    /// Index-wide vector count after the run, when the index reports it
    pub total_vectors: Option<u64>,
}

/// Split every document into overlapping chunks
#[must_use]
pub fn chunk_documents(documents: &[Document], chunk_size: usize, overlap: usize) -> Vec<DocumentChunk> {
    documents
        .iter()
        .flat_map(|doc| {
            split_text(&doc.text, chunk_size, overlap)
                .into_iter()
                .map(|text| DocumentChunk {
                    source: doc.source.clone(),
                    text,
                })
        })
        .collect()
}

/// Writes document chunks into one namespace of a vector index
pub struct Indexer {
    embeddings: EmbeddingService,
    index: Arc<dyn VectorIndex>,
    config: IngestConfig,
    namespace: String,
}

impl Indexer {
    #[must_use]
    pub fn new(
        embeddings: EmbeddingService,
        index: Arc<dyn VectorIndex>,
        config: IngestConfig,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            embeddings,
            index,
            config,
            namespace: namespace.into(),
        }
    }

    /// Index every supported document under `dir`.
    ///
    /// With `clear_existing`, the namespace is emptied first; a failure to
    /// clear is logged and ignored.
    pub async fn index_directory(&self, dir: &Path, clear_existing: bool) -> Result<IngestStats> {
        if clear_existing {
            info!("Clearing namespace '{}'", self.namespace);
            if let Err(e) = self.index.delete_namespace(&self.namespace).await {
                warn!("Failed to clear namespace '{}' (fine on a first run): {}", self.namespace, e);
            }
        }

        let documents = load_documents(dir)?;
        let chunks = chunk_documents(&documents, self.config.chunk_size, self.config.chunk_overlap);
        info!("Loaded {} documents into {} chunks", documents.len(), chunks.len());

        let mut stats = self.index_chunks(&chunks).await?;
        stats.documents = documents.len();

        stats.total_vectors = match self.index.stats().await {
            Ok(index_stats) => Some(index_stats.total_vector_count),
            Err(e) => {
                warn!("Failed to read index stats: {}", e);
                None
            }
        };

        info!(
            "Ingestion complete: {} upserted, {} skipped into '{}'",
            stats.upserted, stats.skipped, self.namespace
        );
        Ok(stats)
    }

    /// Embed and upsert `chunks` in batches, pausing between batches
    pub async fn index_chunks(&self, chunks: &[DocumentChunk]) -> Result<IngestStats> {
        let mut stats = IngestStats {
            chunks: chunks.len(),
            ..IngestStats::default()
        };
        let batch_size = self.config.batch_size.max(1);
        let total_batches = chunks.len().div_ceil(batch_size);

        for (batch_idx, batch) in chunks.chunks(batch_size).enumerate() {
            info!(
                "Processing batch {}/{} ({} chunks)",
                batch_idx + 1,
                total_batches,
                batch.len()
            );

            let vectors = self.embed_batch(batch).await;
            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(vectors)
                .filter_map(|(chunk, values)| {
                    if values.is_empty() {
                        return None;
                    }
                    Some(VectorRecord {
                        id: Uuid::new_v4().to_string(),
                        values,
                        metadata: ChunkMetadata::new(chunk.source.clone(), chunk.text.clone()),
                    })
                })
                .collect();

            stats.skipped += batch.len() - records.len();
            if !records.is_empty() {
                let written = records.len();
                self.index.upsert(records, &self.namespace).await?;
                stats.upserted += written;
            }

            if batch_idx + 1 < total_batches && self.config.batch_pause_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_pause_ms)).await;
            }
        }

        Ok(stats)
    }

    /// One vector per chunk, empty where embedding failed
    async fn embed_batch(&self, batch: &[DocumentChunk]) -> Vec<Vec<f32>> {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

        match self.embeddings.try_embed_batch(&texts, TaskType::Document).await {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!("Batch embedding failed, falling back to single requests: {}", e);
                let mut vectors = Vec::with_capacity(texts.len());
                for text in &texts {
                    vectors.push(self.embeddings.embed(text, TaskType::Document).await);
                }
                vectors
            }
        }
    }
}
