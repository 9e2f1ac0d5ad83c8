//! Embeddings generation module
//!
//! Text is embedded with an intent tag: documents being indexed and queries
//! being searched are embedded differently by the provider.
//!
//! - [`Embedder`]: the remote capability, returns typed errors
//! - [`EmbeddingClient`]: Gemini `embedContent` implementation
//! - [`EmbeddingService`]: the degrading wrapper the RAG pipeline uses; empty
//!   text and failed calls both yield an empty vector
//!
//! # Examples
//!
//! ```rust,no_run
//! use chatrag::config::AppConfig;
//! use chatrag::embeddings::EmbeddingService;
//! use chatrag::embeddings::TaskType;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.embed("支払い方法", TaskType::Query).await;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod generator;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

pub use client::EmbeddingClient;
pub use generator::EmbeddingService;

use crate::errors::Result;

/// Maximum batch size accepted by `batchEmbedContents`
pub const MAX_BATCH_SIZE: usize = 100;

/// What an embedding will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    /// Fixed content being written to the index
    Document,
    /// Transient search input
    Query,
}

impl TaskType {
    /// Wire name understood by the embedding API
    #[must_use]
    pub const fn as_api_str(self) -> &'static str {
        match self {
            Self::Document => "RETRIEVAL_DOCUMENT",
            Self::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// A remote embedding call: `embed(text, task_type) -> vector`
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>>;

    /// Embed several texts; providers with a batch endpoint override this
    async fn embed_batch(&self, texts: &[String], task: TaskType) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text, task).await?);
        }
        Ok(embeddings)
    }
}
