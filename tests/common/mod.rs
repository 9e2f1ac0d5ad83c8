//! Hand-written collaborators shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chatrag::embeddings::Embedder;
use chatrag::embeddings::EmbeddingService;
use chatrag::embeddings::TaskType;
use chatrag::llm::TextGenerator;
use chatrag::rag::RagOptions;
use chatrag::rag::RagService;
use chatrag::vector::ChunkMetadata;
use chatrag::vector::IndexStats;
use chatrag::vector::Match;
use chatrag::vector::MetadataFilter;
use chatrag::vector::VectorIndex;
use chatrag::vector::VectorRecord;
use chatrag::ChatRagError;
use chatrag::Result;

/// Returns a fixed reply (or error) and records every prompt
pub struct ScriptedGenerator {
    reply: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| ChatRagError::LlmError("generator unavailable".to_string()))
    }
}

/// Looks texts up in a fixed table; unknown texts fail
#[derive(Default)]
pub struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    async fn embed(&self, text: &str, _task: TaskType) -> Result<Vec<f32>> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| ChatRagError::EmbeddingError(format!("no vector for {text}")))
    }
}

/// Answers each known query vector with canned matches or an error
#[derive(Default)]
pub struct CannedIndex {
    responses: Vec<(Vec<f32>, Option<Vec<Match>>)>,
    queries: AtomicUsize,
}

impl CannedIndex {
    pub fn with(mut self, vector: Vec<f32>, matches: Vec<Match>) -> Self {
        self.responses.push((vector, Some(matches)));
        self
    }

    pub fn failing_for(mut self, vector: Vec<f32>) -> Self {
        self.responses.push((vector, None));
        self
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for CannedIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        _namespace: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Match>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match self.responses.iter().find(|(key, _)| key.as_slice() == vector) {
            Some((_, Some(matches))) => Ok(matches
                .iter()
                .filter(|m| filter.map_or(true, |f| f.matches(&m.metadata)))
                .take(top_k)
                .cloned()
                .collect()),
            Some((_, None)) => Err(ChatRagError::VectorIndexError("503 Service Unavailable".to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn upsert(&self, records: Vec<VectorRecord>, _namespace: &str) -> Result<usize> {
        Ok(records.len())
    }

    async fn delete_namespace(&self, _namespace: &str) -> Result<()> {
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats> {
        Ok(IndexStats::default())
    }
}

pub fn chunk(id: &str, score: f32, source: &str, text: &str) -> Match {
    Match {
        id: id.to_string(),
        score,
        metadata: ChunkMetadata::new(source, text),
    }
}

pub fn rag_service(
    expansion: Arc<ScriptedGenerator>,
    answer: Arc<ScriptedGenerator>,
    embedder: TableEmbedder,
    index: Arc<CannedIndex>,
    expansions: usize,
) -> RagService {
    let options = RagOptions {
        expansions,
        ..RagOptions::default()
    };
    RagService::from_services(
        expansion,
        answer,
        EmbeddingService::from_embedder(Arc::new(embedder)),
        index,
        options,
    )
}
