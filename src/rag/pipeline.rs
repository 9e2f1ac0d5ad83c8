//! Complete RAG pipeline: Expand -> Retrieve -> Fuse -> Threshold -> Generate

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::answer::Answer;
use super::answer::AnswerGenerator;
use super::context::ContextAssembler;
use super::expander::QueryExpander;
use super::fusion::fuse;
use super::RagOutcome;
use crate::config::AppConfig;
use crate::config::RagConfig;
use crate::embeddings::EmbeddingService;
use crate::embeddings::TaskType;
use crate::errors::Result;
use crate::llm::LlmService;
use crate::llm::TextGenerator;
use crate::session::transcript;
use crate::session::ChatMessage;
use crate::session::History;
use crate::vector::Match;
use crate::vector::MetadataFilter;
use crate::vector::PineconeIndex;
use crate::vector::VectorIndex;

/// Retrieval tunables
#[derive(Debug, Clone)]
pub struct RagOptions {
    pub similarity_threshold: f32,
    pub top_k: usize,
    pub max_results: usize,
    pub expansions: usize,
    pub namespace: String,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self::from(&RagConfig::default())
    }
}

impl From<&RagConfig> for RagOptions {
    fn from(config: &RagConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            top_k: config.top_k,
            max_results: config.max_results,
            expansions: config.expansions,
            namespace: config.namespace.clone(),
        }
    }
}

/// Complete RAG service
pub struct RagService {
    expander: QueryExpander,
    embeddings: EmbeddingService,
    index: Arc<dyn VectorIndex>,
    answerer: AnswerGenerator,
    options: RagOptions,
}

impl RagService {
    /// Create a RAG service backed by Gemini and Pinecone
    ///
    /// # Errors
    /// - Missing Gemini or Pinecone credentials
    /// - HTTP client construction failures
    pub fn new(config: &AppConfig) -> Result<Self> {
        let llm: Arc<dyn TextGenerator> = Arc::new(LlmService::new(config)?);
        let embeddings = EmbeddingService::new(config)?;
        let index: Arc<dyn VectorIndex> = Arc::new(PineconeIndex::from_app_config(config)?);

        Ok(Self::from_services(
            llm.clone(),
            llm,
            embeddings,
            index,
            RagOptions::from(&config.rag),
        ))
    }

    /// Create from existing services. Expansion and answering may use
    /// different generators.
    #[must_use]
    pub fn from_services(
        expansion_generator: Arc<dyn TextGenerator>,
        answer_generator: Arc<dyn TextGenerator>,
        embeddings: EmbeddingService,
        index: Arc<dyn VectorIndex>,
        options: RagOptions,
    ) -> Self {
        Self {
            expander: QueryExpander::new(expansion_generator, options.expansions),
            embeddings,
            index,
            answerer: AnswerGenerator::new(answer_generator),
            options,
        }
    }

    /// Answer a question with the configured threshold
    pub async fn query(&self, question: &str) -> RagResponse {
        self.query_with_options(RagQuery::new(question)).await
    }

    /// Answer a question. Collaborator failures degrade locally, so this
    /// always produces a reply.
    pub async fn query_with_options(&self, query: RagQuery) -> RagResponse {
        info!("Processing RAG query: {}", query.question);
        let threshold = query
            .threshold
            .unwrap_or(self.options.similarity_threshold);
        let history = transcript(&query.history);

        debug!("Step 1: Expanding query");
        let queries = self.expander.expand(&query.question, &history).await;

        debug!("Step 2: Retrieving for {} queries", queries.len());
        let branches = join_all(
            queries
                .iter()
                .map(|q| self.retrieve(q, query.filter.as_ref())),
        )
        .await;

        debug!("Step 3: Fusing results");
        let matches = fuse(branches).into_ranked(self.options.max_results);
        debug!("Fused {} matches", matches.len());

        debug!("Step 4: Assembling context (threshold {})", threshold);
        let Some(grounding) = ContextAssembler::new(threshold).assemble(&matches) else {
            info!("No match above threshold, answering not-found");
            return RagResponse::from_answer(
                query.question,
                Answer::not_found(),
                queries,
                matches,
                None,
            );
        };

        debug!("Step 5: Generating answer");
        let answer = self
            .answerer
            .generate(&query.question, &history, &grounding)
            .await;
        info!("RAG query completed: {:?}", answer.outcome);

        let mut response = RagResponse::from_answer(
            query.question,
            answer,
            queries,
            matches,
            Some(grounding.context),
        );
        if response.outcome == RagOutcome::Answered {
            response.sources = grounding.sources.into_iter().collect();
        }
        response
    }

    /// Embed one query and search the index; any failure yields no matches
    async fn retrieve(&self, query: &str, filter: Option<&MetadataFilter>) -> Vec<Match> {
        let vector = self.embeddings.embed(query, TaskType::Query).await;
        if vector.is_empty() {
            debug!("No embedding for query, skipping branch: {}", query);
            return Vec::new();
        }

        match self
            .index
            .query(&vector, self.options.top_k, &self.options.namespace, filter)
            .await
        {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Vector query failed for {:?}: {}", query, e);
                Vec::new()
            }
        }
    }
}

/// RAG query configuration
#[derive(Debug, Clone)]
pub struct RagQuery {
    pub question: String,
    /// Overrides the configured similarity threshold
    pub threshold: Option<f32>,
    pub filter: Option<MetadataFilter>,
    /// Recent conversation turns, oldest first
    pub history: Vec<ChatMessage>,
}

impl RagQuery {
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            threshold: None,
            filter: None,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Carry the newest `messages` entries of `history` into the prompts
    #[must_use]
    pub fn with_history(mut self, history: &History, messages: usize) -> Self {
        self.history = history.recent(messages).to_vec();
        self
    }
}

/// RAG response
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    pub query: String,
    pub answer: String,
    pub outcome: RagOutcome,
    /// Sources cited in the answer, sorted
    pub sources: Vec<String>,
    /// Fused matches, best first, before thresholding
    pub matches: Vec<Match>,
    pub expanded_queries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl RagResponse {
    fn from_answer(
        query: String,
        answer: Answer,
        expanded_queries: Vec<String>,
        matches: Vec<Match>,
        context: Option<String>,
    ) -> Self {
        Self {
            query,
            answer: answer.text,
            outcome: answer.outcome,
            sources: Vec::new(),
            matches,
            expanded_queries,
            context,
        }
    }
}
