//! RAG (Retrieval-Augmented Generation) module
//!
//! Answers questions about company documents:
//! - Multi-query expansion of the question
//! - Per-query embedding and vector search, run concurrently
//! - Best-score fusion across queries
//! - Threshold filtering and context assembly with sources
//! - Grounded answer generation with a citation
//!
//! # Examples
//!
//! ```rust,no_run
//! use chatrag::config::AppConfig;
//! use chatrag::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RagService::new(&config)?;
//!
//!     let response = service.query("経費精算の締め日はいつですか？").await;
//!     println!("Answer: {}", response.answer);
//!     println!("Sources: {:?}", response.sources);
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod context;
pub mod expander;
pub mod fusion;
pub mod pipeline;

pub use answer::AnswerGenerator;
pub use answer::GENERATION_FAILED_MESSAGE;
pub use answer::NOT_FOUND_MESSAGE;
pub use context::ContextAssembler;
pub use context::GroundingContext;
pub use expander::QueryExpander;
pub use fusion::FusedMatchSet;
pub use pipeline::RagOptions;
pub use pipeline::RagQuery;
pub use pipeline::RagResponse;
pub use pipeline::RagService;
use serde::Deserialize;
use serde::Serialize;

/// How a query finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagOutcome {
    /// Grounded answer with a citation
    Answered,
    /// Nothing relevant was found
    NotFound,
    /// Generation failed; the reply is an apology
    Errored,
}
