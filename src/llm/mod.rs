//! Generative text module
//!
//! The RAG pipeline only needs one capability from a language model: turn a
//! prompt into text. That capability is the [`TextGenerator`] trait, with
//! [`LlmService`] as the Gemini-backed implementation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chatrag::config::AppConfig;
//! use chatrag::llm::LlmService;
//! use chatrag::llm::TextGenerator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let llm = LlmService::new(&config)?;
//!
//!     let text = llm.generate("Say hello in Japanese").await?;
//!     println!("{text}");
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod prompts;

use async_trait::async_trait;

pub use client::LlmService;
pub use prompts::PromptTemplate;

use crate::errors::Result;

/// A remote text-generation call: `generate(prompt) -> text`
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
