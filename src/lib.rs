//! Chat webhook service answering questions from company documents with
//! multi-query retrieval-augmented generation.

pub mod api;
pub mod chat;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod session;
pub mod vector;

pub use config::AppConfig;
pub use errors::*;
