//! Command handlers

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::api::serve_api;
use crate::cli::output::print_config;
use crate::cli::output::print_info;
use crate::cli::output::print_ingest_stats;
use crate::cli::output::print_rag_response;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::embeddings::EmbeddingService;
use crate::ingest::Indexer;
use crate::rag::RagOutcome;
use crate::rag::RagQuery;
use crate::rag::RagService;
use crate::vector::PineconeIndex;
use crate::AppConfig;
use crate::Result;

pub async fn handle_serve(config: &AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    serve_api(config, host, port).await
}

pub async fn handle_ask(
    config: &AppConfig,
    question: String,
    threshold: Option<f32>,
    details: bool,
) -> Result<()> {
    print_info(&format!("🤖 Question: \"{question}\""));

    let service = RagService::new(config)?;
    let mut query = RagQuery::new(question);
    if let Some(threshold) = threshold {
        query = query.with_threshold(threshold);
    }

    let response = service.query_with_options(query).await;
    print_rag_response(&response, details);

    if response.outcome == RagOutcome::Errored {
        print_warning("Answer generation failed; see logs for details");
    }
    Ok(())
}

pub async fn handle_index(config: &AppConfig, dir: Option<String>, keep_existing: bool) -> Result<()> {
    let dir = PathBuf::from(dir.unwrap_or_else(|| config.ingest.documents_dir.clone()));
    print_info(&format!("📂 Indexing documents from {}", dir.display()));

    let indexer = Indexer::new(
        EmbeddingService::new(config)?,
        Arc::new(PineconeIndex::from_app_config(config)?),
        config.ingest.clone(),
        config.namespace(),
    );

    let stats = indexer.index_directory(&dir, !keep_existing).await?;
    info!("Indexed {} chunks from {}", stats.upserted, dir.display());

    if stats.chunks == 0 {
        print_warning("No documents to index");
    } else {
        print_success("Indexing complete");
    }
    print_ingest_stats(&stats, config.namespace());
    Ok(())
}

pub fn handle_config(config: &AppConfig, show: bool) {
    print_config(config, show);
}
