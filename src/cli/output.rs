//! CLI output formatting utilities

use crate::ingest::IngestStats;
use crate::rag::RagResponse;
use crate::AppConfig;

/// Safely truncate a string at character boundary (not byte boundary)
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Hide all but the last four characters of a secret
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return "(not set)".to_string();
    }
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}

/// Print a RAG answer, optionally with retrieval details
pub fn print_rag_response(response: &RagResponse, details: bool) {
    println!("\n💬 {}\n", response.answer);

    if !details {
        return;
    }

    println!("📎 Outcome: {:?}", response.outcome);
    println!("🔀 Queries ({}):", response.expanded_queries.len());
    for q in &response.expanded_queries {
        println!("  - {q}");
    }
    println!("📚 Matches ({}):", response.matches.len());
    for (idx, m) in response.matches.iter().enumerate() {
        println!(
            "  {}. [{:.3}] {} | {}",
            idx + 1,
            m.score,
            m.metadata.source,
            truncate_str(&m.metadata.text.replace('\n', " "), 60)
        );
    }
}

/// Print ingestion counters
pub fn print_ingest_stats(stats: &IngestStats, namespace: &str) {
    println!("📄 Documents: {}", stats.documents);
    println!("✂️  Chunks: {}", stats.chunks);
    println!("⬆️  Upserted: {}", stats.upserted);
    if stats.skipped > 0 {
        println!("⏭️  Skipped (no embedding): {}", stats.skipped);
    }
    println!("🗂️  Namespace: {namespace}");
    if let Some(total) = stats.total_vectors {
        println!("🔢 Index vector count: {total}");
    }
}

/// Print configuration
pub fn print_config(config: &AppConfig, show_secrets: bool) {
    let secret = |s: &str| {
        if show_secrets {
            s.to_string()
        } else {
            mask_secret(s)
        }
    };

    println!("📋 chatrag Configuration:");
    println!();

    println!("🤖 Gemini:");
    println!("  Endpoint: {}", config.gemini.endpoint);
    println!("  Generation model: {}", config.generation_model());
    println!("  Embedding model: {}", config.embedding_model());
    println!("  Key: {}", secret(config.gemini_api_key()));
    println!();

    println!("🌲 Pinecone:");
    println!("  Index host: {}", config.pinecone.index_host);
    println!("  Key: {}", secret(&config.pinecone.api_key));
    println!();

    println!("🔍 RAG:");
    println!("  Namespace: {}", config.namespace());
    println!("  Similarity threshold: {}", config.similarity_threshold());
    println!("  Top K per query: {}", config.rag.top_k);
    println!("  Max results: {}", config.rag.max_results);
    println!("  Expansions: {}", config.rag.expansions);
    println!();

    println!("💾 Session:");
    println!("  Backend: {:?}", config.session.backend);
    println!("  TTL: {}s", config.session.ttl_secs);
    println!("  Max history: {}", config.session.max_history);
    println!();

    println!("🌐 Server: {}", config.bind_address());
    println!("📝 Logging: {} (dir: {})", config.logging.level, config.logging.dir);
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}
