//! Context assembly from retrieved chunks

use std::collections::BTreeSet;

use crate::vector::Match;

/// Separator placed between formatted chunks
pub const CHUNK_DELIMITER: &str = "\n\n---\n\n";

/// Default relevance cut-off; matches must score strictly above it
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.55;

/// Grounding material for one question
#[derive(Debug, Clone, PartialEq)]
pub struct GroundingContext {
    /// Formatted chunks joined with [`CHUNK_DELIMITER`]
    pub context: String,
    /// Number of chunks that passed the threshold
    pub chunks: usize,
    /// Unique source filenames, sorted
    pub sources: BTreeSet<String>,
}

impl GroundingContext {
    /// `(参考: a, b)` rendering of the sources
    #[must_use]
    pub fn citation(&self) -> String {
        let sources: Vec<&str> = self.sources.iter().map(String::as_str).collect();
        format!("(参考: {})", sources.join(", "))
    }
}

/// Filters matches by score and formats the survivors into prompt context
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    threshold: f32,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl ContextAssembler {
    #[must_use]
    pub const fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Build context from `matches` in input order.
    ///
    /// Returns `None` when no match scores above the threshold.
    #[must_use]
    pub fn assemble(&self, matches: &[Match]) -> Option<GroundingContext> {
        let passing: Vec<&Match> = matches
            .iter()
            .filter(|m| m.score > self.threshold)
            .collect();

        if passing.is_empty() {
            return None;
        }

        let chunks: Vec<String> = passing.iter().map(|m| format_chunk(m)).collect();
        let sources = passing
            .iter()
            .map(|m| m.metadata.source.clone())
            .collect();

        Some(GroundingContext {
            context: chunks.join(CHUNK_DELIMITER),
            chunks: chunks.len(),
            sources,
        })
    }
}

/// `[出典: source / chapter / title]` header followed by the chunk text
#[must_use]
pub fn format_chunk(m: &Match) -> String {
    let metadata = &m.metadata;
    let mut locator = vec![metadata.source.as_str()];
    locator.extend(metadata.chapter.as_deref());
    locator.extend(metadata.title.as_deref());

    format!("[出典: {}]\n{}", locator.join(" / "), metadata.text.trim())
}
