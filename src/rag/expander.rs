//! Multi-query expansion

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::llm::prompts::history_block;
use crate::llm::prompts::RagPrompts;
use crate::llm::TextGenerator;

/// Turns one question into the question plus a few paraphrases
pub struct QueryExpander {
    generator: Arc<dyn TextGenerator>,
    expansions: usize,
}

impl QueryExpander {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, expansions: usize) -> Self {
        Self {
            generator,
            expansions,
        }
    }

    /// Expand `question`, reading `history` to resolve follow-up references.
    /// The result is never empty and always starts with `question`; any
    /// generation failure falls back to `[question]`.
    pub async fn expand(&self, question: &str, history: &str) -> Vec<String> {
        if self.expansions == 0 || question.trim().is_empty() {
            return vec![question.to_string()];
        }

        let count = self.expansions.to_string();
        let prompt = RagPrompts::query_expansion().render_pairs(&[
            ("count", count.as_str()),
            ("history", history_block(history)),
            ("question", question),
        ]);

        match self.generator.generate(&prompt).await {
            Ok(raw) => {
                let queries = parse_expansions(question, &raw, self.expansions);
                debug!("Expanded into {} queries: {:?}", queries.len(), queries);
                queries
            }
            Err(e) => {
                warn!("Query expansion failed, using the original question: {}", e);
                vec![question.to_string()]
            }
        }
    }
}

/// Parse a line-delimited list of rewrites, deduplicated, original first
pub fn parse_expansions(question: &str, raw: &str, limit: usize) -> Vec<String> {
    let mut queries = vec![question.to_string()];

    for line in raw.lines() {
        if queries.len() > limit {
            break;
        }
        let candidate = strip_bullet(line);
        if candidate.is_empty()
            || is_preamble(candidate)
            || queries.iter().any(|q| q == candidate)
        {
            continue;
        }
        queries.push(candidate.to_string());
    }

    queries
}

/// Remove list markers such as `- `, `• `, `1. `, `2) ` or `3、`, then
/// emphasis and quotes around the query
fn strip_bullet(line: &str) -> &str {
    let line = line
        .trim()
        .trim_start_matches(['-', '*', '•', '・', '+'])
        .trim_start();

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    let line = if digits > 0 {
        line[digits..]
            .strip_prefix(['.', ')', '、', ':', '．'])
            .map_or(line, str::trim_start)
    } else {
        line
    };

    line.trim_matches(|c: char| matches!(c, '"' | '「' | '」' | '*'))
        .trim()
}

/// Lead-in lines like "Here are 3 queries:"
fn is_preamble(line: &str) -> bool {
    line.ends_with([':', '：'])
}
