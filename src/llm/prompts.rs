//! Prompt templates for query expansion and grounded answering

use std::collections::HashMap;

/// Template for generating prompts
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables.
    ///
    /// Single left-to-right pass: substituted values are never re-scanned,
    /// and placeholders without a value are kept as written.
    #[must_use]
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };

            let name = &after[..end];
            match values.get(name) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Render from borrowed key/value pairs
    #[must_use]
    pub fn render_pairs(&self, pairs: &[(&str, &str)]) -> String {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.render(&values)
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next(); // skip second '{'
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                } else {
                    var_name.push(ch);
                    chars.next();
                }
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

/// Stand-in for an empty conversation transcript
pub const NO_HISTORY: &str = "(none)";

/// Transcript text to bind as `{{history}}`
#[must_use]
pub fn history_block(transcript: &str) -> &str {
    if transcript.trim().is_empty() {
        NO_HISTORY
    } else {
        transcript
    }
}

/// Standard RAG prompt templates
pub struct RagPrompts;

impl RagPrompts {
    /// Rewrite a question into several retrieval queries, one per line
    #[must_use]
    pub fn query_expansion() -> PromptTemplate {
        PromptTemplate::new(
            r"You help a document search system find relevant passages.

Rewrite the user's question into {{count}} different search queries.
Each query should approach the question from a different angle: use synonyms,
more formal wording, or the key terms a policy document would contain.
Write the queries in the same language as the question.

If the question refers to the recent conversation (for example 'that one' or 'what about...'),
resolve the reference so every query stands on its own.

Output exactly one query per line with no numbering, bullets or explanations.

Recent conversation:
{{history}}

Question: {{question}}",
        )
    }

    /// Answer a question strictly from retrieved context
    #[must_use]
    pub fn grounded_answer() -> PromptTemplate {
        PromptTemplate::new(
            r"You are an assistant that answers questions about internal documents.

Reference information:
{{context}}

Recent conversation:
{{history}}

Question: {{question}}

Rules:
1. Answer ONLY from the reference information above. Do not use outside knowledge.
   Use the recent conversation only to understand what the question refers to.
2. If the reference information does not answer the question, reply with exactly this text and nothing else:
{{not_found}}
3. Keep the answer short and friendly, in the language of the question.
4. Do not use Markdown formatting.

Answer:",
        )
    }
}
