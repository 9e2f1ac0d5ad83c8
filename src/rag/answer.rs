//! Grounded answer generation

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::context::GroundingContext;
use super::RagOutcome;
use crate::llm::prompts::history_block;
use crate::llm::prompts::RagPrompts;
use crate::llm::TextGenerator;

/// Reply used when retrieval finds nothing relevant
pub const NOT_FOUND_MESSAGE: &str = "うーん、その情報は見当たらないですね…！ごめんなさい🥺";

/// Reply used when the generation call fails
pub const GENERATION_FAILED_MESSAGE: &str = "ごめんなさい、回答の生成中にエラーが発生しました🙇‍♀️";

/// Marker whose presence means the answer already cites its sources
pub const CITATION_MARKER: &str = "参考:";

const MARKUP_CHARS: [char; 3] = ['*', '#', '`'];

/// Generated reply and how it was reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub outcome: RagOutcome,
    pub text: String,
}

impl Answer {
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            outcome: RagOutcome::NotFound,
            text: NOT_FOUND_MESSAGE.to_string(),
        }
    }
}

/// Produces the final reply from a question and its grounding context
pub struct AnswerGenerator {
    generator: Arc<dyn TextGenerator>,
}

impl AnswerGenerator {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Bind context, recent conversation and question into the
    /// grounded-answer template
    #[must_use]
    pub fn build_prompt(question: &str, history: &str, grounding: &GroundingContext) -> String {
        RagPrompts::grounded_answer().render_pairs(&[
            ("context", grounding.context.as_str()),
            ("history", history_block(history)),
            ("question", question),
            ("not_found", NOT_FOUND_MESSAGE),
        ])
    }

    /// Generate and post-process an answer. Never fails; a call error yields
    /// the apology reply.
    pub async fn generate(
        &self,
        question: &str,
        history: &str,
        grounding: &GroundingContext,
    ) -> Answer {
        let prompt = Self::build_prompt(question, history, grounding);
        debug!(
            "Generating answer from {} chunks ({} chars of context)",
            grounding.chunks,
            grounding.context.chars().count()
        );

        match self.generator.generate(&prompt).await {
            Ok(raw) => {
                let text = finalize_answer(&raw, grounding);
                let outcome = if text == NOT_FOUND_MESSAGE {
                    RagOutcome::NotFound
                } else {
                    RagOutcome::Answered
                };
                Answer { outcome, text }
            }
            Err(e) => {
                warn!("Answer generation failed: {}", e);
                Answer {
                    outcome: RagOutcome::Errored,
                    text: GENERATION_FAILED_MESSAGE.to_string(),
                }
            }
        }
    }
}

/// Remove Markdown emphasis, heading and code characters
#[must_use]
pub fn strip_markup(text: &str) -> String {
    text.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect()
}

/// Strip markup and append the citation unless the model already cited or
/// declined to answer
#[must_use]
pub fn finalize_answer(raw: &str, grounding: &GroundingContext) -> String {
    let text = strip_markup(raw).trim().to_string();

    if text == NOT_FOUND_MESSAGE || text.contains(CITATION_MARKER) {
        return text;
    }
    format!("{}\n{}", text, grounding.citation())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::ChatRagError;
    use crate::errors::Result;

    struct Fixed {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .ok_or_else(|| ChatRagError::LlmError("quota exceeded".to_string()))
        }
    }

    fn grounding(sources: &[&str]) -> GroundingContext {
        GroundingContext {
            context: "[出典: policy.pdf]\n支払いは月末締め".to_string(),
            chunks: 1,
            sources: sources.iter().map(|s| (*s).to_string()).collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("## **支払い**は`月末`です"), " 支払いは月末です");
    }

    #[test]
    fn test_finalize_appends_citation() {
        let text = finalize_answer("**月末締め**です！", &grounding(&["policy.pdf"]));
        assert_eq!(text, "月末締めです！\n(参考: policy.pdf)");
    }

    #[test]
    fn test_finalize_keeps_existing_citation_and_not_found() {
        let cited = "月末締めです (参考: policy.pdf)";
        assert_eq!(finalize_answer(cited, &grounding(&["policy.pdf"])), cited);

        let declined = format!("  {NOT_FOUND_MESSAGE}\n");
        assert_eq!(
            finalize_answer(&declined, &grounding(&["policy.pdf"])),
            NOT_FOUND_MESSAGE
        );
    }

    #[test]
    fn test_prompt_contains_context_and_question() {
        let prompt = AnswerGenerator::build_prompt("締め日は？", "", &grounding(&["policy.pdf"]));
        assert!(prompt.contains("支払いは月末締め"));
        assert!(prompt.contains("締め日は？"));
        assert!(prompt.contains(NOT_FOUND_MESSAGE));
        assert!(prompt.contains("Recent conversation:\n(none)"));

        let prompt = AnswerGenerator::build_prompt(
            "じゃあ交通費は？",
            "User: 経費の締め日は？\nAssistant: 月末です",
            &grounding(&["policy.pdf"]),
        );
        assert!(prompt.contains("User: 経費の締め日は？\nAssistant: 月末です"));
    }

    #[tokio::test]
    async fn test_generate_outcomes() {
        let ok = Arc::new(Fixed {
            reply: Some("月末です".to_string()),
            calls: AtomicUsize::new(0),
        });
        let answer = AnswerGenerator::new(ok.clone())
            .generate("締め日は？", "", &grounding(&["policy.pdf"]))
            .await;
        assert_eq!(answer.outcome, RagOutcome::Answered);
        assert!(answer.text.ends_with("(参考: policy.pdf)"));
        assert_eq!(ok.calls.load(Ordering::SeqCst), 1);

        let declined = Arc::new(Fixed {
            reply: Some(NOT_FOUND_MESSAGE.to_string()),
            calls: AtomicUsize::new(0),
        });
        let answer = AnswerGenerator::new(declined)
            .generate("締め日は？", "", &grounding(&["policy.pdf"]))
            .await;
        assert_eq!(answer, Answer::not_found());

        let failing = Arc::new(Fixed {
            reply: None,
            calls: AtomicUsize::new(0),
        });
        let answer = AnswerGenerator::new(failing)
            .generate("締め日は？", "", &grounding(&["policy.pdf"]))
            .await;
        assert_eq!(answer.outcome, RagOutcome::Errored);
        assert_eq!(answer.text, GENERATION_FAILED_MESSAGE);
    }
}
