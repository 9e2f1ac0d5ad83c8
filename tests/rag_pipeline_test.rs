mod common;

use std::sync::Arc;

use chatrag::rag::RagOutcome;
use chatrag::rag::RagQuery;
use chatrag::rag::GENERATION_FAILED_MESSAGE;
use chatrag::rag::NOT_FOUND_MESSAGE;
use chatrag::vector::MetadataFilter;
use common::chunk;
use common::rag_service;
use common::CannedIndex;
use common::ScriptedGenerator;
use common::TableEmbedder;

const QUESTION: &str = "支払い方法は？";

#[tokio::test]
async fn test_fusion_keeps_best_score_across_paraphrases() {
    let expansion = ScriptedGenerator::replying("1. 決済手段\n2. 請求書払い");
    let answer = ScriptedGenerator::replying("**銀行振込**か請求書払いです");
    let embedder = TableEmbedder::default()
        .with(QUESTION, vec![1.0, 0.0, 0.0])
        .with("決済手段", vec![0.0, 1.0, 0.0])
        .with("請求書払い", vec![0.0, 0.0, 1.0]);
    let index = Arc::new(
        CannedIndex::default()
            .with(
                vec![1.0, 0.0, 0.0],
                vec![
                    chunk("shared", 0.6, "policy.pdf", "支払いは銀行振込"),
                    chunk("faq-1", 0.7, "faq.txt", "請求書払いも可能"),
                ],
            )
            .with(
                vec![0.0, 1.0, 0.0],
                vec![chunk("shared", 0.8, "policy.pdf", "支払いは銀行振込")],
            )
            .failing_for(vec![0.0, 0.0, 1.0]),
    );

    let service = rag_service(expansion.clone(), answer.clone(), embedder, index.clone(), 3);
    let response = service.query(QUESTION).await;

    assert_eq!(expansion.calls(), 1);
    assert_eq!(index.queries(), 3);
    assert_eq!(response.expanded_queries, vec![QUESTION, "決済手段", "請求書払い"]);

    assert_eq!(response.matches.len(), 2);
    assert_eq!(response.matches[0].id, "shared");
    assert!((response.matches[0].score - 0.8).abs() < f32::EPSILON);
    assert_eq!(response.matches[1].id, "faq-1");

    assert_eq!(response.outcome, RagOutcome::Answered);
    assert_eq!(answer.calls(), 1);
    assert_eq!(response.sources, vec!["faq.txt", "policy.pdf"]);
    assert_eq!(
        response.answer,
        "銀行振込か請求書払いです\n(参考: faq.txt, policy.pdf)"
    );
}

#[tokio::test]
async fn test_nothing_above_threshold_skips_generation() {
    let expansion = ScriptedGenerator::replying("");
    let answer = ScriptedGenerator::replying("should never be used");
    let embedder = TableEmbedder::default().with(QUESTION, vec![1.0]);
    let index = Arc::new(CannedIndex::default().with(
        vec![1.0],
        vec![
            chunk("a", 0.55, "policy.pdf", "ギリギリ"),
            chunk("b", 0.3, "faq.txt", "無関係"),
        ],
    ));

    let service = rag_service(expansion, answer.clone(), embedder, index, 3);
    let response = service.query(QUESTION).await;

    assert_eq!(response.outcome, RagOutcome::NotFound);
    assert_eq!(response.answer, NOT_FOUND_MESSAGE);
    assert_eq!(answer.calls(), 0);
    assert!(response.sources.is_empty());
    assert!(response.context.is_none());
    assert_eq!(response.matches.len(), 2);
}

#[tokio::test]
async fn test_single_match_is_cited() {
    let expansion = ScriptedGenerator::replying("unused");
    let answer = ScriptedGenerator::replying("経費は月末締めです。");
    let embedder = TableEmbedder::default().with(QUESTION, vec![0.5, 0.5]);
    let index = Arc::new(CannedIndex::default().with(
        vec![0.5, 0.5],
        vec![chunk("p1", 0.9, "policy.pdf", "経費は月末締め")],
    ));

    let service = rag_service(expansion.clone(), answer, embedder, index, 0);
    let response = service.query(QUESTION).await;

    assert_eq!(expansion.calls(), 0);
    assert_eq!(response.expanded_queries, vec![QUESTION]);
    assert_eq!(response.outcome, RagOutcome::Answered);
    assert!(response.answer.contains("(参考: policy.pdf)"));
    assert!(response.context.unwrap().starts_with("[出典: policy.pdf]"));
}

#[tokio::test]
async fn test_every_collaborator_failing_still_replies() {
    let expansion = ScriptedGenerator::failing();
    let answer = ScriptedGenerator::failing();
    let index = Arc::new(CannedIndex::default());

    let service = rag_service(expansion.clone(), answer.clone(), TableEmbedder::default(), index.clone(), 3);
    let response = service.query(QUESTION).await;

    assert_eq!(expansion.calls(), 1);
    assert_eq!(response.expanded_queries, vec![QUESTION]);
    assert_eq!(index.queries(), 0);
    assert_eq!(response.outcome, RagOutcome::NotFound);
    assert_eq!(answer.calls(), 0);
}

#[tokio::test]
async fn test_generation_failure_yields_apology() {
    let answer = ScriptedGenerator::failing();
    let embedder = TableEmbedder::default().with(QUESTION, vec![1.0]);
    let index = Arc::new(
        CannedIndex::default().with(vec![1.0], vec![chunk("p1", 0.9, "policy.pdf", "本文")]),
    );

    let service = rag_service(ScriptedGenerator::replying(""), answer.clone(), embedder, index, 0);
    let response = service.query(QUESTION).await;

    assert_eq!(answer.calls(), 1);
    assert_eq!(response.outcome, RagOutcome::Errored);
    assert_eq!(response.answer, GENERATION_FAILED_MESSAGE);
    assert!(response.sources.is_empty());
    assert!(response.context.is_some());
}

#[tokio::test]
async fn test_threshold_override_and_source_filter() {
    let embedder = TableEmbedder::default().with(QUESTION, vec![1.0]);
    let index = Arc::new(CannedIndex::default().with(
        vec![1.0],
        vec![
            chunk("a", 0.4, "policy.pdf", "低スコア"),
            chunk("b", 0.35, "faq.txt", "もっと低い"),
        ],
    ));
    let answer = ScriptedGenerator::replying("低スコアでも回答");
    let service = rag_service(ScriptedGenerator::replying(""), answer.clone(), embedder, index, 0);

    let query = RagQuery::new(QUESTION)
        .with_threshold(0.3)
        .with_filter(MetadataFilter::new().eq("source", "faq.txt"));
    let response = service.query_with_options(query).await;

    assert_eq!(response.outcome, RagOutcome::Answered);
    assert_eq!(response.matches.len(), 1);
    assert_eq!(response.sources, vec!["faq.txt"]);
    assert_eq!(answer.calls(), 1);
}
