mod common;

use std::sync::Arc;

use chatrag::chat::ChatService;
use chatrag::config::BotConfig;
use chatrag::session::InMemorySessionStore;
use chatrag::session::Role;
use chatrag::session::SessionStore;
use common::chunk;
use common::rag_service;
use common::CannedIndex;
use common::ScriptedGenerator;
use common::TableEmbedder;
use futures::future::join_all;

const FIRST: &str = "経費の締め日は？";
const FOLLOW_UP: &str = "交通費も同じ？";

struct Fixture {
    chat: Arc<ChatService>,
    sessions: Arc<InMemorySessionStore>,
    expansion: Arc<ScriptedGenerator>,
    answer: Arc<ScriptedGenerator>,
}

fn fixture() -> Fixture {
    let expansion = ScriptedGenerator::replying("");
    let answer = ScriptedGenerator::replying("月末締めです");
    let embedder = TableEmbedder::default()
        .with(FIRST, vec![1.0])
        .with(FOLLOW_UP, vec![1.0]);
    let index = Arc::new(
        CannedIndex::default().with(vec![1.0], vec![chunk("p1", 0.9, "policy.pdf", "経費は月末締め")]),
    );
    let rag = Arc::new(rag_service(expansion.clone(), answer.clone(), embedder, index, 1));

    let sessions = Arc::new(InMemorySessionStore::default());
    let chat = Arc::new(ChatService::new(rag, sessions.clone(), BotConfig::default(), 20));

    Fixture {
        chat,
        sessions,
        expansion,
        answer,
    }
}

#[tokio::test]
async fn test_previous_turn_reaches_both_prompts() {
    let f = fixture();

    f.chat.respond("U1", FIRST).await;
    f.chat.respond("U1", FOLLOW_UP).await;

    let answer_prompts = f.answer.prompts();
    assert_eq!(answer_prompts.len(), 2);
    assert!(answer_prompts[0].contains("Recent conversation:\n(none)"));
    assert!(answer_prompts[1].contains(&format!("User: {FIRST}")));
    assert!(answer_prompts[1].contains("Assistant: 月末締めです"));
    assert!(answer_prompts[1].contains(&format!("Question: {FOLLOW_UP}")));

    let expansion_prompts = f.expansion.prompts();
    assert_eq!(expansion_prompts.len(), 2);
    assert!(!expansion_prompts[0].contains(&format!("User: {FIRST}")));
    assert!(expansion_prompts[1].contains(&format!("User: {FIRST}")));
}

#[tokio::test]
async fn test_history_is_per_conversation() {
    let f = fixture();

    f.chat.respond("U1", FIRST).await;
    f.chat.respond("U2", FOLLOW_UP).await;

    let answer_prompts = f.answer.prompts();
    assert!(!answer_prompts[1].contains(FIRST));
    assert_eq!(f.sessions.get("U1").await.unwrap().len(), 2);
    assert_eq!(f.sessions.get("U2").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrent_messages_keep_every_turn() {
    let f = fixture();

    let turns = (0..6).map(|i| {
        let chat = f.chat.clone();
        tokio::spawn(async move { chat.respond("G1", &format!("質問{i}")).await })
    });
    for handle in join_all(turns).await {
        handle.unwrap();
    }

    let history = f.sessions.get("G1").await.unwrap();
    assert_eq!(history.len(), 12);
    let questions = history
        .messages
        .iter()
        .filter(|m| m.role == Role::User)
        .count();
    assert_eq!(questions, 6);
}
