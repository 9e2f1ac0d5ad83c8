//! Chat-platform event handling on top of the RAG pipeline

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::BotConfig;
use crate::rag::RagQuery;
use crate::rag::RagService;
use crate::session::History;
use crate::session::Role;
use crate::session::SessionStore;

/// Where a message was posted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    /// `user`, `group` or `room`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

impl EventSource {
    /// Conversation key: the user, group or room id matching the source type
    #[must_use]
    pub fn conversation_id(&self) -> String {
        let id = match self.kind.as_str() {
            "user" => self.user_id.as_deref(),
            "group" => self.group_id.as_deref(),
            "room" => self.room_id.as_deref(),
            _ => None,
        };
        id.unwrap_or("unknown").to_string()
    }

    #[must_use]
    pub fn is_shared(&self) -> bool {
        matches!(self.kind.as_str(), "group" | "room")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One inbound webhook event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: EventSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<EventMessage>,
}

impl WebhookEvent {
    /// Text of a text-message event
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if self.kind != "message" {
            return None;
        }
        self.message
            .as_ref()
            .filter(|m| m.kind == "text")
            .and_then(|m| m.text.as_deref())
    }
}

/// Outbound reply bound to the event's reply token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub reply_token: String,
    pub text: String,
}

/// Prior messages (two exchanges) carried into the prompts
pub const PROMPT_HISTORY_MESSAGES: usize = 4;

/// Whether any configured bot name occurs in `text`
#[must_use]
pub fn is_bot_mentioned(text: &str, names: &[String]) -> bool {
    names.iter().any(|name| !name.is_empty() && text.contains(name.as_str()))
}

/// Answers chat messages and keeps per-conversation history
pub struct ChatService {
    rag: Arc<RagService>,
    sessions: Arc<dyn SessionStore>,
    bot: BotConfig,
    max_history: usize,
    /// One lock per active conversation; turns are processed in order
    conversation_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ChatService {
    #[must_use]
    pub fn new(
        rag: Arc<RagService>,
        sessions: Arc<dyn SessionStore>,
        bot: BotConfig,
        max_history: usize,
    ) -> Self {
        Self {
            rag,
            sessions,
            bot,
            max_history,
            conversation_locks: DashMap::new(),
        }
    }

    /// Reply to one event, or `None` when the event should be ignored
    pub async fn handle_event(&self, event: &WebhookEvent) -> Option<Reply> {
        let Some(text) = event.text() else {
            debug!("Ignoring non-text event: {}", event.kind);
            return None;
        };
        let Some(reply_token) = event.reply_token.clone() else {
            debug!("Ignoring event without reply token");
            return None;
        };

        if event.source.is_shared() && !is_bot_mentioned(text, &self.bot.names) {
            debug!("Bot not mentioned in {} chat, staying quiet", event.source.kind);
            return None;
        }

        let conversation = event.source.conversation_id();
        let text = self.respond(&conversation, text).await;
        Some(Reply { reply_token, text })
    }

    /// Answer `text` in the light of the conversation so far and record
    /// the exchange under `conversation`.
    ///
    /// Messages for the same conversation are handled one at a time within
    /// this process, so concurrent deliveries never drop each other's turns.
    pub async fn respond(&self, conversation: &str, text: &str) -> String {
        info!("Message from {}: {}", conversation, text);

        let lock = self.conversation_lock(conversation);
        let answer = {
            let _turn = lock.lock().await;

            let mut history = self.load_history(conversation).await;
            let query = RagQuery::new(text).with_history(&history, PROMPT_HISTORY_MESSAGES);
            let response = self.rag.query_with_options(query).await;

            history.push(Role::User, text, self.max_history);
            history.push(Role::Assistant, response.answer.as_str(), self.max_history);
            if let Err(e) = self.sessions.put(conversation, &history).await {
                warn!("Failed to save history for {}: {}", conversation, e);
            }
            response.answer
        };

        drop(lock);
        self.conversation_locks
            .remove_if(conversation, |_, lock| Arc::strong_count(lock) == 1);
        answer
    }

    fn conversation_lock(&self, conversation: &str) -> Arc<Mutex<()>> {
        self.conversation_locks
            .entry(conversation.to_string())
            .or_default()
            .clone()
    }

    async fn load_history(&self, conversation: &str) -> History {
        match self.sessions.get(conversation).await {
            Ok(history) => history,
            Err(e) => {
                warn!("Failed to load history for {}: {}", conversation, e);
                History::new()
            }
        }
    }
}
