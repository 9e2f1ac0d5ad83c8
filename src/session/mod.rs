//! Short-term conversation history keyed by chat source

pub mod memory;
pub mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

pub use memory::InMemorySessionStore;
pub use redis_store::RedisSessionStore;

use crate::config::SessionBackend;
use crate::config::SessionConfig;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Chat message in conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Unix seconds
    pub timestamp: i64,
}

/// Ordered conversation history, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and drop the oldest beyond `cap`
    pub fn push(&mut self, role: Role, content: impl Into<String>, cap: usize) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp(),
        });

        if self.messages.len() > cap {
            let excess = self.messages.len() - cap;
            self.messages.drain(0..excess);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// The newest `count` messages, oldest first
    #[must_use]
    pub fn recent(&self, count: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }
}

impl Role {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

/// Render messages as `Role: content` lines for a prompt
#[must_use]
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Key-value store for conversation history.
/// A key that was never written reads as an empty history.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<History>;

    async fn put(&self, key: &str, history: &History) -> Result<()>;
}

/// Build the store selected by `[session] backend`
pub fn from_config(config: &SessionConfig) -> Result<Arc<dyn SessionStore>> {
    match config.backend {
        SessionBackend::Memory => {
            let store = Arc::new(InMemorySessionStore::new(config.ttl_secs));
            store.spawn_cleanup(CLEANUP_INTERVAL);
            Ok(store)
        }
        SessionBackend::Redis => Ok(Arc::new(RedisSessionStore::connect(config)?)),
    }
}
