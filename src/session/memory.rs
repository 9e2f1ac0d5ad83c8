use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::History;
use super::SessionStore;
use crate::errors::Result;

struct Entry {
    history: History,
    last_activity: Instant,
}

/// Process-local session store; entries expire after a period of inactivity
pub struct InMemorySessionStore {
    sessions: DashMap<String, Entry>,
    ttl: Duration,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Sweep expired entries every `every` while the store is alive.
    /// No-op outside a tokio runtime.
    pub fn spawn_cleanup(self: &Arc<Self>, every: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let store = Arc::downgrade(self);
        handle.spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                match store.upgrade() {
                    Some(store) => store.cleanup_expired(),
                    None => break,
                }
            }
        });
    }

    /// Drop every expired entry
    pub fn cleanup_expired(&self) {
        let ttl = self.ttl;
        self.sessions.retain(|key, entry| {
            let alive = entry.last_activity.elapsed() <= ttl;
            if !alive {
                debug!("Cleaned up expired session: {}", key);
            }
            alive
        });
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(3600)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Result<History> {
        let expired = match self.sessions.get(key) {
            Some(entry) if entry.last_activity.elapsed() <= self.ttl => {
                return Ok(entry.history.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.sessions.remove(key);
        }
        Ok(History::new())
    }

    async fn put(&self, key: &str, history: &History) -> Result<()> {
        self.sessions.insert(
            key.to_string(),
            Entry {
                history: history.clone(),
                last_activity: Instant::now(),
            },
        );
        Ok(())
    }
}
