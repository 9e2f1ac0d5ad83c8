use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use super::History;
use super::SessionStore;
use crate::config::SessionConfig;
use crate::errors::ChatRagError;
use crate::errors::Result;

/// Session store keeping each history as a JSON string with a TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
    namespace: String,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn connect(config: &SessionConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| ChatRagError::SessionError(format!("Redis open error: {e}")))?;

        Ok(Self {
            client,
            namespace: config.namespace.clone(),
            ttl: Duration::from_secs(config.ttl_secs),
        })
    }

    fn key(&self, k: &str) -> String {
        format!("{}{}", self.namespace, k)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| ChatRagError::SessionError(format!("Redis connect error: {e}")))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &str) -> Result<History> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn
            .get(self.key(key))
            .await
            .map_err(|e| ChatRagError::SessionError(format!("Redis GET error: {e}")))?;

        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(History::new()),
        }
    }

    async fn put(&self, key: &str, history: &History) -> Result<()> {
        let k = self.key(key);
        let json = serde_json::to_string(history)?;
        let mut conn = self.connection().await?;

        redis::pipe()
            .set(&k, json)
            .ignore()
            .expire(&k, self.ttl.as_secs() as usize)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| ChatRagError::SessionError(format!("Redis SET/EXPIRE error: {e}")))?;
        Ok(())
    }
}
