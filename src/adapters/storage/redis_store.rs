//! Redis-backed session store for production deployments.
//!
//! Snapshots are stored as JSON strings under a prefixed key with `SET ..
//! EX`, so expiry is enforced server-side and untouched sessions disappear
//! on their own.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::foundation::SessionId;
use crate::domain::story::SessionSnapshot;
use crate::ports::{SessionStore, SessionStoreError};

/// Redis-backed session store.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisSessionStore {
    /// Creates a new store over an established connection.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: "storyloom:session:".to_string(),
        }
    }

    /// Overrides the key prefix (useful for namespacing environments).
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn key_for(&self, session_id: &SessionId) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionSnapshot>, SessionStoreError> {
        let mut conn = self.conn.clone();

        let raw: Option<String> = conn
            .get(self.key_for(session_id))
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::unavailable(e.to_string()))?;

        match raw {
            None => Ok(None),
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| SessionStoreError::serialization(e.to_string())),
        }
    }

    async fn put(
        &self,
        session_id: &SessionId,
        snapshot: &SessionSnapshot,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| SessionStoreError::serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(self.key_for(session_id), json, ttl.as_secs())
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::unavailable(e.to_string()))?;

        Ok(())
    }
}
