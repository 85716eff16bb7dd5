//! In-memory session store for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::story::SessionSnapshot;
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory session store with TTL semantics.
///
/// Expired entries are dropped lazily on read. Not for production use - a
/// process restart loses every session.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<RwLock<HashMap<SessionId, (SessionSnapshot, Instant)>>>,
}

impl InMemorySessionStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (possibly expired but not yet reaped) entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when no entries are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clears all stored sessions (test isolation).
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionSnapshot>, SessionStoreError> {
        let entries = self.entries.read().await;
        match entries.get(session_id) {
            Some((snapshot, expires_at)) if *expires_at > Instant::now() => {
                Ok(Some(snapshot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn put(
        &self,
        session_id: &SessionId,
        snapshot: &SessionSnapshot,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(session_id.clone(), (snapshot.clone(), Instant::now() + ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionId {
        SessionId::new("s-1").unwrap()
    }

    fn snapshot(summary: &str) -> SessionSnapshot {
        SessionSnapshot {
            memory_summary: summary.to_string(),
            ..SessionSnapshot::empty()
        }
    }

    #[tokio::test]
    async fn get_unknown_session_returns_none() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.get(&session()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemorySessionStore::new();
        store
            .put(&session(), &snapshot("hello"), Duration::from_secs(60))
            .await
            .unwrap();

        let loaded = store.get(&session()).await.unwrap().unwrap();
        assert_eq!(loaded.memory_summary, "hello");
    }

    #[tokio::test]
    async fn put_replaces_existing_snapshot() {
        let store = InMemorySessionStore::new();
        store
            .put(&session(), &snapshot("first"), Duration::from_secs(60))
            .await
            .unwrap();
        store
            .put(&session(), &snapshot("second"), Duration::from_secs(60))
            .await
            .unwrap();

        let loaded = store.get(&session()).await.unwrap().unwrap();
        assert_eq!(loaded.memory_summary, "second");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let store = InMemorySessionStore::new();
        store
            .put(&session(), &snapshot("soon gone"), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(store.get(&session()).await.unwrap(), None);
    }
}
