//! Session store port - keyed, expiring persistence of session snapshots.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::SessionId;
use crate::domain::story::SessionSnapshot;

/// Port for persisting session snapshots.
///
/// Semantics:
/// - `get` for an unknown or expired session returns `Ok(None)`, not an
///   error.
/// - `put` replaces the whole snapshot and restarts its TTL. There is no
///   delete operation; expiry is the only removal path.
/// - Last writer wins; concurrent turns for one session may race.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the last persisted snapshot for a session.
    async fn get(&self, session_id: &SessionId)
        -> Result<Option<SessionSnapshot>, SessionStoreError>;

    /// Persists a snapshot with the given time-to-live.
    async fn put(
        &self,
        session_id: &SessionId,
        snapshot: &SessionSnapshot,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;
}

/// Session store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionStoreError {
    /// The backing store could not be reached.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be encoded or decoded.
    #[error("session snapshot serialization failed: {0}")]
    Serialization(String),
}

impl SessionStoreError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}
