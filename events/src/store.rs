//! Durable storage seam for per-user event logs.
//!
//! The relay persists each user's log as a single value under the user's
//! key, matching the `get`/`put` contract of the hosting platform's
//! per-user durable storage. Implementations live where their backing
//! technology lives: `entity_api` provides the database-backed store, and
//! [`InMemoryStore`] here backs tests and local development.

use crate::UserSystemEvent;
use async_trait::async_trait;
use dashmap::DashMap;
use std::error::Error as StdError;
use std::fmt;

/// Errors while reading or writing a persisted event log.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: StoreErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The backing store could not be reached.
    Unavailable,
    /// The store was reachable but the write did not complete.
    WriteFailed,
    /// The stored value could not be encoded or decoded.
    Serialization,
    /// Other errors.
    Other,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Event Store Error: {:?}", self.error_kind)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Durable key-value storage for event logs, keyed by user id.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Reads the persisted log for a user. `None` if nothing was ever stored.
    async fn get(&self, user_id: &str) -> Result<Option<Vec<UserSystemEvent>>, Error>;

    /// Replaces the persisted log for a user.
    async fn put(&self, user_id: &str, events: &[UserSystemEvent]) -> Result<(), Error>;
}

/// Process-memory implementation of [`EventStore`].
///
/// Logs do not survive a process restart; used by tests and as a stand-in
/// while developing without a database.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    logs: DashMap<String, Vec<UserSystemEvent>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn get(&self, user_id: &str) -> Result<Option<Vec<UserSystemEvent>>, Error> {
        Ok(self.logs.get(user_id).map(|entry| entry.clone()))
    }

    async fn put(&self, user_id: &str, events: &[UserSystemEvent]) -> Result<(), Error> {
        self.logs.insert(user_id.to_string(), events.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventPayload;
    use serde_json::json;

    fn event(user_id: &str, timestamp: i64) -> UserSystemEvent {
        UserSystemEvent {
            payload: EventPayload::Notification(json!({"n": timestamp})),
            user_id: user_id.to_string(),
            session_id: None,
            reason: None,
            timestamp,
        }
    }

    #[tokio::test]
    async fn get_returns_none_for_unknown_user() {
        let store = InMemoryStore::new();
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_the_stored_log() {
        let store = InMemoryStore::new();
        store.put("u1", &[event("u1", 1)]).await.unwrap();
        store
            .put("u1", &[event("u1", 1), event("u1", 2)])
            .await
            .unwrap();

        let stored = store.get("u1").await.unwrap().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].timestamp, 2);
    }

    #[tokio::test]
    async fn logs_are_isolated_per_user() {
        let store = InMemoryStore::new();
        store.put("u1", &[event("u1", 1)]).await.unwrap();
        store.put("u2", &[event("u2", 7)]).await.unwrap();

        assert_eq!(store.get("u1").await.unwrap().unwrap()[0].timestamp, 1);
        assert_eq!(store.get("u2").await.unwrap().unwrap()[0].timestamp, 7);
    }
}
