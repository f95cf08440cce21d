//! Append-only, time-bounded event log for one user.
//!
//! The log is private actor state: it is loaded once when a user's relay
//! channel spins up, appended to synchronously within each broadcast, and
//! persisted in full after every append so it survives restarts. Live
//! connections do not survive a restart; only this log does.

use crate::store::{Error as StoreError, EventStore};
use crate::{now_ms, UserSystemEvent};
use log::warn;

/// How long events are retained. Retention is time-based, not count-based;
/// enforcement happens when the log is loaded.
pub const RETENTION_MS: i64 = 24 * 60 * 60 * 1000;

/// Ordered sequence of events for one user, oldest first.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<UserSystemEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the persisted log for a user, discarding entries older than
    /// the retention window. Fails open to an empty log if storage is
    /// unavailable so channel startup is never blocked.
    pub async fn load(user_id: &str, store: &dyn EventStore) -> Self {
        let persisted = match store.get(user_id).await {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load event log for user {user_id}: {e}; starting empty");
                Vec::new()
            }
        };

        let cutoff = now_ms() - RETENTION_MS;
        let entries: Vec<UserSystemEvent> = persisted
            .into_iter()
            .filter(|event| event.timestamp >= cutoff)
            .collect();

        Self { entries }
    }

    /// Appends an event and persists the whole log, returning the stored
    /// size. The append is not acknowledged as durable until the storage
    /// write succeeds; on failure the event stays in memory best-effort and
    /// the storage error is surfaced to the caller.
    pub async fn append(
        &mut self,
        user_id: &str,
        event: UserSystemEvent,
        store: &dyn EventStore,
    ) -> Result<usize, StoreError> {
        self.entries.push(event);
        store.put(user_id, &self.entries).await?;
        Ok(self.entries.len())
    }

    /// Entries with `timestamp > since`, truncated to the newest `limit`,
    /// returned oldest first.
    pub fn recent(&self, since: i64, limit: usize) -> Vec<UserSystemEvent> {
        let matching: Vec<UserSystemEvent> = self
            .entries
            .iter()
            .filter(|event| event.timestamp > since)
            .cloned()
            .collect();
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).collect()
    }

    /// Timestamp of the newest stored entry, 0 when the log is empty. Used
    /// to keep stamped timestamps monotonic across clock regressions.
    pub fn last_timestamp(&self) -> i64 {
        self.entries.last().map(|event| event.timestamp).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
