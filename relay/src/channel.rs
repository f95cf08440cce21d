//! Per-user relay state: the connection registry plus the bounded event log.
//!
//! A `UserChannel` is only ever touched through its owning lock in the
//! [`crate::manager::Manager`], which serializes all handling for one user.
//! The registry and log are private channel state; nothing reads or writes
//! them except the operations here.

use crate::connection::{ConnectionId, ConnectionRegistry, Sendable};
use crate::error::Error;
use crate::message::{BroadcastOutcome, BroadcastRequest};
use events::store::EventStore;
use events::{now_ms, EventLog, EventType, UserSystemEvent};
use log::*;
use std::sync::Arc;

/// Events replayed to a newly joined WebSocket connection.
pub const WS_REPLAY_LIMIT: usize = 10;

/// Events replayed as discrete frames to a newly joined SSE connection.
pub const SSE_REPLAY_LIMIT: usize = 5;

/// Hard cap on entries returned by the recent-events query.
pub const RECENT_EVENTS_LIMIT: usize = 20;

pub struct UserChannel {
    user_id: String,
    registry: ConnectionRegistry,
    event_log: EventLog,
    loaded: bool,
}

impl UserChannel {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            registry: ConnectionRegistry::new(),
            event_log: EventLog::new(),
            loaded: false,
        }
    }

    /// Lazily loads the persisted log. The first operation after channel
    /// creation (or a process restart) pays the read; connections never
    /// survive a restart, so only the log is restored.
    pub async fn ensure_loaded(&mut self, store: &dyn EventStore) {
        if self.loaded {
            return;
        }
        self.event_log = EventLog::load(&self.user_id, store).await;
        self.loaded = true;
        debug!(
            "Loaded event log for user {}: {} entries",
            self.user_id,
            self.event_log.len()
        );
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Registers a transport handle under a fresh connection id
    pub fn register(&mut self, handle: Arc<dyn Sendable>) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.registry.add(connection_id.clone(), handle);
        debug!(
            "Registered connection {} for user {} ({} live)",
            connection_id.as_str(),
            self.user_id,
            self.registry.size()
        );
        connection_id
    }

    /// Idempotent; unknown ids are a no-op
    pub fn unregister(&mut self, connection_id: &ConnectionId) {
        self.registry.remove(connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.registry.size()
    }

    /// The newest `limit` stored events, oldest first. Used for replay on
    /// connect.
    pub fn backlog(&self, limit: usize) -> Vec<UserSystemEvent> {
        self.event_log.recent(0, limit)
    }

    /// Stored events newer than `since`, capped at [`RECENT_EVENTS_LIMIT`]
    pub fn recent(&self, since: i64, limit: usize) -> Vec<UserSystemEvent> {
        self.event_log.recent(since, limit.min(RECENT_EVENTS_LIMIT))
    }

    /// Stamps, persists, and fans an event out to every live connection.
    ///
    /// The append must succeed before any connection sees the event: a
    /// client must never observe state a restarted channel could not
    /// reproduce. Send failures are isolated per connection; the failing
    /// handles are pruned after the pass completes.
    pub async fn broadcast(
        &mut self,
        request: BroadcastRequest,
        store: &dyn EventStore,
    ) -> Result<BroadcastOutcome, Error> {
        // The stamp is the ordering key of the log; clamp against the last
        // stored entry so a clock regression cannot break monotonicity.
        let timestamp = now_ms().max(self.event_log.last_timestamp());
        let event = UserSystemEvent {
            payload: request.payload,
            user_id: self.user_id.clone(),
            session_id: request.session_id,
            reason: request.reason,
            timestamp,
        };

        debug!(
            "Broadcasting {} event to user {} ({} connections)",
            event.payload.event_type(),
            self.user_id,
            self.registry.size()
        );

        let stored = self
            .event_log
            .append(&self.user_id, event.clone(), store)
            .await?;

        // Serialize once; every connection receives the identical frame.
        let frame = serde_json::to_string(&event)?;

        let mut broadcasted = 0;
        let mut failed = Vec::new();
        for (connection_id, handle) in self.registry.snapshot() {
            match handle.send(&frame) {
                Ok(()) => broadcasted += 1,
                Err(e) => {
                    warn!(
                        "Failed to send event to connection {}: {e}. Connection will be cleaned up.",
                        connection_id.as_str()
                    );
                    failed.push(connection_id);
                }
            }
        }
        for connection_id in &failed {
            self.registry.remove(connection_id);
        }

        Ok(BroadcastOutcome {
            broadcasted,
            stored,
        })
    }
}
