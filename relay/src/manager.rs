use crate::channel::{UserChannel, RECENT_EVENTS_LIMIT, SSE_REPLAY_LIMIT, WS_REPLAY_LIMIT};
use crate::connection::{ConnectionId, Sendable};
use crate::error::Error;
use crate::message::{BroadcastOutcome, BroadcastRequest, ControlFrame};
use dashmap::DashMap;
use events::store::EventStore;
use events::{EventPayload, UserSystemEvent};
use log::*;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Routes relay operations to per-user channels.
///
/// Each user's channel sits behind its own async lock, so everything that
/// touches one user's registry or log (subscribe, broadcast, queries) runs
/// strictly serialized for that user, including across the persistence
/// await. Different users share nothing and proceed concurrently.
pub struct Manager {
    channels: DashMap<String, Arc<Mutex<UserChannel>>>,
    store: Arc<dyn EventStore>,
}

impl Manager {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            channels: DashMap::new(),
            store,
        }
    }

    /// Returns the channel for a user, creating it on first use - O(1)
    fn channel(&self, user_id: &str) -> Arc<Mutex<UserChannel>> {
        self.channels
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(UserChannel::new(user_id))))
            .clone()
    }

    /// Registers a WebSocket connection and replays the backlog as a single
    /// `initial-events` frame. The frame is pushed through the handle while
    /// the channel lock is held, so no broadcast can slip in between
    /// registration and replay.
    pub async fn subscribe_websocket(
        &self,
        user_id: &str,
        handle: Arc<dyn Sendable>,
    ) -> ConnectionId {
        let channel = self.channel(user_id);
        let mut channel = channel.lock().await;
        channel.ensure_loaded(self.store.as_ref()).await;

        let connection_id = channel.register(Arc::clone(&handle));
        let frame = ControlFrame::InitialEvents {
            events: channel.backlog(WS_REPLAY_LIMIT),
        };
        match serde_json::to_string(&frame) {
            Ok(json) => {
                if let Err(e) = handle.send(&json) {
                    warn!(
                        "Failed to replay initial events to connection {}: {e}",
                        connection_id.as_str()
                    );
                    channel.unregister(&connection_id);
                }
            }
            Err(e) => error!("Failed to serialize initial events frame: {e}"),
        }

        info!("Registered new WebSocket connection for user {user_id}");
        connection_id
    }

    /// Registers an SSE connection and replays the most recent events as
    /// discrete frames. Replayed events are filtered to the subscribing
    /// user; redundant with per-user channel scoping, kept as defense in
    /// depth.
    pub async fn subscribe_sse(&self, user_id: &str, handle: Arc<dyn Sendable>) -> ConnectionId {
        let channel = self.channel(user_id);
        let mut channel = channel.lock().await;
        channel.ensure_loaded(self.store.as_ref()).await;

        let connection_id = channel.register(Arc::clone(&handle));
        for event in channel
            .backlog(SSE_REPLAY_LIMIT)
            .iter()
            .filter(|event| event.user_id == user_id)
        {
            match serde_json::to_string(event) {
                Ok(json) => {
                    if handle.send(&json).is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize replay event: {e}"),
            }
        }

        info!("Registered new SSE connection for user {user_id}");
        connection_id
    }

    /// Unregister a connection by ID; idempotent
    pub async fn unsubscribe(&self, user_id: &str, connection_id: &ConnectionId) {
        let channel = match self.channels.get(user_id) {
            Some(entry) => Arc::clone(entry.value()),
            None => return,
        };
        let mut channel = channel.lock().await;
        channel.unregister(connection_id);
        debug!("Unregistered connection for user {user_id}");
    }

    /// Stamps, persists, and fans out an event to all of a user's live
    /// connections. A persistence failure surfaces here and nothing is
    /// delivered; send failures are absorbed and pruned.
    pub async fn broadcast(
        &self,
        user_id: &str,
        request: BroadcastRequest,
    ) -> Result<BroadcastOutcome, Error> {
        let channel = self.channel(user_id);
        let mut channel = channel.lock().await;
        channel.ensure_loaded(self.store.as_ref()).await;
        channel.broadcast(request, self.store.as_ref()).await
    }

    /// Stored events newer than `since`, capped at [`RECENT_EVENTS_LIMIT`]
    pub async fn recent_events(&self, user_id: &str, since: i64) -> Vec<UserSystemEvent> {
        let channel = self.channel(user_id);
        let mut channel = channel.lock().await;
        channel.ensure_loaded(self.store.as_ref()).await;
        channel.recent(since, RECENT_EVENTS_LIMIT)
    }

    /// Live connection count for a user, for diagnostics
    pub async fn connection_count(&self, user_id: &str) -> usize {
        match self.channels.get(user_id) {
            Some(entry) => {
                let channel = Arc::clone(entry.value());
                drop(entry);
                let channel = channel.lock().await;
                channel.connection_count()
            }
            None => 0,
        }
    }

    /// Constructs and broadcasts a `session-invalidated` event, used for
    /// remote sign-out and forced session revocation.
    pub async fn invalidate_session(
        &self,
        user_id: &str,
        session_id: &str,
        reason: &str,
    ) -> Result<BroadcastOutcome, Error> {
        self.broadcast(
            user_id,
            BroadcastRequest {
                payload: EventPayload::SessionInvalidated,
                session_id: Some(session_id.to_string()),
                reason: Some(reason.to_string()),
            },
        )
        .await
    }

    /// Constructs and broadcasts a `notification` event
    pub async fn send_notification(
        &self,
        user_id: &str,
        data: Value,
    ) -> Result<BroadcastOutcome, Error> {
        self.broadcast(
            user_id,
            BroadcastRequest {
                payload: EventPayload::Notification(data),
                session_id: None,
                reason: None,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::SendError;
    use events::store::InMemoryStore;
    use events::{now_ms, EventType};
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingHandle {
        frames: StdMutex<Vec<String>>,
    }

    impl RecordingHandle {
        fn frames(&self) -> Vec<String> {
            self.frames.lock().unwrap().clone()
        }
    }

    impl Sendable for RecordingHandle {
        fn send(&self, frame: &str) -> Result<(), SendError> {
            self.frames.lock().unwrap().push(frame.to_string());
            Ok(())
        }
    }

    fn manager() -> (Manager, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (Manager::new(store.clone()), store)
    }

    #[tokio::test]
    async fn websocket_subscribers_receive_initial_events_first() {
        let (manager, _store) = manager();
        manager
            .send_notification("u1", json!({"msg": "hi"}))
            .await
            .unwrap();

        let handle = Arc::new(RecordingHandle::default());
        manager.subscribe_websocket("u1", handle.clone()).await;

        let frames = handle.frames();
        assert_eq!(frames.len(), 1);
        let frame: serde_json::Value = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(frame["type"], "initial-events");
        assert_eq!(frame["events"].as_array().unwrap().len(), 1);
        assert_eq!(frame["events"][0]["type"], "notification");
    }

    #[tokio::test]
    async fn sse_subscribers_receive_replay_as_discrete_frames() {
        let (manager, _store) = manager();
        for n in 0..8 {
            manager
                .send_notification("u1", json!({ "n": n }))
                .await
                .unwrap();
        }

        let handle = Arc::new(RecordingHandle::default());
        manager.subscribe_sse("u1", handle.clone()).await;

        let frames = handle.frames();
        assert_eq!(frames.len(), 5);
        let first: serde_json::Value = serde_json::from_str(&frames[0]).unwrap();
        // Replay starts at the oldest of the newest five.
        assert_eq!(first["data"]["n"], 3);
    }

    #[tokio::test]
    async fn broadcast_reaches_live_subscribers_and_reports_counts() {
        let (manager, _store) = manager();
        let handle = Arc::new(RecordingHandle::default());
        manager.subscribe_websocket("u1", handle.clone()).await;

        let outcome = manager
            .send_notification("u1", json!({"msg": "hi"}))
            .await
            .unwrap();

        assert_eq!(outcome.broadcasted, 1);
        assert_eq!(outcome.stored, 1);
        // initial-events frame plus the broadcast frame
        assert_eq!(handle.frames().len(), 2);
    }

    #[tokio::test]
    async fn users_are_isolated_from_each_other() {
        let (manager, _store) = manager();
        let u1_handle = Arc::new(RecordingHandle::default());
        let u2_handle = Arc::new(RecordingHandle::default());
        manager.subscribe_websocket("u1", u1_handle.clone()).await;
        manager.subscribe_websocket("u2", u2_handle.clone()).await;

        manager
            .send_notification("u1", json!({"msg": "hi"}))
            .await
            .unwrap();

        assert_eq!(u1_handle.frames().len(), 2);
        // u2 saw only its own initial-events frame.
        assert_eq!(u2_handle.frames().len(), 1);
    }

    #[tokio::test]
    async fn invalidate_session_builds_the_right_event() {
        let (manager, store) = manager();

        let outcome = manager
            .invalidate_session("u1", "s1", "user_logout")
            .await
            .unwrap();

        assert_eq!(outcome.stored, 1);
        let log = store.get("u1").await.unwrap().unwrap();
        let event = &log[0];
        assert_eq!(event.payload.event_type(), "session-invalidated");
        assert_eq!(event.session_id.as_deref(), Some("s1"));
        assert_eq!(event.reason.as_deref(), Some("user_logout"));
        assert_eq!(event.user_id, "u1");
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_tolerates_unknown_users() {
        let (manager, _store) = manager();
        let handle = Arc::new(RecordingHandle::default());
        let connection_id = manager.subscribe_websocket("u1", handle).await;

        manager.unsubscribe("u1", &connection_id).await;
        manager.unsubscribe("u1", &connection_id).await;
        manager.unsubscribe("ghost", &connection_id).await;

        assert_eq!(manager.connection_count("u1").await, 0);
        assert_eq!(manager.connection_count("ghost").await, 0);
    }

    #[tokio::test]
    async fn logs_survive_a_manager_restart_but_connections_do_not() {
        let store = Arc::new(InMemoryStore::new());
        {
            let manager = Manager::new(store.clone());
            let handle = Arc::new(RecordingHandle::default());
            manager.subscribe_websocket("u1", handle).await;
            manager
                .send_notification("u1", json!({"msg": "hi"}))
                .await
                .unwrap();
        }

        // A fresh manager over the same store replays the log to a new
        // subscriber but starts with zero live connections.
        let manager = Manager::new(store);
        assert_eq!(manager.connection_count("u1").await, 0);
        assert_eq!(manager.recent_events("u1", 0).await.len(), 1);
    }

    #[tokio::test]
    async fn recent_events_respects_the_since_cursor() {
        let (manager, _store) = manager();
        manager
            .send_notification("u1", json!({"msg": "old"}))
            .await
            .unwrap();
        let cursor = now_ms() + 60_000;

        assert_eq!(manager.recent_events("u1", 0).await.len(), 1);
        assert!(manager.recent_events("u1", cursor).await.is_empty());
    }
}
