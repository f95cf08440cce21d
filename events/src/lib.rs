//! Event model and per-user event log for the User Relay.
//!
//! This crate defines the unit of communication between the relay and its
//! subscribers (`UserSystemEvent`), the bounded in-memory log that backs
//! replay-on-connect (`EventLog`), and the durable storage seam the log is
//! persisted through (`store::EventStore`).
//!
//! This crate has no dependencies on internal crates, avoiding circular
//! dependencies. Event payloads are carried as serialized JSON values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub mod event_log;
pub mod store;

pub use event_log::EventLog;

/// Trait for getting the wire name of an event kind.
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// The kind-specific part of an event: a closed set of kinds, each with its
/// own payload shape. Payload bodies are opaque JSON the relay never
/// interprets; routing and retention only ever look at the kind and the
/// envelope fields on [`UserSystemEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum EventPayload {
    /// A session or token was revoked. Carries no body of its own; the
    /// affected session and the cause ride in the envelope's `sessionId`
    /// and `reason` fields.
    SessionInvalidated,
    /// A push notification body destined for the user's UI.
    Notification(Value),
    /// An operator-facing announcement.
    SystemAnnouncement(Value),
    /// A cross-tab synchronization blob.
    TabSync(Value),
}

impl EventType for EventPayload {
    fn event_type(&self) -> &'static str {
        match self {
            EventPayload::SessionInvalidated => "session-invalidated",
            EventPayload::Notification(_) => "notification",
            EventPayload::SystemAnnouncement(_) => "system-announcement",
            EventPayload::TabSync(_) => "tab-sync",
        }
    }
}

/// A single event owned by one user. The `timestamp` is assigned by the
/// relay at broadcast time, never by the producer, and is the ordering key
/// of the stored log (monotonic non-decreasing; collisions are broken by
/// insertion order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSystemEvent {
    #[serde(flatten)]
    pub payload: EventPayload,
    pub user_id: String,
    /// Which session/tab the event pertains to (used by `session-invalidated`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Human-readable cause, e.g. `"user_logout"` or `"forced_revocation"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: i64,
}

/// Current wall-clock time as integer milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
