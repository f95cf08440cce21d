use events::{EventPayload, UserSystemEvent};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Server-to-client control frames that are not part of the event model.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlFrame {
    /// Backlog replay pushed to a WebSocket connection right after it
    /// registers, before any newer broadcast can reach it.
    InitialEvents { events: Vec<UserSystemEvent> },
    /// Reply to an application-level ping.
    Pong,
}

/// Client-to-server frames. Only `ping` is meaningful; anything else a
/// client sends is ignored.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Liveness probe, answered synchronously with a `pong` control frame.
    Ping,
}

/// An inbound event as a producer submits it: the kind and payload plus the
/// optional envelope fields. The relay stamps the owning user and the
/// timestamp itself at broadcast time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    #[serde(flatten)]
    pub payload: EventPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Result of one fan-out pass.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, ToSchema)]
pub struct BroadcastOutcome {
    /// Connections the serialized event reached.
    pub broadcasted: usize,
    /// Size of the stored log after the append.
    pub stored: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ping_frame_parses() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(frame, ClientFrame::Ping);
    }

    #[test]
    fn unknown_client_frames_fail_to_parse() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"subscribe"}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>("not json").is_err());
    }

    #[test]
    fn pong_frame_serializes_with_type_tag() {
        let json = serde_json::to_value(ControlFrame::Pong).unwrap();
        assert_eq!(json, json!({"type": "pong"}));
    }

    #[test]
    fn initial_events_frame_carries_its_events() {
        let frame = ControlFrame::InitialEvents { events: vec![] };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "initial-events");
        assert_eq!(json["events"], json!([]));
    }

    #[test]
    fn broadcast_request_parses_the_wire_shape() {
        let request: BroadcastRequest = serde_json::from_value(json!({
            "type": "session-invalidated",
            "sessionId": "s1",
            "reason": "user_logout"
        }))
        .unwrap();

        assert_eq!(request.payload, EventPayload::SessionInvalidated);
        assert_eq!(request.session_id.as_deref(), Some("s1"));
        assert_eq!(request.reason.as_deref(), Some("user_logout"));
    }

    #[test]
    fn broadcast_request_rejects_unknown_kinds() {
        let result = serde_json::from_value::<BroadcastRequest>(json!({
            "type": "mystery-event",
            "data": {}
        }));
        assert!(result.is_err());
    }
}
