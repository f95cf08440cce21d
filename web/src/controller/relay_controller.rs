use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::params::relay::{RecentEventsParams, UserParams};
use crate::Error;
use events::{EventType, UserSystemEvent};
use log::*;
use relay::message::BroadcastRequest;
use service::AppState;

/// Wire shape of a successful broadcast response.
#[derive(Debug, Serialize, ToSchema)]
pub struct BroadcastResponse {
    pub success: bool,
    /// Connections the event reached.
    pub broadcasted: usize,
    /// Size of the stored log after the append.
    pub stored: usize,
}

/// Wire shape of the recent-events response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecentEventsResponse {
    /// Oldest first, capped at 20 entries.
    pub events: Vec<UserSystemEvent>,
}

/// POST broadcast an event to all of a user's live connections.
///
/// The event is stamped and durably recorded before fan-out; a persistence
/// failure surfaces as a 5xx and nothing is delivered. Send failures to
/// individual connections are absorbed and reflected only in the
/// `broadcasted` count.
#[utoipa::path(
    post,
    path = "/relay/broadcast",
    params(UserParams),
    request_body = relay::message::BroadcastRequest,
    responses(
        (status = 200, description = "Event durably stored and fanned out", body = BroadcastResponse),
        (status = 422, description = "Unprocessable Entity"),
        (status = 500, description = "Internal Server Error"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn broadcast(
    State(app_state): State<AppState>,
    Query(params): Query<UserParams>,
    Json(request): Json<BroadcastRequest>,
) -> Result<impl IntoResponse, Error> {
    debug!(
        "POST Broadcast {} event for user {}",
        request.payload.event_type(),
        params.user_id
    );

    let outcome = app_state
        .relay_manager
        .broadcast(&params.user_id, request)
        .await?;

    Ok(Json(BroadcastResponse {
        success: true,
        broadcasted: outcome.broadcasted,
        stored: outcome.stored,
    }))
}

/// GET events stored for a user since a cursor, newest last.
/// Used by clients as a polling-style catch-up after a dropped connection.
#[utoipa::path(
    get,
    path = "/relay/recent",
    params(RecentEventsParams),
    responses(
        (status = 200, description = "At most 20 stored events newer than the cursor, oldest first", body = RecentEventsResponse),
        (status = 400, description = "Missing userId query parameter"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn recent_events(
    State(app_state): State<AppState>,
    Query(params): Query<RecentEventsParams>,
) -> Result<impl IntoResponse, Error> {
    debug!(
        "GET Recent events for user {} since {}",
        params.user_id, params.since
    );

    let events = app_state
        .relay_manager
        .recent_events(&params.user_id, params.since)
        .await;

    Ok(Json(RecentEventsResponse { events }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn broadcast_response_serializes_the_wire_shape() {
        let value = serde_json::to_value(BroadcastResponse {
            success: true,
            broadcasted: 1,
            stored: 2,
        })
        .unwrap();

        assert_eq!(
            value,
            json!({"success": true, "broadcasted": 1, "stored": 2})
        );
    }

    #[test]
    fn recent_events_response_wraps_events_in_an_object() {
        let value = serde_json::to_value(RecentEventsResponse { events: vec![] }).unwrap();
        assert_eq!(value, json!({"events": []}));
    }
}
