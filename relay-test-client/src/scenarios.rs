use crate::api_client::ApiClient;
use crate::output::TestResult;
use crate::{sse_client, ws_client};
use anyhow::Result;
use serde_json::json;
use std::time::Duration;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A broadcast reaches an established SSE subscriber.
pub async fn test_sse_delivery(
    api_client: &ApiClient,
    user_id: &str,
    sse: &mut sse_client::Connection,
) -> Result<TestResult> {
    let outcome = api_client
        .broadcast(
            user_id,
            &json!({"type": "notification", "data": {"source": "relay-test-client"}}),
        )
        .await?;

    if outcome["broadcasted"].as_i64() == Some(0) {
        return Ok(TestResult::fail(
            "sse_delivery",
            "broadcast reported no live connections",
        ));
    }

    match sse.wait_for_event("notification", EVENT_TIMEOUT).await {
        Ok(event) => Ok(TestResult::pass(
            "sse_delivery",
            format!("{} received the notification", sse.user_label.clone())
                + &format!(" (userId={})", event.data["userId"]),
        )),
        Err(e) => Ok(TestResult::fail("sse_delivery", e.to_string())),
    }
}

/// A fresh WebSocket connection replays stored events in its initial frame.
pub async fn test_ws_replay(
    api_client: &ApiClient,
    base_url: &str,
    user_id: &str,
) -> Result<TestResult> {
    api_client
        .broadcast(
            user_id,
            &json!({"type": "system-announcement", "data": {"note": "replay probe"}}),
        )
        .await?;

    let mut ws =
        ws_client::Connection::establish(base_url, user_id, "Replay checker".to_string()).await?;
    let initial = ws.wait_for_frame("initial-events", EVENT_TIMEOUT).await?;

    let replayed = initial.data["events"]
        .as_array()
        .map(|events| {
            events
                .iter()
                .any(|e| e["data"]["note"] == "replay probe")
        })
        .unwrap_or(false);

    if replayed {
        Ok(TestResult::pass(
            "ws_replay",
            "initial-events frame contained the stored event",
        ))
    } else {
        Ok(TestResult::fail(
            "ws_replay",
            "stored event missing from initial-events frame",
        ))
    }
}

/// A broadcast reaches an already-open WebSocket connection.
pub async fn test_ws_live_delivery(
    api_client: &ApiClient,
    user_id: &str,
    ws: &mut ws_client::Connection,
) -> Result<TestResult> {
    api_client
        .broadcast(
            user_id,
            &json!({"type": "tab-sync", "data": {"activeTab": "settings"}}),
        )
        .await?;

    match ws.wait_for_frame("tab-sync", EVENT_TIMEOUT).await {
        Ok(_) => Ok(TestResult::pass(
            "ws_live_delivery",
            format!("{} received the live event", ws.user_label),
        )),
        Err(e) => Ok(TestResult::fail("ws_live_delivery", e.to_string())),
    }
}

/// An application-level ping is answered with a pong frame.
pub async fn test_ping_pong(ws: &mut ws_client::Connection) -> Result<TestResult> {
    ws.send_ping()?;

    match ws.wait_for_frame("pong", EVENT_TIMEOUT).await {
        Ok(_) => Ok(TestResult::pass("ping_pong", "pong received")),
        Err(e) => Ok(TestResult::fail("ping_pong", e.to_string())),
    }
}

/// The recent endpoint returns stored events for the user.
pub async fn test_recent_events(api_client: &ApiClient, user_id: &str) -> Result<TestResult> {
    api_client
        .broadcast(
            user_id,
            &json!({"type": "notification", "data": {"probe": "recent"}}),
        )
        .await?;

    let events = api_client.recent_events(user_id, None).await?;
    if events.is_empty() {
        return Ok(TestResult::fail("recent_events", "no events returned"));
    }

    let ascending = events
        .windows(2)
        .all(|pair| pair[0]["timestamp"].as_i64() <= pair[1]["timestamp"].as_i64());
    if !ascending {
        return Ok(TestResult::fail(
            "recent_events",
            "events were not in ascending timestamp order",
        ));
    }

    // A cursor at the newest timestamp should filter everything out.
    let newest = events
        .last()
        .and_then(|e| e["timestamp"].as_i64())
        .unwrap_or_default();
    let after = api_client.recent_events(user_id, Some(newest)).await?;
    if !after.is_empty() {
        return Ok(TestResult::fail(
            "recent_events",
            "since cursor did not filter older events",
        ));
    }

    Ok(TestResult::pass(
        "recent_events",
        format!("{} events returned in order", events.len()),
    ))
}

/// Events broadcast to one user never reach another user's connection.
pub async fn test_user_isolation(
    api_client: &ApiClient,
    user_id: &str,
    other_sse: &mut sse_client::Connection,
) -> Result<TestResult> {
    api_client
        .broadcast(
            user_id,
            &json!({"type": "notification", "data": {"secret": true}}),
        )
        .await?;

    // The other user's connection should stay quiet.
    match other_sse
        .wait_for_event("notification", Duration::from_secs(2))
        .await
    {
        Ok(_) => Ok(TestResult::fail(
            "user_isolation",
            format!("{} received another user's event", other_sse.user_label),
        )),
        Err(_) => Ok(TestResult::pass(
            "user_isolation",
            "no cross-user delivery observed",
        )),
    }
}
