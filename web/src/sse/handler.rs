use crate::params::relay::UserParams;
use async_stream::stream;
use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use futures::Stream;
use log::*;
use relay::connection::{ConnectionId, SendError, Sendable};
use service::AppState;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Interval between heartbeat frames. Chosen to beat common proxy idle
/// timeouts while staying cheap for mostly-quiet users.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Send half of an SSE connection as the relay sees it.
struct SseHandle {
    tx: mpsc::UnboundedSender<String>,
}

impl Sendable for SseHandle {
    fn send(&self, frame: &str) -> Result<(), SendError> {
        self.tx.send(frame.to_string()).map_err(|_| SendError)
    }
}

/// Deregisters the connection when the response stream is dropped, which
/// is how client disconnects reach us. Removal is also send-failure-driven
/// (a racing broadcast that hits the dead handle prunes it), so the two
/// paths together make cleanup run exactly once.
struct ConnectionGuard {
    app_state: AppState,
    user_id: String,
    connection_id: ConnectionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        debug!(
            "SSE connection {} closed for user {}, cleaning up",
            self.connection_id.as_str(),
            self.user_id
        );
        let manager = Arc::clone(&self.app_state.relay_manager);
        let user_id = self.user_id.clone();
        let connection_id = self.connection_id.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                manager.unsubscribe(&user_id, &connection_id).await;
            });
        }
    }
}

/// SSE subscription endpoint. Replays the recent backlog as discrete
/// `data:` frames, then relays broadcasts and heartbeats until the client
/// goes away.
pub(crate) async fn sse_handler(
    Query(params): Query<UserParams>,
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Establishing SSE connection for user {}", params.user_id);

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handle = Arc::new(SseHandle { tx });

    // Registration replays the backlog into the channel before any newer
    // broadcast can be queued behind it.
    let connection_id = app_state
        .relay_manager
        .subscribe_sse(&params.user_id, handle)
        .await;

    let guard = ConnectionGuard {
        app_state,
        user_id: params.user_id,
        connection_id,
    };

    Sse::new(frame_stream(rx, guard))
}

/// Interleaves relayed frames with heartbeats until the receiver closes or
/// the stream is dropped. The guard and the heartbeat interval are owned by
/// the stream, so dropping the response tears both down together.
fn frame_stream(
    mut rx: mpsc::UnboundedReceiver<String>,
    guard: ConnectionGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream! {
        let _guard = guard;
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        // Skip the immediate first tick
        heartbeat.tick().await;

        loop {
            tokio::select! {
                frame = rx.recv() => match frame {
                    Some(json) => yield Ok(Event::default().data(json)),
                    // Handle was pruned from the registry; nothing more
                    // will ever arrive.
                    None => break,
                },
                _ = heartbeat.tick() => {
                    let payload = serde_json::json!({ "timestamp": events::now_ms() }).to_string();
                    yield Ok(Event::default().event("heartbeat").data(payload));
                }
            }
        }
    }
}
