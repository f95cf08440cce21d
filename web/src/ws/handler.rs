use crate::params::relay::UserParams;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use log::*;
use relay::connection::{SendError, Sendable};
use relay::message::{ClientFrame, ControlFrame};
use service::AppState;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Send half of a WebSocket connection as the relay sees it. Frames are
/// queued on the channel and written to the socket by the forwarder task;
/// once the session ends the channel closes and sends start failing, which
/// is what prunes the handle from the registry.
struct WsHandle {
    tx: mpsc::UnboundedSender<String>,
}

impl Sendable for WsHandle {
    fn send(&self, frame: &str) -> Result<(), SendError> {
        self.tx.send(frame.to_string()).map_err(|_| SendError)
    }
}

/// WebSocket upgrade endpoint establishing a long-lived relay subscription.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<UserParams>,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    debug!("WebSocket upgrade requested for user {}", params.user_id);
    ws.on_upgrade(move |socket| run_session(socket, params.user_id, app_state))
}

async fn run_session(socket: WebSocket, user_id: String, app_state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handle = Arc::new(WsHandle { tx: tx.clone() });

    // Registration also replays the backlog through the handle, so the
    // initial-events frame is queued before any later broadcast.
    let connection_id = app_state
        .relay_manager
        .subscribe_websocket(&user_id, handle)
        .await;
    info!(
        "WebSocket connection {} established for user {user_id}",
        connection_id.as_str()
    );

    // Outbound forwarder: relayed frames and pong replies reach the socket
    // in queue order.
    let outbound = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(ClientFrame::Ping) => {
                    if let Ok(pong) = serde_json::to_string(&ControlFrame::Pong) {
                        let _ = tx.send(pong);
                    }
                }
                // Not fatal: only ping is meaningful, everything else is
                // ignored and the connection stays open.
                Err(e) => debug!(
                    "Ignoring unparseable frame from connection {}: {e}",
                    connection_id.as_str()
                ),
            },
            Message::Close(_) => {
                debug!(
                    "Connection {} sent close frame",
                    connection_id.as_str()
                );
                break;
            }
            _ => {}
        }
    }

    info!(
        "WebSocket connection {} closed for user {user_id}",
        connection_id.as_str()
    );
    app_state
        .relay_manager
        .unsubscribe(&user_id, &connection_id)
        .await;
    outbound.abort();
}
