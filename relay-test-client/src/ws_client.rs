use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use log::*;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone)]
pub struct Frame {
    pub frame_type: String,
    pub data: Value,
    pub timestamp: Instant,
}

pub struct Connection {
    pub user_label: String,
    frame_rx: mpsc::UnboundedReceiver<Frame>,
    outbound_tx: mpsc::UnboundedSender<String>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub async fn establish(base_url: &str, user_id: &str, user_label: String) -> Result<Self> {
        let ws_base = base_url
            .replacen("http://", "ws://", 1)
            .replacen("https://", "wss://", 1);
        let url = format!("{}/relay/ws?userId={}", ws_base, user_id);

        let (socket, _) = connect_async(&url).await?;
        let (mut ws_tx, mut ws_rx) = socket.split();

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();

        let label = user_label.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = ws_rx.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            if let Ok(data) = serde_json::from_str::<Value>(&text) {
                                let frame = Frame {
                                    frame_type: data["type"]
                                        .as_str()
                                        .unwrap_or_default()
                                        .to_string(),
                                    data,
                                    timestamp: Instant::now(),
                                };
                                if frame_tx.send(frame).is_err() {
                                    debug!("WebSocket receiver dropped for {}", label);
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("WebSocket stream ended for {}", label);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("WebSocket error for {}: {}", label, e);
                            break;
                        }
                    },
                    outbound = outbound_rx.recv() => match outbound {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        Ok(Self {
            user_label,
            frame_rx,
            outbound_tx,
            _handle: handle,
        })
    }

    pub fn send_ping(&self) -> Result<()> {
        self.outbound_tx
            .send(r#"{"type":"ping"}"#.to_string())
            .map_err(|_| anyhow::anyhow!("WebSocket connection closed"))
    }

    pub async fn wait_for_frame(&mut self, frame_type: &str, timeout: Duration) -> Result<Frame> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                anyhow::bail!("Timeout waiting for frame: {}", frame_type);
            }

            match tokio::time::timeout(remaining, self.frame_rx.recv()).await {
                Ok(Some(frame)) if frame.frame_type == frame_type => {
                    return Ok(frame);
                }
                Ok(Some(_)) => {
                    // Wrong frame type, keep waiting
                    continue;
                }
                Ok(None) => {
                    anyhow::bail!("WebSocket connection closed");
                }
                Err(_) => {
                    anyhow::bail!("Timeout waiting for frame: {}", frame_type);
                }
            }
        }
    }
}
