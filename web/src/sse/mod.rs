//! SSE transport adapter.
//!
//! Wraps the server-to-client half of an `text/event-stream` response in a
//! `Sendable` handle so the broadcaster treats it exactly like a WebSocket.
//! Heartbeat frames keep intermediary proxies from closing the idle
//! connection; dropping the response stream cancels the heartbeat and
//! deregisters the connection.

pub mod handler;
