//! WebSocket transport adapter.
//!
//! Bridges the relay's uniform `Sendable` broadcast model onto a WebSocket:
//! the upgrade handler registers a send handle backed by an mpsc channel, a
//! forwarder task drains that channel onto the socket, and the inbound loop
//! answers application-level pings. Reconnection is entirely a client
//! responsibility.

pub mod handler;
