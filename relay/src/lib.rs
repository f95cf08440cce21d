//! User-scoped real-time event relay.
//!
//! One relay channel exists per user: it multiplexes that user's live
//! transport connections (WebSocket and SSE), keeps a bounded persisted
//! event log, and fans inbound events out to every live connection. It is
//! used to implement remote sign-out, cross-tab sync, and push
//! notifications.
//!
//! # Architecture
//!
//! - **Per-user channels**: all relay state for a user lives in one
//!   [`channel::UserChannel`], guarded by a per-user async lock, so
//!   handling for one user is strictly serialized while different users
//!   proceed independently.
//! - **Transport-blind fan-out**: both transports register a
//!   [`connection::Sendable`] handle, so the broadcaster never
//!   special-cases WebSocket vs SSE.
//! - **Durability before delivery**: an event is appended to the persisted
//!   log before any connection sees it; if the write fails, nothing is
//!   delivered and the caller gets the storage error.
//! - **Failure-driven pruning**: a connection whose send fails is removed
//!   from the registry after the fan-out pass; other deliveries are never
//!   affected.
//!
//! # Event Flow
//!
//! 1. A client subscribes over WebSocket or SSE and is registered under a
//!    fresh connection id.
//! 2. The recent backlog is replayed through the new handle before any
//!    later broadcast can reach it.
//! 3. A producer posts an event; the channel stamps the timestamp, appends
//!    and persists it, serializes it once, and sends the identical frame to
//!    every registered handle.
//! 4. Failed handles are pruned; the caller gets the delivered/stored
//!    counts.
//!
//! # Modules
//!
//! - `connection`: `ConnectionId`, the `Sendable` capability, and the
//!   per-user `ConnectionRegistry`
//! - `channel`: per-user state and the broadcast/replay operations
//! - `manager`: per-user channel map and the public relay operations
//! - `message`: control frames and request/outcome wire types
//! - `error`: relay error type

pub mod channel;
pub mod connection;
pub mod error;
pub mod manager;
pub mod message;

pub use manager::Manager;
