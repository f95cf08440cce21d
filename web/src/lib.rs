//! Web layer: the HTTP/WebSocket/SSE surface of the relay.
//!
//! Routes inbound requests by shape — WebSocket upgrades and SSE GETs to
//! the transport adapters, broadcast POSTs and recent-events GETs to the
//! controllers — and translates relay errors into HTTP responses. All
//! business state lives behind `AppState.relay_manager`.

use log::info;
use service::AppState;

pub use self::error::{Error, Result};

mod controller;
mod error;
mod params;
pub mod router;
mod sse;
mod ws;

/// Binds the configured interface/port and serves the router until the
/// process is stopped.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = app_state.config.port;

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    info!("Server starting... listening for requests on http://{host}:{port}");

    axum::serve(listener, router::define_routes(app_state)).await
}
