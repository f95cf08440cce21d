use crate::controller::{health_check_controller, relay_controller};
use crate::{sse, ws};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use service::AppState;
use tower_http::cors::{Any, CorsLayer};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "User Relay API"
        ),
        paths(
            relay_controller::broadcast,
            relay_controller::recent_events,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                events::UserSystemEvent,
                events::EventPayload,
                relay::message::BroadcastRequest,
                relay_controller::BroadcastResponse,
                relay_controller::RecentEventsResponse,
            )
        ),
        tags(
            (name = "user_relay", description = "User-scoped real-time event relay API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state);

    // Unmatched paths/methods fall through to axum's default 404.
    Router::new()
        .merge(relay_routes(app_state))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

pub fn relay_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/relay/ws", get(ws::handler::ws_handler))
        .route("/relay/events", get(sse::handler::sse_handler))
        .route("/relay/broadcast", post(relay_controller::broadcast))
        .route("/relay/recent", get(relay_controller::recent_events))
        .with_state(app_state)
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn cors_layer(app_state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_doc_registers_the_response_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.unwrap().schemas;

        assert!(schemas.contains_key("BroadcastResponse"));
        assert!(schemas.contains_key("RecentEventsResponse"));
        assert!(schemas.contains_key("UserSystemEvent"));
    }
}
