use entity_api::store::DbEventStore;
use log::{error, info};
use relay::Manager;
use service::{config::Config, logging::Logger, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Starting user relay server...");

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let store = Arc::new(DbEventStore::new(db));
    let relay_manager = Arc::new(Manager::new(store));
    let app_state = AppState::new(config, relay_manager);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server failed to start: {e}");
        std::process::exit(1);
    }
}
