pub use entity::user_event_logs;

pub mod error;
pub mod store;
pub mod user_event_log;

pub use store::DbEventStore;
