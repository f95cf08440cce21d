// Relay persistence entities
pub mod user_event_logs;
