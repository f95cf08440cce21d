//! Database-backed implementation of the relay's durable storage seam.

use crate::user_event_log;
use async_trait::async_trait;
use events::store::{Error as StoreError, EventStore};
use events::UserSystemEvent;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Persists each user's event log as one JSON row in `user_event_logs`,
/// giving the relay the `get`/`put` semantics it expects from durable
/// per-user storage.
pub struct DbEventStore {
    db: Arc<DatabaseConnection>,
}

impl DbEventStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventStore for DbEventStore {
    async fn get(&self, user_id: &str) -> Result<Option<Vec<UserSystemEvent>>, StoreError> {
        let row = user_event_log::find_by_user_id(self.db.as_ref(), user_id)
            .await
            .map_err(StoreError::from)?;

        match row {
            Some(model) => {
                let events: Vec<UserSystemEvent> = serde_json::from_value(model.events)
                    .map_err(crate::error::Error::from)
                    .map_err(StoreError::from)?;
                Ok(Some(events))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, user_id: &str, events: &[UserSystemEvent]) -> Result<(), StoreError> {
        let value = serde_json::to_value(events)
            .map_err(crate::error::Error::from)
            .map_err(StoreError::from)?;

        user_event_log::upsert(self.db.as_ref(), user_id, value)
            .await
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use entity::user_event_logs::Model;
    use events::EventPayload;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn event(timestamp: i64) -> UserSystemEvent {
        UserSystemEvent {
            payload: EventPayload::Notification(json!({"n": timestamp})),
            user_id: "u1".to_string(),
            session_id: None,
            reason: None,
            timestamp,
        }
    }

    #[tokio::test]
    async fn get_decodes_the_stored_json_log() {
        let stored = vec![event(1), event(2)];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![Model {
                user_id: "u1".to_string(),
                events: serde_json::to_value(&stored).unwrap(),
                updated_at: chrono::Utc::now().into(),
            }]])
            .into_connection();
        let store = DbEventStore::new(Arc::new(db));

        let events = store.get("u1").await.unwrap().unwrap();

        assert_eq!(events, stored);
    }

    #[tokio::test]
    async fn get_returns_none_when_no_row_exists() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();
        let store = DbEventStore::new(Arc::new(db));

        assert!(store.get("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_upserts_the_serialized_log() {
        // Postgres inserts run with RETURNING, so the mock needs both a
        // query result and an exec result to cover either execution path.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![Model {
                user_id: "u1".to_string(),
                events: json!([]),
                updated_at: chrono::Utc::now().into(),
            }]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let store = DbEventStore::new(Arc::new(db));

        store.put("u1", &[event(1)]).await.unwrap();
    }
}
