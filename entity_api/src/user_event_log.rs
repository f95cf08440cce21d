use super::error::Error;
use entity::user_event_logs::{ActiveModel, Column, Entity, Model};
use log::debug;
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection};

/// Finds the stored event log row for a user, if one exists
pub async fn find_by_user_id(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Writes the full event log for a user, inserting the row on first write
/// and replacing its contents on every subsequent one
pub async fn upsert(db: &DatabaseConnection, user_id: &str, events: Json) -> Result<(), Error> {
    debug!("Persisting event log for user_id: {user_id}");

    let active_model = ActiveModel {
        user_id: Set(user_id.to_string()),
        events: Set(events),
        updated_at: Set(chrono::Utc::now().into()),
    };

    Entity::insert(active_model)
        .on_conflict(
            OnConflict::column(Column::UserId)
                .update_columns([Column::Events, Column::UpdatedAt])
                .to_owned(),
        )
        .exec(db)
        .await?;

    Ok(())
}
