use async_trait::async_trait;
use gemline_core::{Mode, ModeStore, StoreError, StoreResult};
use gemline_entities::users;
use sea_orm::sea_query::OnConflict;
use sea_orm::{EntityTrait, Set};
use tracing::debug;

use crate::manager::MemoryManager;

#[async_trait]
impl ModeStore for MemoryManager {
    async fn get_mode(&self, user_id: &str) -> StoreResult<Mode> {
        let record = users::Entity::find_by_id(user_id.to_owned())
            .one(&self.db)
            .await
            .map_err(|e| StoreError::Read(e.into()))?;

        Ok(record.map_or(Mode::Echo, |m| Mode::from_assistant_flag(m.assistant_mode)))
    }

    async fn set_mode(&self, user_id: &str, mode: Mode) -> StoreResult<()> {
        let now = chrono::Utc::now().naive_utc();

        users::Entity::insert(users::ActiveModel {
            user_id: Set(user_id.to_owned()),
            assistant_mode: Set(mode.is_assistant()),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(users::Column::UserId)
                .update_columns([users::Column::AssistantMode, users::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .map_err(|e| StoreError::Write(e.into()))?;

        debug!("Set mode for {user_id}: {mode}");
        Ok(())
    }
}
