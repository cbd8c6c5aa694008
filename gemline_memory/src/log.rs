use async_trait::async_trait;
use gemline_core::{MemoryEntry, MemoryLog, MemoryStore, StoreError, StoreResult};
use gemline_entities::memory_logs;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::{debug, warn};

use crate::convert;
use crate::manager::MemoryManager;

/// Compare-and-swap attempts before an append gives up.
const MAX_APPEND_ATTEMPTS: u32 = 5;

fn read_err(e: sea_orm::DbErr) -> StoreError {
    StoreError::Read(e.into())
}

fn write_err(e: sea_orm::DbErr) -> StoreError {
    StoreError::Write(e.into())
}

impl MemoryManager {
    /// Revision of the stored record, read without decoding its entries.
    async fn stored_revision(&self, scope: &str) -> StoreResult<i64> {
        let record = memory_logs::Entity::find_by_id(scope.to_owned())
            .one(&self.db)
            .await
            .map_err(read_err)?;
        Ok(record.map_or(0, |m| m.revision))
    }

    /// Write `entries` only if the stored revision still equals `expected`.
    /// Returns whether the write landed.
    async fn write_if_revision(
        &self,
        scope: &str,
        entries: &[MemoryEntry],
        expected: i64,
    ) -> StoreResult<bool> {
        let encoded = convert::encode_entries(entries)?;
        let now = chrono::Utc::now().naive_utc();

        if expected == 0 {
            let inserted = memory_logs::Entity::insert(memory_logs::ActiveModel {
                scope: Set(scope.to_owned()),
                entries: Set(encoded),
                revision: Set(1),
                updated_at: Set(now),
            })
            .on_conflict(
                OnConflict::column(memory_logs::Column::Scope)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(write_err)?;
            return Ok(inserted == 1);
        }

        let updated = memory_logs::Entity::update_many()
            .col_expr(memory_logs::Column::Entries, Expr::value(encoded))
            .col_expr(memory_logs::Column::Revision, Expr::value(expected + 1))
            .col_expr(memory_logs::Column::UpdatedAt, Expr::value(now))
            .filter(memory_logs::Column::Scope.eq(scope))
            .filter(memory_logs::Column::Revision.eq(expected))
            .exec(&self.db)
            .await
            .map_err(write_err)?;

        Ok(updated.rows_affected == 1)
    }
}

#[async_trait]
impl MemoryStore for MemoryManager {
    async fn load(&self, scope: &str) -> StoreResult<MemoryLog> {
        let record = memory_logs::Entity::find_by_id(scope.to_owned())
            .one(&self.db)
            .await
            .map_err(read_err)?;

        record.map_or_else(|| Ok(MemoryLog::default()), convert::memory_log_from_model)
    }

    async fn save(&self, scope: &str, entries: &[MemoryEntry]) -> StoreResult<()> {
        let encoded = convert::encode_entries(entries)?;
        let now = chrono::Utc::now().naive_utc();
        let current = self.stored_revision(scope).await?;

        memory_logs::Entity::insert(memory_logs::ActiveModel {
            scope: Set(scope.to_owned()),
            entries: Set(encoded),
            revision: Set(current + 1),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(memory_logs::Column::Scope)
                .update_columns([
                    memory_logs::Column::Entries,
                    memory_logs::Column::Revision,
                    memory_logs::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .map_err(write_err)?;

        debug!("Saved {} entries to {scope}", entries.len());
        Ok(())
    }

    async fn append(
        &self,
        scope: &str,
        entries: &[MemoryEntry],
        max_entries: usize,
    ) -> StoreResult<MemoryLog> {
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            let mut log = self.load(scope).await?;
            let expected = log.revision;

            log.entries.extend_from_slice(entries);
            let pruned = log.prune_to(max_entries);

            if self.write_if_revision(scope, &log.entries, expected).await? {
                log.revision = expected + 1;
                if pruned > 0 {
                    debug!("Pruned {pruned} oldest entries from {scope}");
                }
                return Ok(log);
            }

            warn!("Memory log {scope} changed during append (attempt {attempt}), reloading");
        }

        Err(StoreError::Conflict {
            scope: scope.to_owned(),
            attempts: MAX_APPEND_ATTEMPTS,
        })
    }

    async fn clear(&self, scope: &str) -> StoreResult<()> {
        memory_logs::Entity::delete_by_id(scope.to_owned())
            .exec(&self.db)
            .await
            .map_err(write_err)?;

        debug!("Cleared memory log {scope}");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gemline_core::{Mode, ModeStore, Speaker, Timestamp};
    use sea_orm::ConnectOptions;

    async fn manager() -> MemoryManager {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        MemoryManager::connect_with(options).await.unwrap()
    }

    fn pair(n: usize) -> [MemoryEntry; 2] {
        let ts = Timestamp::parse("2024-06-01 08:00:00").unwrap();
        [
            MemoryEntry::user(format!("q{n}"), ts),
            MemoryEntry::assistant(format!("a{n}"), ts),
        ]
    }

    #[tokio::test]
    async fn unseen_user_is_in_echo_mode() {
        let store = manager().await;
        assert_eq!(store.get_mode("U-new").await.unwrap(), Mode::Echo);
    }

    #[tokio::test]
    async fn set_mode_upserts() {
        let store = manager().await;
        store.set_mode("U1", Mode::Assistant).await.unwrap();
        assert_eq!(store.get_mode("U1").await.unwrap(), Mode::Assistant);

        store.set_mode("U1", Mode::Echo).await.unwrap();
        assert_eq!(store.get_mode("U1").await.unwrap(), Mode::Echo);
        assert_eq!(store.get_mode("U2").await.unwrap(), Mode::Echo);
    }

    #[tokio::test]
    async fn missing_log_loads_empty() {
        let store = manager().await;
        let log = store.load("user:U1").await.unwrap();
        assert!(log.is_empty());
        assert_eq!(log.revision, 0);
    }

    #[tokio::test]
    async fn append_accumulates_pairs_in_order() {
        let store = manager().await;
        for n in 0..3 {
            store.append("user:U1", &pair(n), 0).await.unwrap();
        }

        let log = store.load("user:U1").await.unwrap();
        assert_eq!(log.len(), 6);
        assert_eq!(log.revision, 3);
        for (i, entry) in log.entries.iter().enumerate() {
            let expected = if i % 2 == 0 { Speaker::User } else { Speaker::Assistant };
            assert_eq!(entry.speaker, expected);
        }
        assert_eq!(log.entries[4].text, "q2");
    }

    #[tokio::test]
    async fn append_prunes_to_cap() {
        let store = manager().await;
        for n in 0..4 {
            store.append("shared", &pair(n), 4).await.unwrap();
        }
        let log = store.load("shared").await.unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log.entries[0].text, "q2");
    }

    #[tokio::test]
    async fn stale_revision_is_rejected() {
        let store = manager().await;
        store.append("user:U1", &pair(0), 0).await.unwrap();

        assert!(!store.write_if_revision("user:U1", &pair(9), 0).await.unwrap());
        assert!(!store.write_if_revision("user:U1", &pair(9), 7).await.unwrap());
        assert!(store.write_if_revision("user:U1", &pair(9), 1).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_appends_both_survive() {
        let store = manager().await;
        let (first, second) = (pair(1), pair(2));
        let (a, b) = tokio::join!(
            store.append("shared", &first, 0),
            store.append("shared", &second, 0)
        );
        a.unwrap();
        b.unwrap();

        let log = store.load("shared").await.unwrap();
        assert_eq!(log.len(), 4);
        let texts: Vec<&str> = log.entries.iter().map(|e| e.text.as_str()).collect();
        assert!(texts == ["q1", "a1", "q2", "a2"] || texts == ["q2", "a2", "q1", "a1"]);
    }

    #[tokio::test]
    async fn save_overwrites_and_clear_removes() {
        let store = manager().await;
        store.append("user:U1", &pair(0), 0).await.unwrap();
        store.save("user:U1", &pair(5)).await.unwrap();

        let log = store.load("user:U1").await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries[0].text, "q5");
        assert_eq!(log.revision, 2);

        store.clear("user:U1").await.unwrap();
        assert!(store.load("user:U1").await.unwrap().is_empty());
        assert!(store.list_scopes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_repairs_corrupt_record_and_bumps_revision() {
        let store = manager().await;
        memory_logs::Entity::insert(memory_logs::ActiveModel {
            scope: Set("user:U1".to_owned()),
            entries: Set("not json".to_owned()),
            revision: Set(3),
            updated_at: Set(chrono::Utc::now().naive_utc()),
        })
        .exec_without_returning(&store.db)
        .await
        .unwrap();
        assert!(matches!(store.load("user:U1").await, Err(StoreError::Corrupt(_))));

        store.save("user:U1", &pair(1)).await.unwrap();

        let log = store.load("user:U1").await.unwrap();
        assert_eq!(log.revision, 4);
        assert_eq!(log.entries[0].text, "q1");
    }
}
