use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::types::{MemoryEntry, MemoryLog};
use crate::mode::Mode;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store read failed: {0}")]
    Read(anyhow::Error),

    #[error("store write failed: {0}")]
    Write(anyhow::Error),

    #[error("memory log {scope} changed underneath {attempts} append attempts")]
    Conflict { scope: String, attempts: u32 },

    #[error("stored record is not decodable: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persists whether each user is in echo or assistant mode.
#[async_trait]
pub trait ModeStore: Send + Sync {
    /// Mode for `user_id`; [`Mode::Echo`] when no record exists.
    async fn get_mode(&self, user_id: &str) -> StoreResult<Mode>;

    /// Create or merge the user's record, leaving other fields untouched.
    async fn set_mode(&self, user_id: &str, mode: Mode) -> StoreResult<()>;
}

/// Persists ordered conversation memory keyed by scope.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Current log for `scope`; empty with revision 0 when absent.
    async fn load(&self, scope: &str) -> StoreResult<MemoryLog>;

    /// Unconditionally overwrite the log for `scope`.
    async fn save(&self, scope: &str, entries: &[MemoryEntry]) -> StoreResult<()>;

    /// Atomically append `entries` to the log for `scope`, pruning to
    /// `max_entries` (`0` = unbounded). Returns the log as written.
    async fn append(
        &self,
        scope: &str,
        entries: &[MemoryEntry],
        max_entries: usize,
    ) -> StoreResult<MemoryLog>;

    /// Remove the log for `scope`.
    async fn clear(&self, scope: &str) -> StoreResult<()>;
}

#[async_trait]
impl<T: ModeStore + ?Sized> ModeStore for Arc<T> {
    async fn get_mode(&self, user_id: &str) -> StoreResult<Mode> {
        (**self).get_mode(user_id).await
    }

    async fn set_mode(&self, user_id: &str, mode: Mode) -> StoreResult<()> {
        (**self).set_mode(user_id, mode).await
    }
}

#[async_trait]
impl<T: MemoryStore + ?Sized> MemoryStore for Arc<T> {
    async fn load(&self, scope: &str) -> StoreResult<MemoryLog> {
        (**self).load(scope).await
    }

    async fn save(&self, scope: &str, entries: &[MemoryEntry]) -> StoreResult<()> {
        (**self).save(scope, entries).await
    }

    async fn append(
        &self,
        scope: &str,
        entries: &[MemoryEntry],
        max_entries: usize,
    ) -> StoreResult<MemoryLog> {
        (**self).append(scope, entries, max_entries).await
    }

    async fn clear(&self, scope: &str) -> StoreResult<()> {
        (**self).clear(scope).await
    }
}
