use async_trait::async_trait;
use gemline_core::{MemoryEntry, MemoryLog, MemoryStore, Mode, ModeStore, StoreResult};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    modes: Mutex<HashMap<String, Mode>>,
    logs: Mutex<HashMap<String, MemoryLog>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModeStore for InMemoryStore {
    async fn get_mode(&self, user_id: &str) -> StoreResult<Mode> {
        Ok(self
            .modes
            .lock()
            .await
            .get(user_id)
            .copied()
            .unwrap_or_default())
    }

    async fn set_mode(&self, user_id: &str, mode: Mode) -> StoreResult<()> {
        self.modes.lock().await.insert(user_id.to_owned(), mode);
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn load(&self, scope: &str) -> StoreResult<MemoryLog> {
        Ok(self.logs.lock().await.get(scope).cloned().unwrap_or_default())
    }

    async fn save(&self, scope: &str, entries: &[MemoryEntry]) -> StoreResult<()> {
        let mut logs = self.logs.lock().await;
        let log = logs.entry(scope.to_owned()).or_default();
        log.entries = entries.to_vec();
        log.revision += 1;
        Ok(())
    }

    async fn append(
        &self,
        scope: &str,
        entries: &[MemoryEntry],
        max_entries: usize,
    ) -> StoreResult<MemoryLog> {
        let mut logs = self.logs.lock().await;
        let log = logs.entry(scope.to_owned()).or_default();
        log.entries.extend_from_slice(entries);
        log.prune_to(max_entries);
        log.revision += 1;
        Ok(log.clone())
    }

    async fn clear(&self, scope: &str) -> StoreResult<()> {
        self.logs.lock().await.remove(scope);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gemline_core::Timestamp;

    fn pair(n: usize) -> Vec<MemoryEntry> {
        let ts = Timestamp::parse("2024-06-01 08:00:00").unwrap();
        vec![
            MemoryEntry::user(format!("q{n}"), ts),
            MemoryEntry::assistant(format!("a{n}"), ts),
        ]
    }

    #[tokio::test]
    async fn modes_default_to_echo_and_are_per_user() {
        let store = InMemoryStore::new();
        assert_eq!(store.get_mode("U1").await.unwrap(), Mode::Echo);

        store.set_mode("U1", Mode::Assistant).await.unwrap();
        assert_eq!(store.get_mode("U1").await.unwrap(), Mode::Assistant);
        assert_eq!(store.get_mode("U2").await.unwrap(), Mode::Echo);
    }

    #[tokio::test]
    async fn snapshot_then_save_loses_an_exchange() {
        // Two exchanges read the same snapshot; the later overwrite wins.
        let store = InMemoryStore::new();
        let first = store.load("shared").await.unwrap();
        let second = store.load("shared").await.unwrap();

        let mut a = first.entries;
        a.extend(pair(1));
        let mut b = second.entries;
        b.extend(pair(2));

        store.save("shared", &a).await.unwrap();
        store.save("shared", &b).await.unwrap();

        let log = store.load("shared").await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries[0].text, "q2");
    }

    #[tokio::test]
    async fn append_keeps_both_concurrent_exchanges() {
        let store = InMemoryStore::new();
        let (first, second) = (pair(1), pair(2));
        let (a, b) = tokio::join!(
            store.append("shared", &first, 0),
            store.append("shared", &second, 0)
        );
        a.unwrap();
        b.unwrap();

        let log = store.load("shared").await.unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log.revision, 2);
        assert_eq!(log.entries[0].text, "q1");
        assert_eq!(log.entries[2].text, "q2");
    }

    #[tokio::test]
    async fn clear_drops_only_that_scope() {
        let store = InMemoryStore::new();
        store.append("user:U1", &pair(1), 0).await.unwrap();
        store.append("user:U2", &pair(2), 0).await.unwrap();

        store.clear("user:U1").await.unwrap();
        assert!(store.load("user:U1").await.unwrap().is_empty());
        assert_eq!(store.load("user:U2").await.unwrap().len(), 2);
    }
}
