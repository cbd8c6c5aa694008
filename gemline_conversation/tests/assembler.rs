//! Assistant-mode exchanges against the in-memory store.
//!
//! These tests verify that:
//! - every exchange appends one user and one assistant entry
//! - the stamped user turn and the stored entries share one timestamp
//! - model failures are answered, and remembered, with the fallback reply
//! - concurrent exchanges do not lose each other's entries

use async_trait::async_trait;
use gemline_conversation::{
    AssemblerConfig, ConversationAssembler, MODEL_FALLBACK_REPLY, ReplySource,
};
use gemline_core::{
    ChatMessage, FixedClock, LLMProvider, LLMResponse, MemoryEntry, MemoryLog, MemoryScope,
    MemoryStore, Role, Speaker, StoreError, StoreResult, Timestamp,
};
use gemline_memory::InMemoryStore;
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

/// Provider that answers from a script and records what it was sent.
#[derive(Default)]
struct ScriptedProvider {
    replies: Mutex<Vec<anyhow::Result<String>>>,
    seen: Mutex<Vec<(String, Vec<ChatMessage>)>>,
    barrier: Option<Arc<Barrier>>,
}

impl ScriptedProvider {
    fn replying(replies: Vec<anyhow::Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        _model: &str,
    ) -> anyhow::Result<LLMResponse> {
        self.seen
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), messages.to_vec()));
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        let next = {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Ok(format!("reply {}", messages.len()))
            } else {
                replies.remove(0)
            }
        };
        next.map(|content| LLMResponse {
            content,
            usage: None,
        })
    }
}

/// Store whose every operation fails.
struct BrokenStore;

#[async_trait]
impl MemoryStore for BrokenStore {
    async fn load(&self, _scope: &str) -> StoreResult<MemoryLog> {
        Err(StoreError::Read(anyhow::anyhow!("database offline")))
    }

    async fn save(&self, _scope: &str, _entries: &[MemoryEntry]) -> StoreResult<()> {
        Err(StoreError::Write(anyhow::anyhow!("database offline")))
    }

    async fn append(
        &self,
        _scope: &str,
        _entries: &[MemoryEntry],
        _max_entries: usize,
    ) -> StoreResult<MemoryLog> {
        Err(StoreError::Write(anyhow::anyhow!("database offline")))
    }

    async fn clear(&self, _scope: &str) -> StoreResult<()> {
        Err(StoreError::Write(anyhow::anyhow!("database offline")))
    }
}

fn now() -> Timestamp {
    Timestamp::parse("2024-07-15 21:05:09").unwrap()
}

fn config() -> AssemblerConfig {
    AssemblerConfig {
        persona: "test persona".into(),
        max_entries: 0,
        ..AssemblerConfig::default()
    }
}

fn assembler<P: LLMProvider>(
    provider: P,
    store: Arc<InMemoryStore>,
    config: AssemblerConfig,
) -> ConversationAssembler<P, Arc<InMemoryStore>, FixedClock> {
    ConversationAssembler::new(provider, store, FixedClock(now()), config)
}

#[tokio::test]
async fn n_exchanges_store_2n_alternating_entries() {
    let store = Arc::new(InMemoryStore::new());
    let assembler = assembler(ScriptedProvider::default(), store.clone(), config());

    for i in 0..4 {
        let result = assembler.respond("U1", &format!("message {i}")).await;
        assert_eq!(result.source, ReplySource::Model);
        assert!(result.persisted);
    }

    let log = store.load("user:U1").await.unwrap();
    assert_eq!(log.len(), 8);
    for (i, entry) in log.entries.iter().enumerate() {
        let speaker = if i % 2 == 0 { Speaker::User } else { Speaker::Assistant };
        assert_eq!(entry.speaker, speaker);
        let rendered = entry.timestamp.to_string();
        assert_eq!(rendered.len(), 19);
        assert_eq!(Timestamp::parse(&rendered).unwrap(), entry.timestamp);
    }
}

#[tokio::test]
async fn sent_and_stored_timestamps_match() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::replying(vec![Ok("好啊".into())]));
    let assembler = assembler(provider.clone(), store.clone(), config());

    let result = assembler.respond("U1", "吃飯了嗎").await;

    let calls = provider.calls();
    let (persona, messages) = &calls[0];
    assert_eq!(persona, "test persona");
    assert_eq!(messages, &vec![ChatMessage::user("[2024-07-15 21:05:09] 吃飯了嗎")]);

    let log = store.load("user:U1").await.unwrap();
    assert_eq!(log.entries[0], MemoryEntry::user("吃飯了嗎", result.timestamp));
    assert_eq!(log.entries[1], MemoryEntry::assistant("好啊", result.timestamp));
    assert_eq!(log.entries[0].stamped_text(), messages[0].content);
}

#[tokio::test]
async fn history_is_replayed_before_the_new_turn() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::default());
    let assembler = assembler(provider.clone(), store, config());

    assembler.respond("U1", "first").await;
    assembler.respond("U1", "second").await;

    let calls = provider.calls();
    let messages = &calls[1].1;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], ChatMessage::user("first"));
    assert_eq!(messages[1].role, Role::Model);
    assert_eq!(messages[2].content, "[2024-07-15 21:05:09] second");
}

#[tokio::test]
async fn replay_can_keep_timestamps() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::default());
    let config = AssemblerConfig {
        replay_timestamps: true,
        ..config()
    };
    let assembler = assembler(provider.clone(), store, config);

    assembler.respond("U1", "first").await;
    assembler.respond("U1", "second").await;

    let messages = &provider.calls()[1].1;
    assert_eq!(messages[0].content, "[2024-07-15 21:05:09] first");
}

#[tokio::test]
async fn leaked_timestamps_are_removed_from_reply_and_input() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::replying(vec![Ok(
        "[2024-07-15 21:05:09] 現在是晚上九點".into(),
    )]));
    let assembler = assembler(provider.clone(), store.clone(), config());

    let result = assembler.respond("U1", "[2020-01-01 00:00:00] 幾點了").await;
    assert_eq!(result.reply, "現在是晚上九點");

    let log = store.load("user:U1").await.unwrap();
    assert_eq!(log.entries[0].text, "幾點了");
    assert_eq!(log.entries[1].text, "現在是晚上九點");
    assert_eq!(provider.calls()[0].1[0].content, "[2024-07-15 21:05:09] 幾點了");
}

#[tokio::test]
async fn model_failure_replies_and_remembers_fallback() {
    let store = Arc::new(InMemoryStore::new());
    let provider = ScriptedProvider::replying(vec![Err(anyhow::anyhow!("quota exceeded"))]);
    let assembler = assembler(provider, store.clone(), config());

    let result = assembler.respond("U1", "hello").await;
    assert_eq!(result.reply, MODEL_FALLBACK_REPLY);
    assert_eq!(result.source, ReplySource::Fallback);

    let log = store.load("user:U1").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log.entries[1], MemoryEntry::assistant(MODEL_FALLBACK_REPLY, now()));
}

#[tokio::test]
async fn store_failures_do_not_block_the_reply() {
    let provider = Arc::new(ScriptedProvider::replying(vec![Ok("still here".into())]));
    let assembler =
        ConversationAssembler::new(provider.clone(), BrokenStore, FixedClock(now()), config());

    let result = assembler.respond("U1", "hello").await;
    assert_eq!(result.reply, "still here");
    assert!(!result.persisted);
    assert_eq!(provider.calls()[0].1.len(), 1);
}

#[tokio::test]
async fn per_user_scope_isolates_and_shared_scope_mixes() {
    let store = Arc::new(InMemoryStore::new());
    let per_user = assembler(ScriptedProvider::default(), store.clone(), config());
    per_user.respond("U1", "a").await;
    per_user.respond("U2", "b").await;
    assert_eq!(store.load("user:U1").await.unwrap().len(), 2);
    assert_eq!(store.load("user:U2").await.unwrap().len(), 2);

    let store = Arc::new(InMemoryStore::new());
    let shared_config = AssemblerConfig {
        scope: MemoryScope::Shared,
        ..config()
    };
    let shared = assembler(ScriptedProvider::default(), store.clone(), shared_config);
    shared.respond("U1", "a").await;
    shared.respond("U2", "b").await;
    assert_eq!(store.load("shared").await.unwrap().len(), 4);
}

#[tokio::test]
async fn retention_cap_prunes_oldest_pairs() {
    let store = Arc::new(InMemoryStore::new());
    let config = AssemblerConfig {
        max_entries: 4,
        ..config()
    };
    let assembler = assembler(ScriptedProvider::default(), store.clone(), config);

    for i in 0..5 {
        assembler.respond("U1", &format!("m{i}")).await;
    }

    let log = store.load("user:U1").await.unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log.entries[0].text, "m3");
}

#[tokio::test]
async fn simultaneous_exchanges_both_survive() {
    let store = Arc::new(InMemoryStore::new());
    let provider = ScriptedProvider {
        barrier: Some(Arc::new(Barrier::new(2))),
        ..ScriptedProvider::default()
    };
    let assembler = assembler(provider, store.clone(), config());

    // Both exchanges load the empty log before either one writes.
    let (a, b) = tokio::join!(assembler.respond("U1", "one"), assembler.respond("U1", "two"));
    assert!(a.persisted && b.persisted);

    let log = store.load("user:U1").await.unwrap();
    assert_eq!(log.len(), 4);
    let users: Vec<&str> = log
        .entries
        .iter()
        .filter(|e| e.speaker == Speaker::User)
        .map(|e| e.text.as_str())
        .collect();
    assert!(users.contains(&"one") && users.contains(&"two"));
    assert_eq!(log.entries[0].speaker, Speaker::User);
    assert_eq!(log.entries[1].speaker, Speaker::Assistant);
}

#[tokio::test]
async fn reset_clears_only_callers_scope() {
    let store = Arc::new(InMemoryStore::new());
    let assembler = assembler(ScriptedProvider::default(), store.clone(), config());
    assembler.respond("U1", "a").await;
    assembler.respond("U2", "b").await;

    assembler.reset("U1").await.unwrap();
    assert!(store.load("user:U1").await.unwrap().is_empty());
    assert_eq!(store.load("user:U2").await.unwrap().len(), 2);
}
