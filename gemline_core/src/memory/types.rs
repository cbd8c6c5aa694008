use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;
use crate::{ChatMessage, Role};

/// Key of the single log used when memory is shared by every user.
pub const SHARED_SCOPE_KEY: &str = "shared";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    #[serde(alias = "model")]
    Assistant,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One persisted utterance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryEntry {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: Timestamp,
}

impl MemoryEntry {
    #[must_use]
    pub fn user(text: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            timestamp,
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            timestamp,
        }
    }

    /// `[timestamp] text`, the form the model sees.
    #[must_use]
    pub fn stamped_text(&self) -> String {
        self.timestamp.stamp(&self.text)
    }

    /// Replay this entry as a chat turn.
    #[must_use]
    pub fn to_chat_message(&self, with_timestamp: bool) -> ChatMessage {
        let content = if with_timestamp {
            self.stamped_text()
        } else {
            self.text.clone()
        };
        ChatMessage {
            role: Role::from(self.speaker),
            content,
        }
    }
}

/// Ordered conversation memory plus the revision it was read at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLog {
    pub entries: Vec<MemoryEntry>,
    /// Bumped on every write; 0 means the record does not exist yet.
    pub revision: i64,
}

impl MemoryLog {
    #[must_use]
    pub const fn new(entries: Vec<MemoryEntry>, revision: i64) -> Self {
        Self { entries, revision }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the oldest entries, whole pairs at a time, until at most
    /// `max_entries` remain. `0` disables the cap. Returns how many were dropped.
    pub fn prune_to(&mut self, max_entries: usize) -> usize {
        if max_entries == 0 {
            return 0;
        }
        let cap = max_entries.max(2) & !1;
        if self.entries.len() <= cap {
            return 0;
        }
        let mut excess = self.entries.len() - cap;
        if excess % 2 == 1 {
            excess += 1;
        }
        let excess = excess.min(self.entries.len());
        self.entries.drain(..excess);
        excess
    }
}

/// How conversation memory is partitioned.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemoryScope {
    /// One log per user.
    #[default]
    PerUser,
    /// One log for everybody.
    Shared,
}

impl MemoryScope {
    /// Storage key of the log that `user_id` reads and writes.
    #[must_use]
    pub fn key_for(self, user_id: &str) -> String {
        match self {
            Self::PerUser => format!("user:{user_id}"),
            Self::Shared => SHARED_SCOPE_KEY.to_string(),
        }
    }
}
