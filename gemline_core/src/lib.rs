#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod memory;
pub mod mode;
pub mod timestamp;
pub mod util;

pub use memory::{
    MemoryEntry, MemoryLog, MemoryScope, MemoryStore, ModeStore, SHARED_SCOPE_KEY, Speaker,
    StoreError, StoreResult,
};
pub use mode::Mode;
pub use timestamp::{CivilClock, Clock, FixedClock, Timestamp};

/// Role of a turn as the chat model's session API expects it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl From<Speaker> for Role {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => Self::User,
            Speaker::Assistant => Self::Model,
        }
    }
}

/// One role-tagged turn handed to the chat model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Run one chat exchange. `messages` ends with the new user turn.
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        model: &str,
    ) -> anyhow::Result<LLMResponse>;
}

#[async_trait]
impl<T: LLMProvider + ?Sized> LLMProvider for Arc<T> {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        model: &str,
    ) -> anyhow::Result<LLMResponse> {
        (**self).chat(system_prompt, messages, model).await
    }
}
