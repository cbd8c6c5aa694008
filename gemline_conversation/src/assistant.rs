use async_trait::async_trait;
use gemline_core::{Clock, LLMProvider, MemoryStore};
use std::sync::Arc;

use crate::assembler::ConversationAssembler;

/// Produces assistant-mode replies for the dispatcher.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Reply text for `text` sent by `user_id`.
    async fn respond(&self, user_id: &str, text: &str) -> anyhow::Result<String>;

    /// Forget the conversation memory visible to `user_id`.
    async fn reset(&self, user_id: &str) -> anyhow::Result<()>;
}

#[async_trait]
impl<P, S, C> Assistant for ConversationAssembler<P, S, C>
where
    P: LLMProvider,
    S: MemoryStore,
    C: Clock,
{
    async fn respond(&self, user_id: &str, text: &str) -> anyhow::Result<String> {
        Ok(Self::respond(self, user_id, text).await.reply)
    }

    async fn reset(&self, user_id: &str) -> anyhow::Result<()> {
        Self::reset(self, user_id).await.map_err(Into::into)
    }
}

#[async_trait]
impl<T: Assistant + ?Sized> Assistant for Arc<T> {
    async fn respond(&self, user_id: &str, text: &str) -> anyhow::Result<String> {
        (**self).respond(user_id, text).await
    }

    async fn reset(&self, user_id: &str) -> anyhow::Result<()> {
        (**self).reset(user_id).await
    }
}
