use gemline_core::timestamp::strip_timestamp;
use gemline_core::util::{DEFAULT_MODEL, DEFAULT_PERSONA};
use gemline_core::{
    Clock, LLMProvider, MemoryEntry, MemoryLog, MemoryScope, MemoryStore, Timestamp,
};
use tracing::{debug, error, info, warn};

use crate::history::build_llm_messages;

/// Reply used, and remembered, when the model call fails.
pub const MODEL_FALLBACK_REPLY: &str = "抱歉，我暫時無法回應你的訊息。";

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Model name passed to the provider.
    pub model: String,
    /// System instruction.
    pub persona: String,
    pub scope: MemoryScope,
    /// Retention cap in entries; `0` keeps everything.
    pub max_entries: usize,
    /// Replay history as `[timestamp] text`.
    pub replay_timestamps: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            persona: DEFAULT_PERSONA.to_string(),
            scope: MemoryScope::PerUser,
            max_entries: 200,
            replay_timestamps: false,
        }
    }
}

/// Where the reply text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Model,
    Fallback,
}

/// Result of one assistant-mode exchange.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub reply: String,
    pub source: ReplySource,
    /// Timestamp sent to the model and stored on both new entries.
    pub timestamp: Timestamp,
    /// Whether the new pair reached the memory store.
    pub persisted: bool,
}

/// Builds model turns from memory, calls the model, and records the exchange.
pub struct ConversationAssembler<P, S, C> {
    provider: P,
    store: S,
    clock: C,
    config: AssemblerConfig,
}

impl<P, S, C> ConversationAssembler<P, S, C>
where
    P: LLMProvider,
    S: MemoryStore,
    C: Clock,
{
    pub const fn new(provider: P, store: S, clock: C, config: AssemblerConfig) -> Self {
        Self {
            provider,
            store,
            clock,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Run one exchange for `user_id`. Never fails: a model error yields
    /// [`MODEL_FALLBACK_REPLY`], and store errors are logged.
    pub async fn respond(&self, user_id: &str, user_text: &str) -> TurnResult {
        let now = self.clock.now();
        let scope = self.config.scope.key_for(user_id);
        let user_text = strip_timestamp(user_text);

        let history = match self.store.load(&scope).await {
            Ok(log) => log,
            Err(e) => {
                warn!(
                    "Failed to load memory {scope} for {user_id}, continuing without history: {e}"
                );
                MemoryLog::default()
            }
        };

        let messages = build_llm_messages(
            &history.entries,
            self.config.replay_timestamps,
            user_text,
            now,
        );
        debug!(
            "Prepared {} turns for {user_id} ({} from memory)",
            messages.len(),
            history.len()
        );

        let (reply, source) = match self
            .provider
            .chat(&self.config.persona, &messages, &self.config.model)
            .await
        {
            Ok(response) => {
                let cleaned = strip_timestamp(&response.content);
                if cleaned.trim().is_empty() {
                    warn!("Model reply for {user_id} was empty after cleanup");
                    (MODEL_FALLBACK_REPLY.to_string(), ReplySource::Fallback)
                } else {
                    (cleaned.to_string(), ReplySource::Model)
                }
            }
            Err(e) => {
                error!("Model call failed for {user_id}: {e}");
                (MODEL_FALLBACK_REPLY.to_string(), ReplySource::Fallback)
            }
        };

        let exchange = [
            MemoryEntry::user(user_text, now),
            MemoryEntry::assistant(reply.as_str(), now),
        ];

        let persisted = match self
            .store
            .append(&scope, &exchange, self.config.max_entries)
            .await
        {
            Ok(log) => {
                info!("Stored exchange for {user_id} in {scope} ({} entries)", log.len());
                true
            }
            Err(e) => {
                error!("Failed to store exchange for {user_id} in {scope}: {e}");
                false
            }
        };

        TurnResult {
            reply,
            source,
            timestamp: now,
            persisted,
        }
    }

    /// Forget the memory `user_id` reads from.
    pub async fn reset(&self, user_id: &str) -> gemline_core::StoreResult<()> {
        let scope = self.config.scope.key_for(user_id);
        self.store.clear(&scope).await?;
        info!("Cleared memory {scope} for {user_id}");
        Ok(())
    }
}
