//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, and the
//! helpers here assemble the collaborators the long-running commands share.

use gemline_config::Config;
use gemline_conversation::{AssemblerConfig, Assistant, ConversationAssembler};
use gemline_core::{MemoryStore, ModeStore};
use gemline_line::{Dispatcher, Messenger};
use gemline_memory::{InMemoryStore, MemoryManager};
use gemline_providers::GeminiProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod chat;
mod info;
mod init;
mod serve;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use serve::{ServeInput, ServeStrategy};
pub use version::VersionStrategy;

/// Contract shared by all command strategies.
///
/// Strategies are stateless unit structs; everything a run needs arrives
/// through the associated `Input` type.
pub trait CommandStrategy: Send + Sync + 'static {
    type Input;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Mode and memory persistence behind trait objects.
struct Stores {
    modes: Arc<dyn ModeStore>,
    memory: Arc<dyn MemoryStore>,
}

async fn open_stores(config: &Config, ephemeral: bool) -> anyhow::Result<Stores> {
    if ephemeral {
        info!("Using in-process store; nothing will be persisted");
        let store = Arc::new(InMemoryStore::new());
        return Ok(Stores {
            modes: store.clone(),
            memory: store,
        });
    }

    Config::ensure_config_dir()?;
    info!("Connecting to database");
    let manager = Arc::new(MemoryManager::new(&config.database.url).await?);
    Ok(Stores {
        modes: manager.clone(),
        memory: manager,
    })
}

fn build_assistant(
    config: &Config,
    memory: Arc<dyn MemoryStore>,
) -> anyhow::Result<Arc<dyn Assistant>> {
    let gemini = &config.providers.gemini;
    let provider = GeminiProvider::new(gemini.api_key.clone())
        .with_base_url(gemini.base_url.clone())
        .with_generation(gemini.temperature, gemini.max_output_tokens);

    let clock = config.civil_clock()?;
    info!(
        "Assistant: model={}, timezone={}, memory scope={:?}, max_entries={}",
        gemini.model,
        clock.timezone(),
        config.memory.scope,
        config.memory.max_entries
    );

    let assembler_config = AssemblerConfig {
        model: gemini.model.clone(),
        persona: config.assistant.persona.clone(),
        scope: config.memory.scope,
        max_entries: config.memory.max_entries,
        replay_timestamps: config.memory.replay_timestamps,
    };

    let assistant: Arc<dyn Assistant> = Arc::new(ConversationAssembler::new(
        provider,
        memory,
        clock,
        assembler_config,
    ));
    Ok(assistant)
}

/// Wire stores, model and `messenger` into a dispatcher.
async fn build_dispatcher(
    config: &Config,
    messenger: Arc<dyn Messenger>,
    ephemeral: bool,
) -> anyhow::Result<Dispatcher> {
    let stores = open_stores(config, ephemeral).await?;
    let assistant = build_assistant(config, stores.memory)?;

    Ok(Dispatcher::new(
        messenger,
        stores.modes,
        assistant,
        Duration::from_millis(config.assistant.greeting_delay_ms),
    ))
}
