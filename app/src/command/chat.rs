//! Local conversation through the same dispatcher the webhook uses.

use gemline_config::Config;
use gemline_line::{ConsoleMessenger, Messenger};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

const REPLY_TOKEN: &str = "console";

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// User id modes and memory are stored under
    pub user_id: String,
    /// Use the in-process store instead of the database
    pub ephemeral: bool,
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
}

/// Strategy for chatting from the terminal.
///
/// Replies and pushes are printed instead of sent, so echo mode, the
/// activation greeting and assistant mode all behave as they do on LINE.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        config.validate_assistant()?;

        let messenger: Arc<dyn Messenger> = Arc::new(ConsoleMessenger::new(input.user_id.clone()));
        let dispatcher = super::build_dispatcher(&config, messenger, input.ephemeral).await?;

        if let Some(message) = input.message {
            let outcome = dispatcher
                .handle_text(REPLY_TOKEN, &input.user_id, &message)
                .await;
            info!("Dispatched: {outcome:?}");
            return Ok(());
        }

        println!("=== gemline chat as {} ===", input.user_id);
        println!("Send 'gemini' to start the assistant, '結束gemini' to stop.");
        println!("Type 'exit', 'quit', or Ctrl+C to end the session.\n");

        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();

            if matches!(line, "exit" | "quit" | "q") {
                break;
            }
            if line.is_empty() {
                continue;
            }

            let outcome = dispatcher.handle_text(REPLY_TOKEN, &input.user_id, line).await;
            info!("Dispatched: {outcome:?}");
        }

        println!("\nSession ended.");
        Ok(())
    }
}
