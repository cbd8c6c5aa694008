use gemline_conversation::Assistant;
use gemline_core::{Mode, ModeStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::client::Messenger;
use crate::command::Command;

/// What the dispatcher did with one text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Echoed,
    /// `greeted` is true when the personalised push went out.
    Activated { greeted: bool },
    Stopped,
    Reset,
    Answered,
    /// The assistant failed and the apology was sent instead.
    Unavailable,
}

/// Routes inbound text by the sender's mode.
pub struct Dispatcher<M = Arc<dyn Messenger>, S = Arc<dyn ModeStore>, A = Arc<dyn Assistant>> {
    messenger: M,
    modes: S,
    assistant: A,
    greeting_delay: Duration,
}

impl<M, S, A> Dispatcher<M, S, A>
where
    M: Messenger,
    S: ModeStore,
    A: Assistant,
{
    pub const fn new(messenger: M, modes: S, assistant: A, greeting_delay: Duration) -> Self {
        Self {
            messenger,
            modes,
            assistant,
            greeting_delay,
        }
    }

    /// Handle one text message. Every branch answers the user; collaborator
    /// failures are logged and degrade to the safest reply.
    pub async fn handle_text(
        &self,
        reply_token: &str,
        user_id: &str,
        text: &str,
    ) -> DispatchOutcome {
        let text = text.trim();

        match Command::parse_from_text(text) {
            Some(Command::Stop) => {
                info!("[{user_id}] Command: stop");
                self.store_mode(user_id, Mode::Echo).await;
                self.send_reply(reply_token, Command::stopped_text()).await;
                DispatchOutcome::Stopped
            }
            Some(Command::Activate) => {
                info!("[{user_id}] Command: activate");
                self.store_mode(user_id, Mode::Assistant).await;
                let greeted = self.greet(reply_token, user_id).await;
                DispatchOutcome::Activated { greeted }
            }
            Some(Command::Reset) => {
                info!("[{user_id}] Command: reset");
                if let Err(e) = self.assistant.reset(user_id).await {
                    error!("[{user_id}] Failed to clear memory: {e}");
                }
                self.send_reply(reply_token, Command::reset_text()).await;
                DispatchOutcome::Reset
            }
            None => self.route(reply_token, user_id, text).await,
        }
    }

    async fn route(&self, reply_token: &str, user_id: &str, text: &str) -> DispatchOutcome {
        let mode = match self.modes.get_mode(user_id).await {
            Ok(mode) => mode,
            Err(e) => {
                warn!("[{user_id}] Failed to read mode, falling back to echo: {e}");
                Mode::Echo
            }
        };
        debug!("[{user_id}] Mode: {mode}");

        if !mode.is_assistant() {
            self.send_reply(reply_token, text).await;
            return DispatchOutcome::Echoed;
        }

        info!("[{user_id}] Message: {text}");
        match self.assistant.respond(user_id, text).await {
            Ok(reply) => {
                info!("[{user_id}] Response: {reply}");
                self.send_reply(reply_token, &reply).await;
                DispatchOutcome::Answered
            }
            Err(e) => {
                error!("[{user_id}] Assistant failed: {e}");
                self.send_reply(reply_token, Command::unavailable_text()).await;
                DispatchOutcome::Unavailable
            }
        }
    }

    /// Confirm activation and push a personalised greeting. Without a
    /// profile the user gets a single generic greeting reply instead.
    async fn greet(&self, reply_token: &str, user_id: &str) -> bool {
        let profile = match self.messenger.get_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("[{user_id}] Failed to fetch profile: {e}");
                self.send_reply(reply_token, Command::generic_greeting_text()).await;
                return false;
            }
        };

        self.send_reply(reply_token, Command::activated_text()).await;
        tokio::time::sleep(self.greeting_delay).await;

        match self
            .messenger
            .push(user_id, &Command::greeting_text(&profile.display_name))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!("[{user_id}] Failed to push greeting: {e}");
                false
            }
        }
    }

    async fn store_mode(&self, user_id: &str, mode: Mode) {
        if let Err(e) = self.modes.set_mode(user_id, mode).await {
            error!("[{user_id}] Failed to store mode {mode}: {e}");
        }
    }

    async fn send_reply(&self, reply_token: &str, text: &str) {
        if let Err(e) = self.messenger.reply(reply_token, text).await {
            error!("Failed to send reply: {e}");
        }
    }
}
