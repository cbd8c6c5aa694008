use async_trait::async_trait;

use crate::Result;
use crate::client::{Messenger, Profile};

/// Messenger for local sessions: everything is printed to stdout.
pub struct ConsoleMessenger {
    display_name: String,
}

impl ConsoleMessenger {
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn reply(&self, _reply_token: &str, text: &str) -> Result<()> {
        println!("🤖 {text}");
        Ok(())
    }

    async fn push(&self, _user_id: &str, text: &str) -> Result<()> {
        println!("📨 {text}");
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        Ok(Profile {
            user_id: user_id.to_string(),
            display_name: self.display_name.clone(),
            picture_url: None,
            status_message: None,
        })
    }
}
