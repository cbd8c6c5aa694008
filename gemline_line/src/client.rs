use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A user's public profile.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub picture_url: Option<String>,
    pub status_message: Option<String>,
}

/// Outbound side of the messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Answer the event bound to `reply_token` with one text message.
    async fn reply(&self, reply_token: &str, text: &str) -> Result<()>;

    /// Send a proactive text message to `user_id`.
    async fn push(&self, user_id: &str, text: &str) -> Result<()>;

    async fn get_profile(&self, user_id: &str) -> Result<Profile>;
}

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<()> {
        (**self).reply(reply_token, text).await
    }

    async fn push(&self, user_id: &str, text: &str) -> Result<()> {
        (**self).push(user_id, text).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        (**self).get_profile(user_id).await
    }
}

/// LINE Messaging API client.
#[derive(Clone)]
pub struct LineClient {
    client: Client,
    access_token: String,
    api_base: String,
}

impl LineClient {
    #[must_use]
    pub fn new(access_token: String) -> Self {
        info!("Creating LineClient");
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            access_token,
            api_base: "https://api.line.me".to_string(),
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<()> {
        let response = self
            .client
            .post(format!("{}{path}", self.api_base))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

fn text_messages(text: &str) -> Value {
    json!([{ "type": "text", "text": text }])
}

#[async_trait]
impl Messenger for LineClient {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<()> {
        self.post_json(
            "/v2/bot/message/reply",
            &json!({ "replyToken": reply_token, "messages": text_messages(text) }),
        )
        .await?;
        debug!("Replied to {reply_token}");
        Ok(())
    }

    async fn push(&self, user_id: &str, text: &str) -> Result<()> {
        self.post_json(
            "/v2/bot/message/push",
            &json!({ "to": user_id, "messages": text_messages(text) }),
        )
        .await?;
        debug!("Pushed message to {user_id}");
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        let response = self
            .client
            .get(format!("{}/v2/bot/profile/{user_id}", self.api_base))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let profile = Self::check(response).await?.json::<Profile>().await?;
        Ok(profile)
    }
}
