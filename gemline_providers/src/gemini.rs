use async_trait::async_trait;
use gemline_core::{ChatMessage, LLMProvider, LLMResponse, Role, Usage};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        info!("Creating GeminiProvider");
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: None,
            max_output_tokens: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn with_generation(
        mut self,
        temperature: Option<f32>,
        max_output_tokens: Option<u32>,
    ) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn build_request(&self, system_prompt: &str, messages: &[ChatMessage]) -> Value {
        let contents: Vec<Value> = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Model => "model",
                };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        let mut request = json!({ "contents": contents });

        if !system_prompt.is_empty() {
            request["systemInstruction"] = json!({ "parts": [{ "text": system_prompt }] });
        }

        let mut generation = serde_json::Map::new();
        if let Some(t) = self.temperature {
            generation.insert("temperature".into(), json!(t));
        }
        if let Some(n) = self.max_output_tokens {
            generation.insert("maxOutputTokens".into(), json!(n));
        }
        if !generation.is_empty() {
            request["generationConfig"] = Value::Object(generation);
        }

        request
    }

    fn parse_response(response: &Value) -> anyhow::Result<LLMResponse> {
        if let Some(reason) = response["promptFeedback"]["blockReason"].as_str() {
            anyhow::bail!("Prompt blocked by Gemini: {reason}");
        }

        let parts = response["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content parts"))?;

        let content: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();

        if content.trim().is_empty() {
            anyhow::bail!("Gemini returned an empty reply");
        }

        let count = |key: &str| {
            u32::try_from(response["usageMetadata"][key].as_u64().unwrap_or(0)).unwrap_or(0)
        };
        let usage = response["usageMetadata"].is_object().then(|| Usage {
            prompt_tokens: count("promptTokenCount"),
            completion_tokens: count("candidatesTokenCount"),
            total_tokens: count("totalTokenCount"),
        });

        Ok(LLMResponse { content, usage })
    }

    async fn try_send(&self, model: &str, request: &Value) -> anyhow::Result<LLMResponse> {
        let response = self
            .client
            .post(format!("{}/models/{model}:generateContent", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({status}): {body}");
        }

        let body = response.json::<Value>().await?;
        Self::parse_response(&body)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        model: &str,
    ) -> anyhow::Result<LLMResponse> {
        let request = self.build_request(system_prompt, messages);

        info!(
            "Sending request to Gemini API: model={model}, turns={}",
            messages.len()
        );
        let response = self.try_send(model, &request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Gemini usage: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }
        Ok(response)
    }
}
