//! OpenAI-compatible chat-completions delegate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::delegate::{Delegate, DelegateError, DelegateResult};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Delegate backed by a `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiDelegate {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiDelegate {
    /// Create a delegate for the public endpoint and default model.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> DelegateResult<Self> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT, DEFAULT_MODEL, timeout)
    }

    /// Create a delegate for a custom endpoint and model.
    pub fn with_endpoint(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> DelegateResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(DelegateError::NotConfigured("API key is empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DelegateError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Delegate for OpenAiDelegate {
    fn name(&self) -> &str {
        "openai"
    }

    fn fingerprint(&self) -> String {
        format!("openai:{}:{}", self.base_url, self.model)
    }

    async fn complete(&self, prompt: &str) -> DelegateResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        debug!(model = %self.model, "sending extraction request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "delegate API returned an error");
            return Err(DelegateError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(DelegateError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
