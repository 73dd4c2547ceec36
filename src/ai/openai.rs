//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::ai::client::{non_empty, ModelClient, ModelFailure, ModelParams};
use crate::ai::prompts::Prompt;

/// Chat completions client
pub struct OpenAiClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client on top of a shared HTTP client
    pub fn new(client: Client, api_key: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, prompt: &Prompt, params: &ModelParams) -> Result<String, ModelFailure> {
        let request_body = ChatRequest::new(prompt, params);

        tracing::debug!(model = %params.model, endpoint = %self.endpoint(), "Sending chat completion");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ModelFailure::from_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelFailure::from_status(
                status,
                retry_after.as_deref(),
                &error_text,
            ));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelFailure::ProviderError(format!("Failed to parse response: {}", e.without_url())))?;

        tracing::trace!(?chat_response, "Raw chat completion");

        non_empty(chat_response.into_text())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat completions request/response types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

impl<'a> ChatRequest<'a> {
    fn new(prompt: &'a Prompt, params: &'a ModelParams) -> Self {
        Self {
            model: &params.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
