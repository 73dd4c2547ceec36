//! Gemini API client

use async_trait::async_trait;
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::ai::client::{non_empty, ModelClient, ModelFailure, ModelParams};
use crate::ai::prompts::Prompt;

/// Header carrying the API key; keeps it out of request URLs
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client on top of a shared HTTP client
    pub fn new(client: Client, api_key: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.base_url, model)
    }

    fn api_key_header(&self) -> Result<HeaderValue, ModelFailure> {
        let mut value = HeaderValue::from_str(self.api_key.expose_secret()).map_err(|_| {
            ModelFailure::AuthFailure("API key contains characters not allowed in a header".into())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn complete(&self, prompt: &Prompt, params: &ModelParams) -> Result<String, ModelFailure> {
        let request_body = GeminiRequest::new(prompt, params);

        tracing::debug!(model = %params.model, "Sending Gemini generateContent");

        let response = self
            .client
            .post(self.endpoint(&params.model))
            .header(API_KEY_HEADER, self.api_key_header()?)
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

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ModelFailure::ProviderError(format!("Failed to parse response: {}", e.without_url())))?;

        tracing::trace!(?gemini_response, "Raw Gemini response");

        non_empty(gemini_response.into_text())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gemini API Request/Response types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationSettings,
}

impl GeminiRequest {
    fn new(prompt: &Prompt, params: &ModelParams) -> Self {
        Self {
            system_instruction: Content::text(None, &prompt.system),
            contents: vec![Content::text(Some("user"), &prompt.user)],
            generation_config: GenerationSettings {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
                top_p: params.top_p,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GeminiResponse {
    /// Concatenate the text parts of the first candidate
    fn into_text(self) -> Option<String> {
        self.candidates.into_iter().next().and_then(|c| c.content).map(|content| {
            content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<String>()
        })
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}
