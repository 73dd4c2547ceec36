//! Model client seam
//!
//! The generator talks to language models only through [`ModelClient`].
//! Provider adapters turn their transport errors into [`ModelFailure`] so
//! retry decisions never depend on a particular HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::ai::prompts::Prompt;
use crate::core::config::GenerationConfig;

/// Sampling parameters forwarded to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl ModelParams {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
        }
    }
}

/// Why a single model call failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelFailure {
    #[error("provider rejected the credentials: {0}")]
    AuthFailure(String),

    #[error("provider rate limit reached")]
    RateLimited { retry_after: Option<Duration> },

    #[error("model call timed out")]
    Timeout,

    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("model returned an empty response")]
    EmptyResponse,
}

impl ModelFailure {
    /// Whether another attempt could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ModelFailure::AuthFailure(_))
    }

    /// Classify a non-success HTTP response
    pub fn from_status(status: StatusCode, retry_after: Option<&str>, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => ModelFailure::AuthFailure(format!("{} {}", status, excerpt(body))),
            429 => ModelFailure::RateLimited {
                retry_after: retry_after.and_then(parse_retry_after),
            },
            408 | 504 => ModelFailure::Timeout,
            _ => ModelFailure::ProviderError(format!("{} {}", status, excerpt(body))),
        }
    }

    /// Classify a transport-level error; the request URL is left out of the text
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelFailure::Timeout
        } else {
            ModelFailure::ProviderError(err.without_url().to_string())
        }
    }
}

/// `Retry-After` in delta-seconds; HTTP dates are ignored
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn excerpt(body: &str) -> &str {
    let body = body.trim();
    match body.char_indices().nth(200) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}

/// Reject missing or whitespace-only completions
pub fn non_empty(text: Option<String>) -> Result<String, ModelFailure> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ModelFailure::EmptyResponse),
    }
}

/// A chat-style language model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one prompt and return the raw completion text
    async fn complete(&self, prompt: &Prompt, params: &ModelParams) -> Result<String, ModelFailure>;
}
