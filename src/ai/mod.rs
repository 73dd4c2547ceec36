//! AI integration module
//!
//! This module provides the model seam used by the generator:
//! - [`ModelClient`] trait and failure classification
//! - Prompt construction
//! - OpenAI-compatible and Gemini adapters

pub mod client;
pub mod gemini;
pub mod openai;
pub mod prompts;

use std::sync::Arc;

use reqwest::Client;
use secrecy::SecretString;

use crate::core::config::{ProviderConfig, ProviderKind};
use crate::error::Result;

pub use client::{ModelClient, ModelFailure, ModelParams};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use prompts::{build_prompt, Prompt};

/// Build the adapter for the configured provider
pub fn build_client(provider: &ProviderConfig, api_key: SecretString) -> Result<Arc<dyn ModelClient>> {
    let http = Client::builder()
        .user_agent(concat!("commitsmith/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let client: Arc<dyn ModelClient> = match provider.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiClient::new(http, api_key, provider.base_url())),
        ProviderKind::Gemini => Arc::new(GeminiClient::new(http, api_key, provider.base_url())),
    };

    Ok(client)
}
