//! Provider API keys
//!
//! Keys are read from the environment only and held as [`SecretString`]
//! so they never end up in logs or `Debug` output. The variable name comes
//! from the provider configuration:
//! - `OPENAI_API_KEY` for the OpenAI-compatible provider
//! - `GEMINI_API_KEY` for Gemini
//! - or `api_key_env` when set

use secrecy::{ExposeSecret, SecretString};

use crate::core::config::ProviderConfig;
use crate::error::{CommitsmithError, Result};

/// Credential lookup for model providers
pub struct CredentialStore;

impl CredentialStore {
    /// Retrieve the API key for a provider from the process environment
    pub fn api_key(provider: &ProviderConfig) -> Result<SecretString> {
        Self::api_key_with(provider, |name| std::env::var(name).ok())
    }

    /// Retrieve the API key through a custom variable lookup
    pub fn api_key_with<F>(provider: &ProviderConfig, lookup: F) -> Result<SecretString>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = provider.api_key_env();
        match lookup(name) {
            Some(key) if !key.trim().is_empty() => Ok(SecretString::from(key.trim().to_string())),
            _ => Err(CommitsmithError::MissingApiKey(name.to_string())),
        }
    }

    /// Mask a token for display (show first 4 and last 4 chars)
    pub fn mask_token(token: &SecretString) -> String {
        let exposed = token.expose_secret();
        let len = exposed.chars().count();
        if len <= 8 {
            "*".repeat(len)
        } else {
            let head: String = exposed.chars().take(4).collect();
            let tail: String = exposed.chars().skip(len - 4).collect();
            format!("{}...{}", head, tail)
        }
    }
}
