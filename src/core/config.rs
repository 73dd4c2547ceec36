//! Generation configuration
//!
//! Configuration arrives in layers (built-in defaults, a TOML file, the
//! environment, command-line flags). Each layer is a [`ConfigLayer`] with
//! every field optional; [`resolve`] folds them in order and validates the
//! result once, producing the read-only [`GenerationConfig`] the generator
//! trusts.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize, Serializer};
use url::Url;

use crate::error::{CommitsmithError, Result};

/// Prefix shared by all environment variables
pub const ENV_PREFIX: &str = "COMMITSMITH_";

/// Available model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions (default)
    #[default]
    OpenAi,
    /// Google Gemini generateContent
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Environment variable holding the API key
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Model used when no layer names one
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4-turbo-preview",
            ProviderKind::Gemini => "gemini-2.0-flash",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta/models",
        }
    }

    pub fn all() -> &'static [ProviderKind] {
        &[ProviderKind::OpenAi, ProviderKind::Gemini]
    }
}

impl FromStr for ProviderKind {
    type Err = CommitsmithError;

    fn from_str(s: &str) -> Result<Self> {
        ProviderKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s.to_ascii_lowercase())
            .ok_or_else(|| {
                CommitsmithError::Config(format!(
                    "unknown provider '{}' (expected one of: openai, gemini)",
                    s
                ))
            })
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved runtime parameters for one generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationConfig {
    /// Model identifier sent to the provider
    pub model: String,
    /// Sampling temperature (0.0–2.0)
    #[serde(serialize_with = "serialize_f32")]
    pub temperature: f32,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Nucleus-sampling value (0.0–1.0)
    #[serde(serialize_with = "serialize_f32")]
    pub top_p: f32,
    /// Upper bound on model calls per generation
    pub max_attempts: u32,
    /// Wrap width for non-code body lines
    pub max_line_width: usize,
    /// Maximum title length
    pub max_title_length: usize,
    /// Whether a message without a ticket is rejected
    pub require_ticket: bool,
    /// Bound on a single model call
    #[serde(rename = "timeout_secs", serialize_with = "serialize_secs")]
    pub request_timeout: Duration,
    /// Diffs longer than this are elided from the middle
    pub max_diff_chars: usize,
    /// Custom role text replacing the default prompt preamble
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: ProviderKind::default().default_model().to_string(),
            temperature: 0.2,
            max_tokens: 500,
            top_p: 1.0,
            max_attempts: 3,
            max_line_width: 70,
            max_title_length: 72,
            require_ticket: true,
            request_timeout: Duration::from_secs(60),
            max_diff_chars: 20_000,
            system_prompt: None,
        }
    }
}

impl GenerationConfig {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_max_line_width(mut self, max_line_width: usize) -> Self {
        self.max_line_width = max_line_width;
        self
    }

    #[must_use]
    pub fn with_require_ticket(mut self, require_ticket: bool) -> Self {
        self.require_ticket = require_ticket;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    #[must_use]
    pub fn with_max_diff_chars(mut self, max_diff_chars: usize) -> Self {
        self.max_diff_chars = max_diff_chars;
        self
    }

    /// Check every numeric range, reporting all problems at once
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.model.trim().is_empty() {
            problems.push("model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            problems.push(format!(
                "temperature must be between 0.0 and 2.0 (got {})",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            problems.push("max_tokens must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            problems.push(format!("top_p must be between 0.0 and 1.0 (got {})", self.top_p));
        }
        if self.max_attempts == 0 {
            problems.push("max_attempts must be at least 1".to_string());
        }
        if self.max_line_width == 0 {
            problems.push("max_line_width must be greater than 0".to_string());
        }
        if self.max_title_length == 0 {
            problems.push("max_title_length must be greater than 0".to_string());
        }
        if self.request_timeout.is_zero() {
            problems.push("timeout_secs must be greater than 0".to_string());
        }
        if self.max_diff_chars == 0 {
            problems.push("max_diff_chars must be greater than 0".to_string());
        }

        problems
    }
}

/// Print `0.2` rather than the widened `0.20000000298023224`
fn serialize_f32<S: Serializer>(value: &f32, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64((f64::from(*value) * 1e6).round() / 1e6)
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs())
}

/// Which provider to talk to and where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl ProviderConfig {
    /// Base URL with the provider default applied
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.kind.default_api_key_env())
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ResolvedConfig {
    pub generation: GenerationConfig,
    pub provider: ProviderConfig,
}

/// Generation settings of a single layer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationLayer {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub max_attempts: Option<u32>,
    pub max_line_width: Option<usize>,
    pub max_title_length: Option<usize>,
    pub require_ticket: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub max_diff_chars: Option<usize>,
    pub system_prompt: Option<String>,
}

/// Provider settings of a single layer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderLayer {
    pub kind: Option<ProviderKind>,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
}

/// One configuration source; unset fields leave earlier layers untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub generation: GenerationLayer,
    pub provider: ProviderLayer,
}

impl ConfigLayer {
    /// Parse a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a TOML file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CommitsmithError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load the default configuration file, or an empty layer if it does not exist
    pub fn load_default() -> Result<Self> {
        let path = config_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Build a layer from `COMMITSMITH_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_pairs(std::env::vars())
    }

    /// Build a layer from key/value pairs; unrelated keys are ignored
    pub fn from_env_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();

        for (key, value) in pairs {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let generation = &mut layer.generation;
            match name {
                "MODEL" => generation.model = Some(value),
                "TEMPERATURE" => generation.temperature = Some(parse_env(&key, &value)?),
                "MAX_TOKENS" => generation.max_tokens = Some(parse_env(&key, &value)?),
                "TOP_P" => generation.top_p = Some(parse_env(&key, &value)?),
                "MAX_ATTEMPTS" => generation.max_attempts = Some(parse_env(&key, &value)?),
                "LINE_WIDTH" => generation.max_line_width = Some(parse_env(&key, &value)?),
                "REQUIRE_TICKET" => generation.require_ticket = Some(parse_env(&key, &value)?),
                "TIMEOUT_SECS" => generation.timeout_secs = Some(parse_env(&key, &value)?),
                "PROVIDER" => layer.provider.kind = Some(value.parse()?),
                "BASE_URL" => layer.provider.base_url = Some(value),
                _ => {}
            }
        }

        Ok(layer)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CommitsmithError::Config(format!("{} has an invalid value '{}'", key, value))
    })
}

/// Fold layers over the defaults (later layers win) and validate the result
pub fn resolve(layers: &[ConfigLayer]) -> Result<ResolvedConfig> {
    let mut config = ResolvedConfig::default();

    for layer in layers {
        apply(&mut config, layer);
    }
    if layers.iter().all(|layer| layer.generation.model.is_none()) {
        config.generation.model = config.provider.kind.default_model().to_string();
    }

    let mut problems = config.generation.problems();
    if let Some(base_url) = &config.provider.base_url {
        if let Err(e) = Url::parse(base_url) {
            problems.push(format!("base_url '{}' is not a valid URL: {}", base_url, e));
        }
    }

    if problems.is_empty() {
        Ok(config)
    } else {
        Err(CommitsmithError::Config(problems.join("; ")))
    }
}

fn apply(config: &mut ResolvedConfig, layer: &ConfigLayer) {
    let generation = &mut config.generation;
    let g = &layer.generation;

    if let Some(model) = &g.model {
        generation.model = model.clone();
    }
    if let Some(temperature) = g.temperature {
        generation.temperature = temperature;
    }
    if let Some(max_tokens) = g.max_tokens {
        generation.max_tokens = max_tokens;
    }
    if let Some(top_p) = g.top_p {
        generation.top_p = top_p;
    }
    if let Some(max_attempts) = g.max_attempts {
        generation.max_attempts = max_attempts;
    }
    if let Some(max_line_width) = g.max_line_width {
        generation.max_line_width = max_line_width;
    }
    if let Some(max_title_length) = g.max_title_length {
        generation.max_title_length = max_title_length;
    }
    if let Some(require_ticket) = g.require_ticket {
        generation.require_ticket = require_ticket;
    }
    if let Some(timeout_secs) = g.timeout_secs {
        generation.request_timeout = Duration::from_secs(timeout_secs);
    }
    if let Some(max_diff_chars) = g.max_diff_chars {
        generation.max_diff_chars = max_diff_chars;
    }
    if let Some(system_prompt) = &g.system_prompt {
        generation.system_prompt = Some(system_prompt.clone());
    }

    let provider = &mut config.provider;
    let p = &layer.provider;

    if let Some(kind) = p.kind {
        provider.kind = kind;
    }
    if let Some(base_url) = &p.base_url {
        provider.base_url = Some(base_url.clone());
    }
    if let Some(api_key_env) = &p.api_key_env {
        provider.api_key_env = Some(api_key_env.clone());
    }
}

/// Get the default configuration file path
pub fn config_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "commitsmith", "commitsmith")
        .ok_or_else(|| CommitsmithError::Config("Could not determine config directory".into()))?;

    Ok(project_dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = resolve(&[]).unwrap();
        assert_eq!(config.generation, GenerationConfig::default());
        assert_eq!(config.generation.max_line_width, 70);
        assert_eq!(config.generation.max_attempts, 3);
        assert!(config.generation.require_ticket);
        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.provider.api_key_env(), "OPENAI_API_KEY");
    }

    #[test]
    fn test_later_layers_win() {
        let file = ConfigLayer::from_toml_str(
            r#"
            [generation]
            model = "gpt-4o-mini"
            temperature = 0.5
            max_attempts = 5

            [provider]
            kind = "gemini"
            "#,
        )
        .unwrap();
        let env_layer = ConfigLayer::from_env_pairs(env(&[
            ("COMMITSMITH_TEMPERATURE", "0.1"),
            ("COMMITSMITH_REQUIRE_TICKET", "false"),
            ("HOME", "/home/someone"),
        ]))
        .unwrap();
        let cli = ConfigLayer {
            generation: GenerationLayer {
                max_attempts: Some(2),
                ..GenerationLayer::default()
            },
            ..ConfigLayer::default()
        };

        let config = resolve(&[file, env_layer, cli]).unwrap();
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.temperature, 0.1);
        assert_eq!(config.generation.max_attempts, 2);
        assert!(!config.generation.require_ticket);
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
        assert_eq!(config.provider.api_key_env(), "GEMINI_API_KEY");
    }

    #[test]
    fn test_provider_picks_default_model() {
        let gemini = ConfigLayer::from_toml_str("[provider]\nkind = \"gemini\"\n").unwrap();
        let config = resolve(&[gemini.clone()]).unwrap();
        assert_eq!(config.generation.model, "gemini-2.0-flash");
        assert_eq!(config.provider.api_key_env(), "GEMINI_API_KEY");

        let explicit = ConfigLayer::from_env_pairs(env(&[("COMMITSMITH_MODEL", "gemini-1.5-pro")])).unwrap();
        let config = resolve(&[gemini, explicit]).unwrap();
        assert_eq!(config.generation.model, "gemini-1.5-pro");

        let config = resolve(&[]).unwrap();
        assert_eq!(config.generation.model, "gpt-4-turbo-preview");
    }

    #[test]
    fn test_out_of_range_values_reported_together() {
        let layer = ConfigLayer {
            generation: GenerationLayer {
                temperature: Some(2.5),
                top_p: Some(1.5),
                max_attempts: Some(0),
                max_line_width: Some(0),
                ..GenerationLayer::default()
            },
            ..ConfigLayer::default()
        };

        let err = resolve(&[layer]).unwrap_err().to_string();
        assert!(err.contains("temperature"));
        assert!(err.contains("top_p"));
        assert!(err.contains("max_attempts"));
        assert!(err.contains("max_line_width"));
    }

    #[test]
    fn test_invalid_base_url() {
        let layer = ConfigLayer {
            provider: ProviderLayer {
                base_url: Some("not a url".to_string()),
                ..ProviderLayer::default()
            },
            ..ConfigLayer::default()
        };
        assert!(resolve(&[layer]).is_err());
    }

    #[test]
    fn test_invalid_env_value() {
        let err = ConfigLayer::from_env_pairs(env(&[("COMMITSMITH_MAX_ATTEMPTS", "many")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("COMMITSMITH_MAX_ATTEMPTS"));
    }

    #[test]
    fn test_unknown_toml_key_rejected() {
        assert!(ConfigLayer::from_toml_str("[generation]\nmodle = \"x\"\n").is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generation]\nmax_line_width = 80\ntimeout_secs = 5").unwrap();

        let layer = ConfigLayer::load(file.path()).unwrap();
        let config = resolve(&[layer]).unwrap();
        assert_eq!(config.generation.max_line_width, 80);
        assert_eq!(config.generation.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigLayer::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert!("claude".parse::<ProviderKind>().is_err());
    }
}
