//! CLI command definitions using clap
//!
//! Defines the command structure for the `commitsmith` (alias `csm`) tool.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::core::config::{ConfigLayer, GenerationLayer, ProviderKind, ProviderLayer};

/// commitsmith - structured commit messages from staged changes
///
/// Generates `TYPE/SEVERITY: TICKET - summary` commit messages with a
/// language model and checks existing messages against the same format.
#[derive(Parser, Debug)]
#[command(name = "commitsmith", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file to use instead of the default location
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a commit message for the staged changes
    Generate(GenerateArgs),

    /// Check a commit message against the format rules
    Validate(ValidateArgs),

    /// Inspect configuration
    Config(ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Generate Command
// ─────────────────────────────────────────────────────────────────────────────

/// Generate command arguments
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Ticket the message must reference (defaults to the one in the branch name)
    #[arg(short, long)]
    pub ticket: Option<String>,

    /// Branch name given to the model as context (defaults to the current branch)
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Related issue identifier (repeatable)
    #[arg(long = "issue", value_name = "ID")]
    pub issues: Vec<String>,

    /// Extra context as KEY=VALUE (repeatable)
    #[arg(long = "context", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub context: Vec<(String, String)>,

    /// Path to the git repository (default: current directory)
    #[arg(long, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Read the diff from a file, or '-' for stdin, instead of the staged changes
    #[arg(long, value_name = "PATH")]
    pub diff_file: Option<PathBuf>,

    /// Create a commit with the generated message
    #[arg(long)]
    pub commit: bool,

    #[command(flatten)]
    pub overrides: GenerationOverrides,
}

/// Per-invocation overrides of configuration values
#[derive(Args, Debug, Default)]
pub struct GenerationOverrides {
    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum output tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling value (0.0-1.0)
    #[arg(long)]
    pub top_p: Option<f32>,

    /// Maximum number of model calls
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Wrap width for body lines
    #[arg(long)]
    pub line_width: Option<usize>,

    /// Accept messages without a ticket
    #[arg(long)]
    pub no_ticket: bool,

    /// Per-call timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Model provider
    #[arg(long)]
    pub provider: Option<ProviderKind>,
}

impl GenerationOverrides {
    /// Turn the flags into the highest-priority configuration layer
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            generation: GenerationLayer {
                model: self.model.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                top_p: self.top_p,
                max_attempts: self.max_attempts,
                max_line_width: self.line_width,
                require_ticket: self.no_ticket.then_some(false),
                timeout_secs: self.timeout,
                ..GenerationLayer::default()
            },
            provider: ProviderLayer {
                kind: self.provider,
                ..ProviderLayer::default()
            },
        }
    }
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validate Command
// ─────────────────────────────────────────────────────────────────────────────

/// Validate command arguments
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// File holding the message, or '-' for stdin (default)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Wrap width for body lines
    #[arg(long)]
    pub line_width: Option<usize>,

    /// Accept messages without a ticket
    #[arg(long)]
    pub no_ticket: bool,

    /// Ticket the message must reference
    #[arg(short, long)]
    pub ticket: Option<String>,
}

impl ValidateArgs {
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            generation: GenerationLayer {
                max_line_width: self.line_width,
                require_ticket: self.no_ticket.then_some(false),
                ..GenerationLayer::default()
            },
            ..ConfigLayer::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the resolved configuration
    Show,

    /// Print the configuration file location
    Path,
}
