//! Custom error types for commitsmith
//!
//! User-friendly error messages for all failure scenarios outside the
//! generation pipeline itself, which reports through
//! [`GenerationError`](crate::generator::GenerationError).

use thiserror::Error;

use crate::generator::GenerationError;
use crate::message::Violation;

/// Main error type for the commitsmith application
#[derive(Error, Debug)]
pub enum CommitsmithError {
    /// Not running in a git repository
    #[error("This directory is not a git repository.\n\n  → Run 'git init' to create one, or pass the diff with '--diff-file'.")]
    NotGitRepository,

    /// Nothing staged and no diff supplied
    #[error("No staged changes to describe.\n\n  → Stage files with 'git add', or pass a diff with '--diff-file'.")]
    NothingStaged,

    /// API key environment variable is unset or empty
    #[error("API key is not set up.\n\n  → Export {0} with a valid key for the configured provider.")]
    MissingApiKey(String),

    /// Git operation error
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Network client setup error
    #[error("Network request failed: {0}\n\n  → Check your internet connection.")]
    Network(#[from] reqwest::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// A message checked with `validate` breaks the format
    #[error("Commit message does not follow the format ({} problem(s)).", .0.len())]
    InvalidMessage(Vec<Violation>),

    /// Commit message generation failed
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),
}

impl CommitsmithError {
    /// Format violations to list under the error message
    pub fn violations(&self) -> &[Violation] {
        match self {
            CommitsmithError::InvalidMessage(violations) => violations,
            CommitsmithError::Generation(err) => err.violations(),
            _ => &[],
        }
    }
}

impl From<toml::de::Error> for CommitsmithError {
    fn from(err: toml::de::Error) -> Self {
        CommitsmithError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for CommitsmithError {
    fn from(err: toml::ser::Error) -> Self {
        CommitsmithError::Toml(err.to_string())
    }
}

/// Result type alias using CommitsmithError
pub type Result<T> = std::result::Result<T, CommitsmithError>;
