//! Core functionality for commitsmith
//!
//! This module contains shared plumbing around the generator:
//! - Layered configuration
//! - API key lookup
//! - Git repository operations

pub mod config;
pub mod credentials;
pub mod git;

pub use config::{GenerationConfig, ProviderConfig, ResolvedConfig};
pub use credentials::CredentialStore;
pub use git::GitRepository;
