//! CLI module for commitsmith
//!
//! This module contains all CLI command definitions and handlers using clap.

pub mod commands;
pub mod config;
pub mod generate;
pub mod validate;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::core::config::{resolve, ConfigLayer, ResolvedConfig};
use crate::error::Result;

pub use commands::{Cli, Commands};

/// Resolve configuration: defaults, then the file, the environment and `overrides`.
///
/// An explicitly named file must exist; the default file is optional.
pub fn load_config(config_file: Option<&Path>, overrides: ConfigLayer) -> Result<ResolvedConfig> {
    let file_layer = match config_file {
        Some(path) => ConfigLayer::load(path)?,
        None => ConfigLayer::load_default()?,
    };
    let env_layer = ConfigLayer::from_env()?;

    let config = resolve(&[file_layer, env_layer, overrides])?;
    tracing::debug!(?config, "Resolved configuration");
    Ok(config)
}

/// Read text from a file, or from stdin when the path is `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
