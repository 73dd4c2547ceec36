//! Configuration CLI command handlers

use std::path::Path;

use crate::cli::commands::ConfigCommand;
use crate::cli::load_config;
use crate::core::config::{config_path, ConfigLayer};
use crate::core::credentials::CredentialStore;
use crate::error::Result;

/// Handle configuration commands
pub fn handle_config(command: ConfigCommand, config_file: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommand::Show => handle_show(config_file),
        ConfigCommand::Path => handle_path(config_file),
    }
}

/// Print the resolved configuration as TOML
fn handle_show(config_file: Option<&Path>) -> Result<()> {
    let config = load_config(config_file, ConfigLayer::default())?;
    print!("{}", toml::to_string_pretty(&config)?);

    let key_env = config.provider.api_key_env();
    match CredentialStore::api_key(&config.provider) {
        Ok(key) => println!("\n# API key ({}): {}", key_env, CredentialStore::mask_token(&key)),
        Err(_) => println!("\n# API key ({}): Not configured", key_env),
    }
    Ok(())
}

fn handle_path(config_file: Option<&Path>) -> Result<()> {
    let path = match config_file {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };
    let state = if path.exists() { "" } else { " (not created)" };
    println!("{}{}", path.display(), state);
    Ok(())
}
