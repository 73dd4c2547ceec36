//! Validate CLI command handler

use std::path::{Path, PathBuf};

use crate::cli::commands::ValidateArgs;
use crate::cli::{load_config, read_input};
use crate::error::{CommitsmithError, Result};
use crate::message::{validate, Ticket, ValidationResult, ValidationRules};

/// Handle the validate command
pub fn handle_validate(args: ValidateArgs, config_file: Option<&Path>) -> Result<()> {
    let config = load_config(config_file, args.to_layer())?;

    let mut rules = ValidationRules::from_config(&config.generation);
    if let Some(ticket) = &args.ticket {
        let expected = Ticket::parse(ticket).ok_or_else(|| {
            CommitsmithError::InvalidInput(format!(
                "Ticket '{}' does not match the expected format (e.g. AB-1234).",
                ticket
            ))
        })?;
        rules.ticket_required = true;
        rules.expected_ticket = Some(expected);
    }

    let path = args.file.unwrap_or_else(|| PathBuf::from("-"));
    let text = read_input(&path)?;

    match validate(&text, &rules) {
        ValidationResult::Valid(message) => {
            println!("✓ Commit message is valid");
            println!("  type:     {}", message.commit_type);
            println!(
                "  severity: {}",
                message.severity.map_or("-", |s| s.as_str())
            );
            println!(
                "  ticket:   {}",
                message.ticket.as_ref().map_or("-", |t| t.as_str())
            );
            println!("  summary:  {}", message.summary);
            Ok(())
        }
        ValidationResult::Invalid(violations) => Err(CommitsmithError::InvalidMessage(violations)),
    }
}
