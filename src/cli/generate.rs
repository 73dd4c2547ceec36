//! Generate CLI command handler

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::ai::build_client;
use crate::cli::commands::GenerateArgs;
use crate::cli::{load_config, read_input};
use crate::core::credentials::CredentialStore;
use crate::core::git::GitRepository;
use crate::error::{CommitsmithError, Result};
use crate::generator::CommitGenerator;
use crate::message::Ticket;
use crate::request::{CommitContext, CommitRequest};

/// Handle the generate command
pub async fn handle_generate(args: GenerateArgs, config_file: Option<&Path>) -> Result<()> {
    let config = load_config(config_file, args.overrides.to_layer())?;

    let repo_path = args.repo.clone().unwrap_or_else(|| PathBuf::from("."));

    // A diff file makes the repository optional
    let git = match &args.diff_file {
        Some(_) => GitRepository::discover(&repo_path).ok(),
        None => Some(GitRepository::discover(&repo_path)?),
    };

    let diff = match (&args.diff_file, &git) {
        (Some(path), _) => read_input(path)?,
        (None, Some(git)) => git.staged_diff()?,
        (None, None) => return Err(CommitsmithError::NotGitRepository),
    };
    if args.diff_file.is_none() && diff.trim().is_empty() {
        return Err(CommitsmithError::NothingStaged);
    }

    let branch = args
        .branch
        .clone()
        .or_else(|| git.as_ref().and_then(|g| g.current_branch().ok()));

    let ticket = resolve_ticket(
        args.ticket.as_deref(),
        branch.as_deref(),
        config.generation.require_ticket,
    );
    match &ticket {
        Some(ticket) => tracing::info!(%ticket, "Using ticket"),
        None if config.generation.require_ticket => {
            return Err(CommitsmithError::InvalidInput(
                "No ticket given and none found in the branch name.\n\n  → Pass '--ticket AB-1234', or '--no-ticket' to allow a message without one.".to_string(),
            ))
        }
        None => {}
    }

    let context = CommitContext {
        branch,
        related_issues: args.issues.clone(),
        extra: args.context.iter().cloned().collect(),
    };
    let mut request = CommitRequest::new(diff).with_context(context);
    if let Some(ticket) = ticket {
        request = request.with_ticket(ticket);
    }

    let api_key = CredentialStore::api_key(&config.provider)?;
    let client = build_client(&config.provider, api_key)?;
    let generator = CommitGenerator::new(client);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    eprintln!(
        "Generating commit message with {} ({})...",
        config.generation.model, config.provider.kind
    );
    let message = generator
        .generate(&request, &config.generation, &cancel)
        .await?;
    let rendered = message.to_string();

    println!("{}", rendered);

    if args.commit {
        let git = git.ok_or(CommitsmithError::NotGitRepository)?;
        let commit_hash = git.commit(&rendered)?;
        eprintln!("✓ Created commit: {}", &commit_hash[..8.min(commit_hash.len())]);
    }

    Ok(())
}

/// Ticket for the request: an explicit one always wins; the branch name is
/// only consulted when a ticket is required
fn resolve_ticket(explicit: Option<&str>, branch: Option<&str>, require_ticket: bool) -> Option<String> {
    match explicit {
        Some(ticket) => Some(ticket.to_string()),
        None if require_ticket => branch.and_then(Ticket::from_branch).map(|t| t.to_string()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_ticket_wins() {
        assert_eq!(
            resolve_ticket(Some("CD-9"), Some("feature/AB-1234-foo"), true).as_deref(),
            Some("CD-9")
        );
        assert_eq!(
            resolve_ticket(Some("CD-9"), Some("feature/AB-1234-foo"), false).as_deref(),
            Some("CD-9")
        );
    }

    #[test]
    fn test_branch_ticket_only_when_required() {
        assert_eq!(
            resolve_ticket(None, Some("feature/AB-1234-foo"), true).as_deref(),
            Some("AB-1234")
        );
        assert_eq!(resolve_ticket(None, Some("feature/AB-1234-foo"), false), None);
        assert_eq!(resolve_ticket(None, Some("main"), true), None);
    }
}
