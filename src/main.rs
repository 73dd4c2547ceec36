//! commitsmith - structured commit message generator
//!
//! Generates commit messages in the `TYPE/SEVERITY: TICKET - summary`
//! format from staged changes and validates existing messages.
//!
//! Available as the `commitsmith` and `csm` commands.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commitsmith::cli::commands::{Cli, Commands};
use commitsmith::cli::{config, generate, validate};
use commitsmith::error::{CommitsmithError, Result};

/// Exit status after an interrupt, as shells report SIGINT
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        std::process::exit(handle_error(&e));
    }
}

/// Report an error and pick the exit status
fn handle_error(e: &CommitsmithError) -> i32 {
    eprintln!("Error: {}", e);

    let violations = e.violations();
    if !violations.is_empty() {
        eprintln!();
        eprintln!("Unresolved problems:");
        for violation in violations {
            eprintln!("  - {}", violation);
        }
    }

    match e {
        CommitsmithError::Generation(err) if err.is_cancelled() => EXIT_CANCELLED,
        _ => 1,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_file = cli.config_file.as_deref();

    match cli.command {
        Commands::Generate(args) => generate::handle_generate(args, config_file).await,
        Commands::Validate(args) => validate::handle_validate(args, config_file),
        Commands::Config(args) => config::handle_config(args.command, config_file),
    }
}
