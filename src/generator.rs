//! Generation orchestrator
//!
//! Drives the attempt loop: build a prompt, call the model, validate the
//! answer, and either return the message or retry with the violations fed
//! back into the next prompt. Attempts run strictly one after another; the
//! model call is the only suspension point and the only place where
//! cancellation and the per-call timeout apply.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::ai::client::{ModelClient, ModelFailure, ModelParams};
use crate::ai::prompts::{build_prompt, truncate_diff_middle};
use crate::core::config::GenerationConfig;
use crate::message::{validate, CommitMessage, ValidationResult, ValidationRules, Violation};
use crate::request::CommitRequest;

/// Longest pause honoured for a provider `Retry-After` hint
pub const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(30);

/// Cause attached to a failed generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The last attempt ended in an adapter failure
    Model(ModelFailure),
    /// The last attempt produced a message breaking these rules
    Format(Vec<Violation>),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Model(failure) => write!(f, "{}", failure),
            FailureReason::Format(violations) => {
                write!(f, "{} unresolved format violation(s)", violations.len())
            }
        }
    }
}

/// Failure of a whole generation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The request was rejected before any model call
    #[error("Invalid request: {}", .0.join("; "))]
    InvalidRequest(Vec<String>),

    #[error("Commit message generation failed after {attempts} attempt(s): {reason}")]
    Failed { attempts: u32, reason: FailureReason },

    #[error("Generation cancelled during attempt {attempt}")]
    Cancelled { attempt: u32 },
}

impl GenerationError {
    /// Violations left unresolved by the last attempt, if any
    pub fn violations(&self) -> &[Violation] {
        match self {
            GenerationError::Failed {
                reason: FailureReason::Format(violations),
                ..
            } => violations,
            _ => &[],
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, GenerationError::Cancelled { .. })
    }
}

enum State {
    Attempting {
        attempt: u32,
        prior_violations: Option<Vec<Violation>>,
    },
    Succeeded(CommitMessage),
    Failed {
        attempts: u32,
        reason: FailureReason,
    },
    Cancelled {
        attempt: u32,
    },
}

/// Commit message generator bound to one model client
pub struct CommitGenerator {
    client: Arc<dyn ModelClient>,
    max_rate_limit_wait: Duration,
}

impl CommitGenerator {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            max_rate_limit_wait: MAX_RATE_LIMIT_WAIT,
        }
    }

    /// Cap the pause taken after a rate-limited call
    #[must_use]
    pub fn with_max_rate_limit_wait(mut self, max_rate_limit_wait: Duration) -> Self {
        self.max_rate_limit_wait = max_rate_limit_wait;
        self
    }

    /// Generate a validated commit message for `request`.
    ///
    /// Cancelling `cancel` aborts the in-flight call and ends generation with
    /// [`GenerationError::Cancelled`]; no further attempt is made.
    pub async fn generate(
        &self,
        request: &CommitRequest,
        config: &GenerationConfig,
        cancel: &CancellationToken,
    ) -> Result<CommitMessage, GenerationError> {
        let mut problems = request.problems();
        if config.require_ticket && request.ticket.is_none() {
            problems.push("a ticket is required but none was given".to_string());
        }
        if !problems.is_empty() {
            return Err(GenerationError::InvalidRequest(problems));
        }

        let rules = ValidationRules::for_request(config, request);
        let params = ModelParams::from_config(config);
        let max_attempts = config.max_attempts.max(1);

        let mut state = State::Attempting {
            attempt: 1,
            prior_violations: None,
        };

        loop {
            state = match state {
                State::Attempting {
                    attempt,
                    prior_violations,
                } => {
                    let prompt = build_prompt(request, config, prior_violations.as_deref());
                    tracing::debug!(attempt, max_attempts, model = %params.model, "Calling model");
                    tracing::trace!(user_prompt = %truncate_diff_middle(&prompt.user, 2_000), "Prompt");

                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        result = tokio::time::timeout(
                            config.request_timeout,
                            self.client.complete(&prompt, &params),
                        ) => Some(result.unwrap_or(Err(ModelFailure::Timeout))),
                    };

                    match outcome {
                        None => State::Cancelled { attempt },
                        Some(Ok(raw)) => self.on_response(&raw, &rules, attempt, max_attempts),
                        Some(Err(failure)) => {
                            self.on_failure(failure, attempt, max_attempts, prior_violations, cancel)
                                .await
                        }
                    }
                }
                State::Succeeded(message) => return Ok(message),
                State::Failed { attempts, reason } => {
                    return Err(GenerationError::Failed { attempts, reason })
                }
                State::Cancelled { attempt } => {
                    tracing::info!(attempt, "Generation cancelled");
                    return Err(GenerationError::Cancelled { attempt });
                }
            };
        }
    }

    fn on_response(
        &self,
        raw: &str,
        rules: &ValidationRules,
        attempt: u32,
        max_attempts: u32,
    ) -> State {
        match validate(raw, rules) {
            ValidationResult::Valid(message) => {
                tracing::info!(attempt, max_attempts, outcome = "success", "Commit message accepted");
                State::Succeeded(message)
            }
            ValidationResult::Invalid(violations) => {
                let summary = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::warn!(attempt, max_attempts, outcome = "violations", violations = %summary, "Commit message rejected");

                if attempt < max_attempts {
                    State::Attempting {
                        attempt: attempt + 1,
                        prior_violations: Some(violations),
                    }
                } else {
                    State::Failed {
                        attempts: attempt,
                        reason: FailureReason::Format(violations),
                    }
                }
            }
        }
    }

    async fn on_failure(
        &self,
        failure: ModelFailure,
        attempt: u32,
        max_attempts: u32,
        prior_violations: Option<Vec<Violation>>,
        cancel: &CancellationToken,
    ) -> State {
        tracing::warn!(attempt, max_attempts, outcome = "adapter failure", error = %failure, "Model call failed");

        if !failure.is_retryable() || attempt >= max_attempts {
            return State::Failed {
                attempts: attempt,
                reason: FailureReason::Model(failure),
            };
        }

        if let ModelFailure::RateLimited {
            retry_after: Some(wait),
        } = &failure
        {
            let wait = (*wait).min(self.max_rate_limit_wait);
            tracing::info!(wait_ms = wait.as_millis() as u64, "Waiting before retry");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return State::Cancelled { attempt },
                _ = tokio::time::sleep(wait) => {}
            }
        }

        State::Attempting {
            attempt: attempt + 1,
            prior_violations,
        }
    }
}
