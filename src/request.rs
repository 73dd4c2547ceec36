//! Generation requests
//!
//! A [`CommitRequest`] is built once per invocation by the caller and is
//! only read by the generator.

use std::collections::BTreeMap;

use crate::message::Ticket;

/// Optional data used to enrich the prompt, never validated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitContext {
    /// Branch the changes were made on
    pub branch: Option<String>,
    /// Related issue identifiers
    pub related_issues: Vec<String>,
    /// Free-form key/value pairs, rendered in key order
    pub extra: BTreeMap<String, String>,
}

impl CommitContext {
    pub fn is_empty(&self) -> bool {
        self.branch.is_none() && self.related_issues.is_empty() && self.extra.is_empty()
    }
}

/// Input to commit message generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitRequest {
    /// Text of the staged changes
    pub diff: String,
    /// Ticket the message must reference, e.g. `AB-1234`
    pub ticket: Option<String>,
    pub context: CommitContext,
}

impl CommitRequest {
    pub fn new(diff: impl Into<String>) -> Self {
        Self {
            diff: diff.into(),
            ..Self::default()
        }
    }

    pub fn with_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.ticket = Some(ticket.into());
        self
    }

    pub fn with_context(mut self, context: CommitContext) -> Self {
        self.context = context;
        self
    }

    /// Check the request before any model call.
    ///
    /// Returns every problem found; an empty list means the request is usable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.diff.trim().is_empty() {
            problems.push("diff is empty".to_string());
        }

        if let Some(ticket) = &self.ticket {
            if !Ticket::is_valid(ticket) {
                problems.push(format!(
                    "ticket '{}' does not match the expected format (e.g. AB-1234)",
                    ticket
                ));
            }
        }

        problems
    }
}
