//! Ticket identifiers (`AB-1234`)

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Two letters, a hyphen, an alphanumeric suffix
static TICKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2}-[A-Za-z0-9]+$").expect("valid ticket regex"));

/// Ticket embedded in a branch name, e.g. `feature/AB-1234-add-foo`
static BRANCH_TICKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{2}-[0-9]+)\b").expect("valid branch ticket regex"));

/// Identifier linking a commit to a tracked work item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Ticket(String);

impl Ticket {
    /// Parse a ticket token, returning `None` when it does not match the grammar
    pub fn parse(token: &str) -> Option<Self> {
        if TICKET_RE.is_match(token) {
            Some(Self(token.to_string()))
        } else {
            None
        }
    }

    /// Check a token against the ticket grammar
    pub fn is_valid(token: &str) -> bool {
        TICKET_RE.is_match(token)
    }

    /// Extract the first ticket found in a branch name
    pub fn from_branch(branch: &str) -> Option<Self> {
        BRANCH_TICKET_RE
            .captures(branch)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
