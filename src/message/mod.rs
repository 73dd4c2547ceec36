//! Structured commit messages
//!
//! A commit message has the shape:
//!
//! ```text
//! TYPE[/SEVERITY]: TICKET - summary
//!
//! body line 1
//! body line 2
//! ```
//!
//! This module holds the typed pieces (type, severity, ticket) and the
//! rendering back to text. Parsing lives in [`validator`].

pub mod ticket;
pub mod validator;

use std::fmt;

use serde::Serialize;

pub use ticket::Ticket;
pub use validator::{validate, ValidationResult, ValidationRules, Violation};

/// Recommended upper bound for the summary, used in prompts only
pub const RECOMMENDED_SUMMARY_LENGTH: usize = 50;

/// Kind of change a commit carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommitType {
    Feature,
    Improve,
    Bugfix,
    Refacto,
    Core,
    Test,
    Doc,
}

/// Whether a commit type requires, forbids or tolerates a severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityRule {
    Required,
    Forbidden,
    Optional,
}

impl CommitType {
    /// Token used in the title line
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feature => "FEATURE",
            CommitType::Improve => "IMPROVE",
            CommitType::Bugfix => "BUGFIX",
            CommitType::Refacto => "REFACTO",
            CommitType::Core => "CORE",
            CommitType::Test => "TEST",
            CommitType::Doc => "DOC",
        }
    }

    /// Parse from the title token (exact, uppercase)
    pub fn from_token(token: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.as_str() == token)
    }

    /// Get all commit types
    pub fn all() -> &'static [CommitType] {
        &[
            CommitType::Feature,
            CommitType::Improve,
            CommitType::Bugfix,
            CommitType::Refacto,
            CommitType::Core,
            CommitType::Test,
            CommitType::Doc,
        ]
    }

    /// Severity requirement for this type
    pub fn severity_rule(&self) -> SeverityRule {
        match self {
            CommitType::Feature
            | CommitType::Improve
            | CommitType::Bugfix
            | CommitType::Refacto => SeverityRule::Required,
            CommitType::Doc => SeverityRule::Forbidden,
            CommitType::Core | CommitType::Test => SeverityRule::Optional,
        }
    }

    /// Short description used when explaining the types to the model
    pub fn description(&self) -> &'static str {
        match self {
            CommitType::Feature => "new functionality",
            CommitType::Improve => "enhancement of existing functionality",
            CommitType::Bugfix => "fix of incorrect behaviour",
            CommitType::Refacto => "restructuring without behaviour change",
            CommitType::Core => "build, tooling, dependencies or infrastructure",
            CommitType::Test => "tests only",
            CommitType::Doc => "documentation only",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impact classification of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Major,
    Medium,
    Minor,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Major => "MAJOR",
            Severity::Medium => "MEDIUM",
            Severity::Minor => "MINOR",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.as_str() == token)
    }

    pub fn all() -> &'static [Severity] {
        &[Severity::Major, Severity::Medium, Severity::Minor]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Severity::Major => "breaking or high-impact change",
            Severity::Medium => "mid-sized feature or contained fix",
            Severity::Minor => "cosmetic or low-risk change",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit message that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitMessage {
    pub commit_type: CommitType,
    pub severity: Option<Severity>,
    pub ticket: Option<Ticket>,
    pub summary: String,
    /// Lines after the blank separator, joined with `\n`
    pub body: Option<String>,
}

impl CommitMessage {
    /// Render the title line
    pub fn title(&self) -> String {
        let mut title = self.commit_type.as_str().to_string();
        if let Some(severity) = self.severity {
            title.push('/');
            title.push_str(severity.as_str());
        }
        title.push_str(": ");
        if let Some(ticket) = &self.ticket {
            title.push_str(ticket.as_str());
            title.push(' ');
        }
        title.push_str("- ");
        title.push_str(&self.summary);
        title
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title())?;
        if let Some(body) = &self.body {
            write!(f, "\n\n{}", body)?;
        }
        Ok(())
    }
}
