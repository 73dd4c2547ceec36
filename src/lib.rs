//! commitsmith - structured commit message generation
//!
//! This library turns a diff (plus an optional ticket and context) into a
//! commit message of the form `TYPE[/SEVERITY]: TICKET - summary`, using a
//! language model and a validate-and-retry loop. The same format checks are
//! available on their own through [`message::validate`].

pub mod ai;
pub mod cli;
pub mod core;
pub mod error;
pub mod generator;
pub mod message;
pub mod request;

pub use error::{CommitsmithError, Result};
pub use generator::{CommitGenerator, FailureReason, GenerationError};
pub use message::{CommitMessage, CommitType, Severity, Ticket};
pub use request::{CommitContext, CommitRequest};
