//! Prompt templates for commit message generation
//!
//! [`build_prompt`] is a pure function of its inputs: the same request,
//! configuration and prior violations always produce the same prompt.

use std::borrow::Cow;
use std::fmt::Write;

use crate::core::config::GenerationConfig;
use crate::message::{CommitType, Severity, SeverityRule, Violation, RECOMMENDED_SUMMARY_LENGTH};
use crate::request::CommitRequest;

/// Default role text, replaced by `system_prompt` when configured
const DEFAULT_PREAMBLE: &str = "You are a Git commit message generator. \
Analyze the code changes you are given and write a single commit message \
that follows the format rules below exactly.";

/// Prompt split into a system instruction and a user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt for one attempt.
///
/// `prior_violations` carries the problems found in the previous attempt's
/// output; when present a corrective section is appended to the user message.
pub fn build_prompt(
    request: &CommitRequest,
    config: &GenerationConfig,
    prior_violations: Option<&[Violation]>,
) -> Prompt {
    Prompt {
        system: system_prompt(config, request.ticket.is_some()),
        user: user_prompt(request, config, prior_violations),
    }
}

fn system_prompt(config: &GenerationConfig, has_ticket: bool) -> String {
    let mut out = String::new();

    out.push_str(
        config
            .system_prompt
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_PREAMBLE),
    );
    out.push_str("\n\n");

    out.push_str("Output rules:\n");
    out.push_str("- Output only the commit message: no preamble, no labels, no Markdown fences.\n");
    out.push_str("- Use exactly this layout:\n\n");
    out.push_str("TYPE/SEVERITY: TICKET - summary\n\nbody line 1\nbody line 2\n\n");

    out.push_str("Commit types:\n");
    for commit_type in CommitType::all() {
        let rule = match commit_type.severity_rule() {
            SeverityRule::Required => "severity required",
            SeverityRule::Optional => "severity optional",
            SeverityRule::Forbidden => "no severity, write 'DOC: ...'",
        };
        let _ = writeln!(
            out,
            "- {} ({}): {}",
            commit_type.as_str(),
            rule,
            commit_type.description()
        );
    }
    out.push('\n');

    out.push_str("Severities:\n");
    for severity in Severity::all() {
        let _ = writeln!(out, "- {}: {}", severity.as_str(), severity.description());
    }
    out.push('\n');

    out.push_str("Ticket:\n");
    if has_ticket {
        out.push_str("- The title must contain the ticket given with the changes, exactly as written (e.g. AB-1234).\n\n");
    } else {
        out.push_str("- No ticket is given. Do not invent one; write 'TYPE/SEVERITY: - summary'.\n\n");
    }

    out.push_str("Line limits:\n");
    let _ = writeln!(
        out,
        "- The title line must not exceed {} characters; keep the summary under {} characters.",
        config.max_title_length, RECOMMENDED_SUMMARY_LENGTH
    );
    out.push_str("- Separate the title from the body with exactly one blank line.\n");
    let _ = writeln!(
        out,
        "- Wrap every body line at {} characters. Only file paths and code snippets may be longer.",
        config.max_line_width
    );
    out.push_str("- The body explains what changed and why.");

    out
}

fn user_prompt(
    request: &CommitRequest,
    config: &GenerationConfig,
    prior_violations: Option<&[Violation]>,
) -> String {
    let mut out = String::new();

    out.push_str("Generate a commit message for these changes:\n\n");
    out.push_str("```diff\n");
    out.push_str(truncate_diff_middle(&request.diff, config.max_diff_chars).trim_end());
    out.push_str("\n```\n\n");

    match &request.ticket {
        Some(ticket) => {
            let _ = writeln!(out, "Ticket: {} (use exactly this ticket)", ticket);
        }
        None => {
            out.push_str("Ticket: none. Write the title without a ticket.\n");
        }
    }

    let context = &request.context;
    if !context.is_empty() {
        out.push_str("\nAdditional context:\n");
        if let Some(branch) = &context.branch {
            let _ = writeln!(out, "- Branch: {}", branch);
        }
        if !context.related_issues.is_empty() {
            let _ = writeln!(out, "- Related issues: {}", context.related_issues.join(", "));
        }
        for (key, value) in &context.extra {
            let _ = writeln!(out, "- {}: {}", key, value);
        }
    }

    if let Some(violations) = prior_violations.filter(|v| !v.is_empty()) {
        out.push_str("\nYour previous answer was rejected for these reasons:\n");
        for violation in violations {
            let _ = writeln!(out, "- {}", violation);
        }
        out.push_str("Fix only these problems and keep everything else the same.\n");
    }

    out.trim_end().to_string()
}

/// Elide the middle of a diff longer than `max_chars` characters.
///
/// Keeps the first and last halves of the budget and puts a marker naming
/// the number of removed characters between them.
pub fn truncate_diff_middle(diff: &str, max_chars: usize) -> Cow<'_, str> {
    let total = diff.chars().count();
    if total <= max_chars {
        return Cow::Borrowed(diff);
    }

    let head = max_chars / 2;
    let tail = max_chars - head;
    let elided = total - head - tail;

    let head_end = byte_offset(diff, head);
    let tail_start = byte_offset(diff, total - tail);

    Cow::Owned(format!(
        "{}\n[... {} characters elided from the middle of the diff ...]\n{}",
        &diff[..head_end],
        elided,
        &diff[tail_start..]
    ))
}

fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::CommitContext;

    fn request() -> CommitRequest {
        CommitRequest::new("diff --git a/foo.rs b/foo.rs\n+fn foo() {}\n").with_ticket("AB-1234")
    }

    #[test]
    fn test_system_prompt_lists_grammar() {
        let prompt = build_prompt(&request(), &GenerationConfig::default(), None);
        for commit_type in CommitType::all() {
            assert!(prompt.system.contains(commit_type.as_str()));
        }
        for severity in Severity::all() {
            assert!(prompt.system.contains(severity.as_str()));
        }
        assert!(prompt.system.contains("DOC (no severity"));
        assert!(prompt.system.contains("Wrap every body line at 70 characters"));
        assert!(prompt.system.starts_with(DEFAULT_PREAMBLE));
    }

    #[test]
    fn test_wrap_width_follows_config() {
        let config = GenerationConfig::default().with_max_line_width(100);
        let prompt = build_prompt(&request(), &config, None);
        assert!(prompt.system.contains("at 100 characters"));
    }

    #[test]
    fn test_custom_system_prompt_replaces_preamble_only() {
        let config = GenerationConfig {
            system_prompt: Some("You write commits for the payments team.".to_string()),
            ..GenerationConfig::default()
        };
        let prompt = build_prompt(&request(), &config, None);
        assert!(prompt.system.starts_with("You write commits for the payments team."));
        assert!(!prompt.system.contains(DEFAULT_PREAMBLE));
        assert!(prompt.system.contains("FEATURE (severity required)"));
    }

    #[test]
    fn test_user_prompt_embeds_diff_ticket_and_context() {
        let mut context = CommitContext {
            branch: Some("feature/AB-1234-foo".to_string()),
            related_issues: vec!["#12".to_string(), "#15".to_string()],
            ..CommitContext::default()
        };
        context.extra.insert("component".to_string(), "parser".to_string());

        let prompt = build_prompt(
            &request().with_context(context),
            &GenerationConfig::default(),
            None,
        );
        assert!(prompt.user.contains("```diff\ndiff --git a/foo.rs b/foo.rs\n+fn foo() {}\n```"));
        assert!(prompt.user.contains("Ticket: AB-1234"));
        assert!(prompt.user.contains("- Branch: feature/AB-1234-foo"));
        assert!(prompt.user.contains("- Related issues: #12, #15"));
        assert!(prompt.user.contains("- component: parser"));
        assert!(!prompt.user.contains("rejected"));
    }

    #[test]
    fn test_optional_ticket_instructions() {
        let config = GenerationConfig::default().with_require_ticket(false);
        let prompt = build_prompt(&CommitRequest::new("+x"), &config, None);
        assert!(prompt.user.contains("Write the title without a ticket"));
        assert!(prompt.system.contains("'TYPE/SEVERITY: - summary'"));
    }

    #[test]
    fn test_ticketless_request_never_asks_for_a_ticket() {
        let prompt = build_prompt(&CommitRequest::new("+x"), &GenerationConfig::default(), None);
        assert!(prompt.user.contains("Ticket: none. Write the title without a ticket."));
        assert!(prompt.system.contains("Do not invent one"));
        assert!(!prompt.user.contains("context below"));
    }

    #[test]
    fn test_retry_section_lists_violations() {
        let violations = vec![Violation::MissingSeverity(CommitType::Feature)];
        let prompt = build_prompt(&request(), &GenerationConfig::default(), Some(&violations));
        assert!(prompt.user.contains("- missing severity for type FEATURE"));
        assert!(prompt.user.contains("Fix only these problems"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let config = GenerationConfig::default();
        let violations = vec![Violation::EmptySummary];
        assert_eq!(
            build_prompt(&request(), &config, Some(&violations)),
            build_prompt(&request(), &config, Some(&violations))
        );
    }

    #[test]
    fn test_truncate_short_diff_untouched() {
        assert!(matches!(truncate_diff_middle("abc", 10), Cow::Borrowed("abc")));
    }

    #[test]
    fn test_truncate_elides_middle() {
        let diff = format!("{}{}{}", "a".repeat(10), "m".repeat(80), "z".repeat(10));
        let truncated = truncate_diff_middle(&diff, 20);
        assert!(truncated.starts_with(&"a".repeat(10)));
        assert!(truncated.ends_with(&"z".repeat(10)));
        assert!(truncated.contains("[... 80 characters elided from the middle of the diff ...]"));
        assert!(!truncated.contains("mm"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let diff = "é".repeat(30);
        let truncated = truncate_diff_middle(&diff, 11);
        assert!(truncated.starts_with("ééééé\n"));
        assert!(truncated.ends_with("\néééééé"));
        assert!(truncated.contains("19 characters elided"));
    }

    #[test]
    fn test_large_diff_is_truncated_in_prompt() {
        let config = GenerationConfig::default().with_max_diff_chars(100);
        let request = CommitRequest::new("+".repeat(500));
        let prompt = build_prompt(&request, &config, None);
        assert!(prompt.user.contains("400 characters elided"));
    }
}
