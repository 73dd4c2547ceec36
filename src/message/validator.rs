//! Format validation of candidate commit messages
//!
//! [`validate`] parses raw model output against the title grammar and the
//! body wrapping rules. It never stops at the first problem: every
//! violation is collected so that a retry prompt can address them together.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::{CommitMessage, CommitType, Severity, SeverityRule, Ticket};
use crate::core::config::GenerationConfig;
use crate::request::CommitRequest;

/// `TYPE[/SEVERITY]: [TICKET ]- summary`
static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<type>[^\s/:]+)(?:/(?P<severity>[^\s/:]*))?: (?:(?P<ticket>\S+) )?-(?: (?P<summary>.*))?$",
    )
    .expect("valid title regex")
});

/// Prefixes that mark a line as a path, diff or shell fragment
const CODE_MARKERS: &[&str] = &[
    "```",
    "diff --git",
    "+++ ",
    "--- ",
    "@@",
    "$ ",
    "./",
    "../",
    "~/",
    "/",
];

/// A single rule the message breaks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("commit message is empty")]
    Empty,

    #[error("title '{0}' does not match 'TYPE[/SEVERITY]: TICKET - summary'")]
    MalformedTitle(String),

    #[error("unknown commit type '{0}'")]
    UnknownType(String),

    #[error("unknown severity '{0}'")]
    UnknownSeverity(String),

    #[error("missing severity for type {0}")]
    MissingSeverity(CommitType),

    #[error("severity not allowed for type {0}")]
    ForbiddenSeverity(CommitType),

    #[error("ticket format invalid: '{0}'")]
    InvalidTicket(String),

    #[error("missing ticket")]
    MissingTicket,

    #[error("ticket '{found}' does not match requested ticket '{expected}'")]
    TicketMismatch { expected: String, found: String },

    #[error("summary is empty")]
    EmptySummary,

    #[error("title exceeds {max} characters ({length})")]
    TitleTooLong { length: usize, max: usize },

    #[error("missing blank line between title and body")]
    MissingBlankLine,

    #[error("more than one blank line between title and body")]
    ExtraBlankLines,

    #[error("line {line} exceeds wrap width ({length} > {width})")]
    LineTooLong {
        line: usize,
        length: usize,
        width: usize,
    },
}

/// Outcome of checking a raw string against the grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(CommitMessage),
    Invalid(Vec<Violation>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    /// Violations found, empty when valid
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationResult::Valid(_) => &[],
            ValidationResult::Invalid(violations) => violations,
        }
    }
}

/// Rules a message is checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    pub max_line_width: usize,
    pub max_title_length: usize,
    pub ticket_required: bool,
    /// Ticket the caller asked for; a different one is a violation
    pub expected_ticket: Option<Ticket>,
}

impl ValidationRules {
    /// Rules derived from configuration alone
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_line_width: config.max_line_width,
            max_title_length: config.max_title_length,
            ticket_required: config.require_ticket,
            expected_ticket: None,
        }
    }

    /// Rules for one request: a ticket supplied by the caller is required
    pub fn for_request(config: &GenerationConfig, request: &CommitRequest) -> Self {
        let expected_ticket = request.ticket.as_deref().and_then(Ticket::parse);
        Self {
            ticket_required: config.require_ticket || expected_ticket.is_some(),
            expected_ticket,
            ..Self::from_config(config)
        }
    }
}

struct Title {
    commit_type: Option<CommitType>,
    severity: Option<Severity>,
    ticket: Option<Ticket>,
    summary: String,
}

/// Validate a raw model response
pub fn validate(raw: &str, rules: &ValidationRules) -> ValidationResult {
    let text = normalize_response(raw);
    if text.is_empty() {
        return ValidationResult::Invalid(vec![Violation::Empty]);
    }

    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let mut violations = Vec::new();

    let title = parse_title(lines[0], rules, &mut violations);
    let body = check_body(&lines, rules, &mut violations);

    match title {
        Some(Title {
            commit_type: Some(commit_type),
            severity,
            ticket,
            summary,
        }) if violations.is_empty() => ValidationResult::Valid(CommitMessage {
            commit_type,
            severity,
            ticket,
            summary,
            body,
        }),
        _ => ValidationResult::Invalid(violations),
    }
}

/// Trim the response and strip one surrounding Markdown code fence
pub fn normalize_response(raw: &str) -> String {
    let trimmed = raw.trim();
    let lines: Vec<&str> = trimmed.lines().collect();

    if lines.len() >= 2
        && lines[0].trim_start().starts_with("```")
        && lines[lines.len() - 1].trim() == "```"
    {
        return lines[1..lines.len() - 1].join("\n").trim().to_string();
    }

    trimmed.to_string()
}

fn parse_title(line: &str, rules: &ValidationRules, violations: &mut Vec<Violation>) -> Option<Title> {
    let length = line.chars().count();
    if length > rules.max_title_length {
        violations.push(Violation::TitleTooLong {
            length,
            max: rules.max_title_length,
        });
    }

    let Some(caps) = TITLE_RE.captures(line) else {
        violations.push(Violation::MalformedTitle(line.to_string()));
        return None;
    };

    let type_token = &caps["type"];
    let commit_type = CommitType::from_token(type_token);
    if commit_type.is_none() {
        violations.push(Violation::UnknownType(type_token.to_string()));
    }

    let severity_token = caps.name("severity").map(|m| m.as_str());
    let severity = match severity_token {
        Some(token) => {
            let parsed = Severity::from_token(token);
            if parsed.is_none() {
                violations.push(Violation::UnknownSeverity(token.to_string()));
            }
            parsed
        }
        None => None,
    };

    if let Some(commit_type) = commit_type {
        match (commit_type.severity_rule(), severity_token) {
            (SeverityRule::Required, None) => {
                violations.push(Violation::MissingSeverity(commit_type))
            }
            (SeverityRule::Forbidden, Some(_)) => {
                violations.push(Violation::ForbiddenSeverity(commit_type))
            }
            _ => {}
        }
    }

    let ticket = match caps.name("ticket").map(|m| m.as_str()) {
        Some(token) => match Ticket::parse(token) {
            Some(ticket) => {
                if let Some(expected) = &rules.expected_ticket {
                    if expected != &ticket {
                        violations.push(Violation::TicketMismatch {
                            expected: expected.to_string(),
                            found: ticket.to_string(),
                        });
                    }
                }
                Some(ticket)
            }
            None => {
                violations.push(Violation::InvalidTicket(token.to_string()));
                None
            }
        },
        None => {
            if rules.ticket_required {
                violations.push(Violation::MissingTicket);
            }
            None
        }
    };

    let summary = caps
        .name("summary")
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    if summary.is_empty() {
        violations.push(Violation::EmptySummary);
    }

    Some(Title {
        commit_type,
        severity,
        ticket,
        summary,
    })
}

fn check_body(lines: &[&str], rules: &ValidationRules, violations: &mut Vec<Violation>) -> Option<String> {
    if lines.len() < 2 {
        return None;
    }

    let blank_count = lines[1..].iter().take_while(|l| l.is_empty()).count();
    match blank_count {
        0 => violations.push(Violation::MissingBlankLine),
        1 => {}
        _ => violations.push(Violation::ExtraBlankLines),
    }

    let start = 1 + blank_count;
    let mut in_fence = false;

    for (index, line) in lines.iter().enumerate().skip(start) {
        let is_fence = line.trim_start().starts_with("```");
        if is_fence {
            in_fence = !in_fence;
        }
        if is_fence || in_fence || is_code_like(line) {
            continue;
        }

        let length = line.chars().count();
        if length > rules.max_line_width {
            violations.push(Violation::LineTooLong {
                line: index + 1,
                length,
                width: rules.max_line_width,
            });
        }
    }

    Some(lines[start..].join("\n"))
}

/// Whether a body line is a path, diff or code fragment exempt from wrapping
pub fn is_code_like(line: &str) -> bool {
    if line.starts_with("    ") || line.starts_with('\t') {
        return true;
    }

    let trimmed = line.trim();
    if CODE_MARKERS.iter().any(|marker| trimmed.starts_with(marker)) {
        return true;
    }

    let token = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .unwrap_or(trimmed);

    if token.len() > 1 && token.starts_with('`') && token.ends_with('`') {
        return true;
    }

    let token = token.trim_matches('`');
    !token.is_empty()
        && !token.contains(char::is_whitespace)
        && (token.contains('/') || token.contains('\\') || token.contains("::"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ValidationRules {
        ValidationRules {
            max_line_width: 70,
            max_title_length: 72,
            ticket_required: true,
            expected_ticket: None,
        }
    }

    fn optional_ticket_rules() -> ValidationRules {
        ValidationRules {
            ticket_required: false,
            ..rules()
        }
    }

    #[test]
    fn test_valid_message_with_body() {
        let result = validate("FEATURE/MEDIUM: AB-1234 - add foo\n\nAdds foo.", &rules());
        let ValidationResult::Valid(message) = result else {
            panic!("expected valid message, got {:?}", result);
        };
        assert_eq!(message.commit_type, CommitType::Feature);
        assert_eq!(message.severity, Some(Severity::Medium));
        assert_eq!(message.ticket, Ticket::parse("AB-1234"));
        assert_eq!(message.summary, "add foo");
        assert_eq!(message.body.as_deref(), Some("Adds foo."));
    }

    #[test]
    fn test_missing_severity_for_mandatory_type() {
        for token in ["FEATURE", "IMPROVE", "BUGFIX", "REFACTO"] {
            let raw = format!("{}: AB-1234 - add foo", token);
            let result = validate(&raw, &rules());
            assert_eq!(result.violations().len(), 1, "{}", raw);
            assert_eq!(
                result.violations()[0].to_string(),
                format!("missing severity for type {}", token)
            );
        }
    }

    #[test]
    fn test_severity_forbidden_for_doc() {
        let result = validate("DOC/MINOR: AB-1 - fix typo", &rules());
        assert_eq!(
            result.violations(),
            &[Violation::ForbiddenSeverity(CommitType::Doc)]
        );
    }

    #[test]
    fn test_severity_optional_for_core_and_test() {
        assert!(validate("CORE: AB-1 - bump deps", &rules()).is_valid());
        assert!(validate("CORE/MINOR: AB-1 - bump deps", &rules()).is_valid());
        assert!(validate("TEST: AB-1 - cover parser", &rules()).is_valid());
    }

    #[test]
    fn test_unknown_type_and_severity() {
        let result = validate("feature/HUGE: AB-1 - add foo", &rules());
        assert_eq!(
            result.violations(),
            &[
                Violation::UnknownType("feature".to_string()),
                Violation::UnknownSeverity("HUGE".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_ticket() {
        let result = validate("BUGFIX/MAJOR: ABC-12 - fix crash", &rules());
        assert_eq!(
            result.violations(),
            &[Violation::InvalidTicket("ABC-12".to_string())]
        );
    }

    #[test]
    fn test_missing_ticket_depends_on_policy() {
        let raw = "DOC: - update readme";
        assert_eq!(validate(raw, &rules()).violations(), &[Violation::MissingTicket]);
        assert!(validate(raw, &optional_ticket_rules()).is_valid());
    }

    #[test]
    fn test_ticket_mismatch() {
        let rules = ValidationRules {
            expected_ticket: Ticket::parse("AB-1"),
            ..rules()
        };
        let result = validate("TEST: CD-2 - cover parser", &rules);
        assert_eq!(
            result.violations(),
            &[Violation::TicketMismatch {
                expected: "AB-1".to_string(),
                found: "CD-2".to_string(),
            }]
        );
    }

    #[test]
    fn test_malformed_title() {
        let result = validate("Add foo to the bar", &rules());
        assert!(matches!(
            result.violations(),
            [Violation::MalformedTitle(_)]
        ));

        let result = validate("FEATURE/MEDIUM: AB-1 add foo", &rules());
        assert!(matches!(
            result.violations(),
            [Violation::MalformedTitle(_)]
        ));
    }

    #[test]
    fn test_title_spacing_is_exact() {
        for raw in [
            "FEATURE/MEDIUM:AB-1 - add foo",
            "FEATURE/MEDIUM:  AB-1 - add foo",
            "FEATURE/MEDIUM: AB-1   - add foo",
            "FEATURE/MEDIUM: AB-1 -add foo",
            "DOC:- update readme",
        ] {
            assert!(
                matches!(validate(raw, &rules()).violations(), [Violation::MalformedTitle(_)]),
                "{raw}"
            );
        }
        assert!(validate("FEATURE/MEDIUM: AB-1 - add foo", &rules()).is_valid());
    }

    #[test]
    fn test_empty_summary() {
        let result = validate("TEST: AB-1 -", &rules());
        assert_eq!(result.violations(), &[Violation::EmptySummary]);
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(validate("  \n ", &rules()).violations(), &[Violation::Empty]);
    }

    #[test]
    fn test_title_too_long() {
        let raw = format!("TEST: AB-1 - {}", "x".repeat(70));
        let result = validate(&raw, &rules());
        assert_eq!(
            result.violations(),
            &[Violation::TitleTooLong { length: 83, max: 72 }]
        );
    }

    #[test]
    fn test_blank_line_rules() {
        let missing = validate("TEST: AB-1 - cover parser\nBody text.", &rules());
        assert_eq!(missing.violations(), &[Violation::MissingBlankLine]);

        let extra = validate("TEST: AB-1 - cover parser\n\n\nBody text.", &rules());
        assert_eq!(extra.violations(), &[Violation::ExtraBlankLines]);
    }

    #[test]
    fn test_wrap_width_enforced_on_prose() {
        let long_line = "word ".repeat(16).trim_end().to_string();
        assert_eq!(long_line.len(), 79);
        let raw = format!("TEST: AB-1 - cover parser\n\nShort line.\n{}", long_line);
        let result = validate(&raw, &rules());
        assert_eq!(
            result.violations(),
            &[Violation::LineTooLong {
                line: 4,
                length: 79,
                width: 70
            }]
        );
        assert_eq!(
            result.violations()[0].to_string(),
            "line 4 exceeds wrap width (79 > 70)"
        );
    }

    #[test]
    fn test_code_like_lines_are_exempt() {
        let path = format!("- src/{}/mod.rs", "deeply/nested".repeat(10));
        let fenced = format!("```\nlet value = {};\n```", "1 + ".repeat(30));
        let raw = format!(
            "REFACTO/MINOR: AB-1 - split module\n\nMoved:\n{}\n{}\n    {}",
            path,
            fenced,
            "indented ".repeat(12)
        );
        assert!(validate(&raw, &rules()).is_valid());
    }

    #[test]
    fn test_all_violations_are_collected() {
        let raw = format!(
            "FEATURE: ABC - add foo\nno blank line and {}",
            "long ".repeat(20)
        );
        let violations = validate(&raw, &rules()).violations().to_vec();
        assert_eq!(violations.len(), 4);
        assert!(violations.contains(&Violation::MissingSeverity(CommitType::Feature)));
        assert!(violations.contains(&Violation::InvalidTicket("ABC".to_string())));
        assert!(violations.contains(&Violation::MissingBlankLine));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::LineTooLong { line: 2, .. })));
    }

    #[test]
    fn test_is_code_like() {
        assert!(is_code_like("src/message/validator.rs"));
        assert!(is_code_like("- crate::message::validator"));
        assert!(is_code_like("diff --git a/x b/x"));
        assert!(is_code_like("@@ -1,3 +1,4 @@"));
        assert!(is_code_like("`cargo test --all-features`"));
        assert!(is_code_like("    indented code"));
        assert!(!is_code_like("- Explain why the parser now collects every violation"));
        assert!(!is_code_like("plain prose"));
    }

    #[test]
    fn test_normalize_strips_fence() {
        let raw = "```text\nDOC: AB-1 - update readme\n```\n";
        assert_eq!(normalize_response(raw), "DOC: AB-1 - update readme");
        assert!(validate(raw, &rules()).is_valid());
    }

    #[test]
    fn test_render_then_validate_round_trip() {
        let ticket = Ticket::parse("AB-1234");
        for &commit_type in CommitType::all() {
            let severities: Vec<Option<Severity>> = match commit_type.severity_rule() {
                SeverityRule::Required => Severity::all().iter().copied().map(Some).collect(),
                SeverityRule::Forbidden => vec![None],
                SeverityRule::Optional => std::iter::once(None)
                    .chain(Severity::all().iter().copied().map(Some))
                    .collect(),
            };
            for severity in severities {
                let message = CommitMessage {
                    commit_type,
                    severity,
                    ticket: ticket.clone(),
                    summary: "describe the change".to_string(),
                    body: Some("First line.\n\n- second paragraph".to_string()),
                };
                let result = validate(&message.to_string(), &rules());
                assert_eq!(result, ValidationResult::Valid(message));
            }
        }
    }
}
