//! Turning AI responses into branch-name and commit-message candidates.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::parse::{parse_numbered_output, ParseOptions, ParseResult};

/// Maximum number of numbered branch names considered in a response.
pub const MAX_BRANCH_CANDIDATES: usize = 3;

// ---------------------------------------------------------------------------
// Sanitizer
// ---------------------------------------------------------------------------

/// Remove markdown emphasis characters (`*`, `` ` ``, `_`, `~`) and trim.
///
/// An empty return value means there is no usable name.
pub fn sanitize_branch_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '*' | '`' | '_' | '~'))
        .collect::<String>()
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Branch names
// ---------------------------------------------------------------------------

fn numbered_branch_regexes() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        (1..=MAX_BRANCH_CANDIDATES)
            .map(|i| Regex::new(&format!(r"(?i)BRANCH_NAME_{i}:\s*(.+)")).unwrap())
            .collect()
    })
}

fn legacy_branch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)BRANCH_NAME:\s*(.+)").unwrap())
}

/// Extract up to three branch names from an AI response.
///
/// `BRANCH_NAME_1:` .. `BRANCH_NAME_3:` are looked up by index. Only when
/// none of them yields a name is the single-value `BRANCH_NAME:` form tried.
pub fn extract_branch_names(raw: &str) -> ParseResult<String> {
    let numbered: Vec<String> = numbered_branch_regexes()
        .iter()
        .filter_map(|re| re.captures(raw))
        .filter_map(|caps| caps.get(1).map(|m| sanitize_branch_name(m.as_str())))
        .filter(|name| !name.is_empty())
        .collect();

    if !numbered.is_empty() {
        return ParseResult::from_values(numbered, "Could not extract branch name from AI output");
    }

    let Some(caps) = legacy_branch_regex().captures(raw) else {
        return ParseResult::failure("Could not extract branch name from AI output");
    };

    let name = caps
        .get(1)
        .map(|m| sanitize_branch_name(m.as_str()))
        .unwrap_or_default();
    if name.is_empty() {
        return ParseResult::failure("Extracted branch name is empty after sanitization");
    }
    ParseResult::from_values(vec![name], "Could not extract branch name from AI output")
}

/// Put a ticket key into a branch name unless it is already there.
///
/// `feat/login` + `PROJ-12` → `feat/PROJ-12-login`; `login` → `PROJ-12-login`.
pub fn apply_ticket_to_branch(name: &str, ticket_key: &str) -> String {
    if name.to_lowercase().contains(&ticket_key.to_lowercase()) {
        return name.to_string();
    }
    match name.split_once('/') {
        Some((kind, rest)) => format!("{kind}/{ticket_key}-{rest}"),
        None => format!("{ticket_key}-{name}"),
    }
}

// ---------------------------------------------------------------------------
// Commit messages
// ---------------------------------------------------------------------------

/// Ticket information available when formatting commit messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketContext {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn conventional_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z]+)(?:\([^)]*\))?!?:\s*(.*)$").unwrap())
}

/// Rewrite a commit message as `{type}: [{TICKET}] {description}`.
///
/// `type` comes from a leading `type:` or `type(scope):` (default `chore`).
/// The description is the ticket title when given, else the message's own
/// description, else the ticket key.
pub fn format_commit_with_ticket(message: &str, ticket_key: &str, ticket_title: Option<&str>) -> String {
    let message = message.trim();
    if message.contains(&format!("[{ticket_key}]")) {
        return message.to_string();
    }

    let (kind, own_description) = match conventional_regex().captures(message) {
        Some(caps) => (
            caps.get(1).map_or("chore", |m| m.as_str()).to_lowercase(),
            caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
        ),
        None => ("chore".to_string(), message.to_string()),
    };

    let description = ticket_title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| (!own_description.is_empty()).then_some(own_description))
        .unwrap_or_else(|| ticket_key.to_string());

    format!("{kind}: [{ticket_key}] {description}")
}

/// Extract `OPTION_n:` commit messages, applying the ticket rewrite when a
/// ticket is known.
pub fn extract_commit_messages(raw: &str, ticket: Option<&TicketContext>) -> ParseResult<String> {
    let result = parse_numbered_output(raw, &ParseOptions::default());
    match ticket {
        Some(t) => result.map(|m| format_commit_with_ticket(&m, &t.key, t.title.as_deref())),
        None => result,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
