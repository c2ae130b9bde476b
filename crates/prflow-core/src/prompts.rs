//! Prompt text sent to the AI agent.
//!
//! Every prompt asks for a response shape that a parser in this crate
//! understands: `BRANCH_NAME_n:` lines, `OPTION_n:` lines, a `TITLE:`/`BODY:`
//! pair, or a numbered markdown plan.

use std::fmt::Write as _;

use crate::jira::TicketDetails;
use crate::naming::MAX_BRANCH_CANDIDATES;

/// Diffs longer than this are cut, keeping the head.
pub const MAX_DIFF_CHARS: usize = 12_000;

const TRUNCATION_NOTE: &str = "\n... [diff truncated]\n";

/// Cut `diff` to at most [`MAX_DIFF_CHARS`] characters on a char boundary.
pub fn truncate_diff(diff: &str) -> String {
    if diff.chars().count() <= MAX_DIFF_CHARS {
        return diff.to_string();
    }
    let head: String = diff.chars().take(MAX_DIFF_CHARS).collect();
    format!("{head}{TRUNCATION_NOTE}")
}

fn ticket_section(ticket: Option<&TicketDetails>) -> String {
    let Some(t) = ticket else {
        return String::new();
    };
    let mut s = if t.title.trim().is_empty() {
        format!("\nTicket {}\n", t.key)
    } else {
        format!("\nTicket {}: {}\n", t.key, t.title)
    };
    if let Some(kind) = &t.issue_type {
        let _ = writeln!(s, "Type: {kind}");
    }
    if let Some(desc) = &t.description {
        let _ = writeln!(s, "Description:\n{desc}");
    }
    s
}

fn diff_section(diff: &str) -> String {
    format!("\n```diff\n{}\n```\n", truncate_diff(diff).trim_end())
}

pub fn branch_name_prompt(diff: &str, ticket: Option<&TicketDetails>) -> String {
    let mut p = String::from(
        "Suggest git branch names for the following change.\n\
         Use the form <type>/<short-kebab-description> where type is one of \
         feat, fix, chore, docs, refactor, test.\n",
    );
    p.push_str(&ticket_section(ticket));
    p.push_str(&diff_section(diff));
    let _ = write!(
        p,
        "\nRespond with exactly {MAX_BRANCH_CANDIDATES} lines and nothing else:\n"
    );
    for i in 1..=MAX_BRANCH_CANDIDATES {
        let _ = writeln!(p, "BRANCH_NAME_{i}: <branch name>");
    }
    p
}

pub fn commit_message_prompt(diff: &str, ticket: Option<&TicketDetails>) -> String {
    let mut p = String::from(
        "Write commit messages for the following staged change.\n\
         Use Conventional Commits: <type>(<optional scope>): <description>, \
         one line, imperative mood, at most 72 characters.\n",
    );
    p.push_str(&ticket_section(ticket));
    p.push_str(&diff_section(diff));
    p.push_str("\nRespond with three alternatives and nothing else:\n");
    for i in 1..=3 {
        let _ = writeln!(p, "OPTION_{i}: <commit message>");
    }
    p
}

pub fn pr_description_prompt(branch: &str, diff: &str, ticket: Option<&TicketDetails>) -> String {
    let mut p = format!(
        "Write a pull request title and description for branch `{branch}`.\n\
         The description should be markdown with a short summary, a list of \
         changes, and testing notes.\n"
    );
    p.push_str(&ticket_section(ticket));
    p.push_str(&diff_section(diff));
    p.push_str("\nRespond in this format:\nTITLE: <one line title>\nBODY:\n<markdown description>\n");
    p
}

pub fn review_prompt(diff: &str) -> String {
    let mut p = String::from(
        "Review the following pull request diff. Point out bugs, risky changes, \
         missing tests, and unclear code. Group findings by file and mark each \
         as blocking or non-blocking. Respond in markdown.\n",
    );
    p.push_str(&diff_section(diff));
    p
}

/// Ask for a markdown implementation plan for a ticket or a freeform request.
pub fn plan_prompt(request: &str, ticket: Option<&TicketDetails>, json: bool) -> String {
    let mut p = String::from("Write a step-by-step implementation plan for the following work.\n");
    match ticket {
        Some(_) => p.push_str(&ticket_section(ticket)),
        None => {
            let _ = writeln!(p, "\nRequest: {}", request.trim());
        }
    }
    if json {
        p.push_str(
            "\nRespond with a JSON array of steps and nothing else. Each step has \
             \"title\", \"type\" (one of command, create-file, edit-file, delete-file, \
             mkdir, git, npm, test, build, manual) and, as needed, \"description\", \
             \"command\", \"filePath\", \"content\".\n",
        );
    } else {
        p.push_str(
            "\nFormat each step as a numbered list item (`1. Title`) followed by a \
             short description. Put any shell command in a ```bash fenced block under \
             its step. For file changes write `Create file path/to/file.ext` or \
             `Edit file path/to/file.ext`. Steps that need a human are plain text \
             with no code block.\n",
        );
    }
    p
}

// ---------------------------------------------------------------------------
// PR description response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrDescription {
    pub title: String,
    pub body: String,
}

/// Split a `TITLE:`/`BODY:` response. Without a `TITLE:` marker the first
/// non-empty line is the title and the rest the body. `None` for blank input.
pub fn parse_pr_description(raw: &str) -> Option<PrDescription> {
    let lines: Vec<&str> = raw.lines().collect();

    let (title, rest) = match lines
        .iter()
        .position(|l| strip_label(l.trim(), "TITLE:").is_some())
    {
        Some(i) => (strip_label(lines[i].trim(), "TITLE:")?, &lines[i + 1..]),
        None => {
            let i = lines.iter().position(|l| !l.trim().is_empty())?;
            (lines[i].trim(), &lines[i + 1..])
        }
    };

    let mut body: Vec<&str> = Vec::new();
    match rest
        .iter()
        .position(|l| strip_label(l.trim(), "BODY:").is_some())
    {
        Some(i) => {
            if let Some(first) = strip_label(rest[i].trim(), "BODY:").filter(|s| !s.is_empty()) {
                body.push(first);
            }
            body.extend(&rest[i + 1..]);
        }
        None => body.extend(rest),
    }

    let title = clean_title(title);
    if title.is_empty() {
        return None;
    }
    Some(PrDescription {
        title,
        body: body.join("\n").trim().to_string(),
    })
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let stripped = line.trim_start_matches(['*', '`']);
    let head = stripped.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(stripped[label.len()..].trim_matches(['*', '`']).trim())
    } else {
        None
    }
}

fn clean_title(s: &str) -> String {
    s.trim_start_matches('#').trim().trim_matches('"').trim().to_string()
}
