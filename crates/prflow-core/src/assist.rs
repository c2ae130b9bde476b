//! Agent-backed suggestions: prompt, invoke, parse.
//!
//! These functions own the round trip between a prompt builder in
//! [`crate::prompts`] and the matching response parser. Parse failures come
//! back as [`PrflowError::Agent`] carrying the parser's message.

use crate::error::{PrflowError, Result};
use crate::jira::TicketDetails;
use crate::naming::{apply_ticket_to_branch, extract_branch_names, extract_commit_messages, TicketContext};
use crate::plan::{parse_json_plan, parse_markdown_plan, PlanStep};
use crate::prompts::{self, PrDescription};

/// Sends a prompt to an AI agent and returns its full text response.
pub trait AgentInvoker {
    fn invoke(&self, prompt: &str) -> Result<String>;
}

impl<F> AgentInvoker for F
where
    F: Fn(&str) -> Result<String>,
{
    fn invoke(&self, prompt: &str) -> Result<String> {
        self(prompt)
    }
}

fn ask(agent: &dyn AgentInvoker, prompt: &str) -> Result<String> {
    tracing::debug!(prompt_chars = prompt.len(), "invoking agent");
    let raw = agent.invoke(prompt)?;
    tracing::debug!(response_chars = raw.len(), "agent responded");
    Ok(raw)
}

/// Up to three sanitized branch names. The ticket key is worked into each
/// name when a ticket is given.
pub fn suggest_branch_names(
    agent: &dyn AgentInvoker,
    diff: &str,
    ticket: Option<&TicketDetails>,
) -> Result<Vec<String>> {
    let raw = ask(agent, &prompts::branch_name_prompt(diff, ticket))?;
    let names = extract_branch_names(&raw)
        .into_result()
        .map_err(PrflowError::Agent)?;
    Ok(match ticket {
        Some(t) => names
            .iter()
            .map(|n| apply_ticket_to_branch(n, &t.key))
            .collect(),
        None => names,
    })
}

/// Commit message candidates for a staged diff. With `ticket_in_message`,
/// each candidate is rewritten to carry `[KEY]` and the ticket title.
pub fn suggest_commit_messages(
    agent: &dyn AgentInvoker,
    diff: &str,
    ticket: Option<&TicketDetails>,
    ticket_in_message: bool,
) -> Result<Vec<String>> {
    let raw = ask(agent, &prompts::commit_message_prompt(diff, ticket))?;
    let context = ticket
        .filter(|_| ticket_in_message)
        .map(|t| TicketContext {
            key: t.key.clone(),
            title: Some(t.title.clone()).filter(|s| !s.trim().is_empty()),
        });
    extract_commit_messages(&raw, context.as_ref())
        .into_result()
        .map_err(PrflowError::Agent)
}

pub fn describe_pr(
    agent: &dyn AgentInvoker,
    branch: &str,
    diff: &str,
    ticket: Option<&TicketDetails>,
) -> Result<PrDescription> {
    let raw = ask(agent, &prompts::pr_description_prompt(branch, diff, ticket))?;
    prompts::parse_pr_description(&raw)
        .ok_or_else(|| PrflowError::Agent("agent returned an empty PR description".to_string()))
}

pub fn review_diff(agent: &dyn AgentInvoker, diff: &str) -> Result<String> {
    let raw = ask(agent, &prompts::review_prompt(diff))?;
    Ok(raw.trim().to_string())
}

/// A generated plan: the agent's text plus the steps parsed from it.
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    pub text: String,
    pub steps: Vec<PlanStep>,
}

/// Ask for a markdown plan. A response with no markdown steps is tried as
/// a JSON plan before giving up.
pub fn generate_plan(
    agent: &dyn AgentInvoker,
    request: &str,
    ticket: Option<&TicketDetails>,
) -> Result<GeneratedPlan> {
    let raw = ask(agent, &prompts::plan_prompt(request, ticket, false))?;
    let mut steps = parse_markdown_plan(&raw);
    if steps.is_empty() {
        steps = parse_json_plan(&raw).unwrap_or_default();
    }
    if steps.is_empty() {
        return Err(PrflowError::InvalidPlan(
            "agent response contained no plan steps".to_string(),
        ));
    }
    Ok(GeneratedPlan {
        text: raw.trim().to_string() + "\n",
        steps,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
