use anyhow::Context;
use prflow_core::assist::suggest_commit_messages;
use prflow_core::git::Vcs;

use crate::cmd::choose;
use crate::context::AppContext;
use crate::output::print_json;

pub fn run(ctx: &AppContext, ticket: Option<&str>, yes: bool) -> anyhow::Result<()> {
    let git = ctx.git();
    let diff = git.staged_diff().context("failed to read staged diff")?;
    if diff.trim().is_empty() {
        anyhow::bail!("nothing staged to commit (use `git add` first)");
    }
    let ticket = ctx.ticket(ticket)?;

    let messages = suggest_commit_messages(
        &ctx.agent(),
        &diff,
        ticket.as_ref(),
        ctx.config.naming.ticket_in_commit,
    )
    .context("could not get commit messages from the agent")?;

    let Some(message) = choose("Commit message:", messages.clone(), yes || ctx.json)? else {
        println!("Commit cancelled.");
        return Ok(());
    };

    git.commit(&message).context("git commit failed")?;

    if ctx.json {
        print_json(&serde_json::json!({
            "suggestions": messages,
            "committed": message,
        }))?;
    } else {
        println!("Committed: {message}");
    }
    Ok(())
}
