use anyhow::Context;
use prflow_core::assist::suggest_branch_names;
use prflow_core::git::Vcs;

use crate::cmd::choose;
use crate::context::AppContext;
use crate::output::print_json;

/// Diff used to describe the current work: staged changes, or the branch's
/// commits against the default branch when nothing is staged.
pub fn working_diff(git: &dyn Vcs) -> anyhow::Result<String> {
    let staged = git.staged_diff().context("failed to read staged diff")?;
    if !staged.trim().is_empty() {
        return Ok(staged);
    }
    let base = git.default_branch()?;
    let committed = git
        .diff_against(&base)
        .with_context(|| format!("failed to diff against {base}"))?;
    if committed.trim().is_empty() {
        anyhow::bail!("no changes found: stage some changes or commit them on a branch");
    }
    Ok(committed)
}

pub fn run(ctx: &AppContext, ticket: Option<&str>, create: bool) -> anyhow::Result<()> {
    let git = ctx.git();
    let diff = working_diff(&git)?;
    let ticket = ctx.ticket(ticket)?;

    let names = suggest_branch_names(&ctx.agent(), &diff, ticket.as_ref())
        .context("could not get branch names from the agent")?;

    let created = if create {
        match choose("Create which branch?", names.clone(), ctx.json)? {
            Some(name) => {
                git.create_branch(&name)
                    .with_context(|| format!("failed to create branch '{name}'"))?;
                Some(name)
            }
            None => None,
        }
    } else {
        None
    };

    if ctx.json {
        print_json(&serde_json::json!({
            "names": names,
            "ticket": ticket.as_ref().map(|t| &t.key),
            "created": created,
        }))?;
        return Ok(());
    }

    match created {
        Some(name) => println!("Switched to new branch '{name}'"),
        None => {
            for (i, name) in names.iter().enumerate() {
                println!("{}. {name}", i + 1);
            }
        }
    }
    Ok(())
}
