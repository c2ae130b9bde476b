use anyhow::Context;
use clap::Subcommand;
use prflow_core::assist::{describe_pr, review_diff};
use prflow_core::forge::{ForgeCli, PullRequest};
use prflow_core::git::Vcs;

use crate::context::AppContext;
use crate::output::print_json;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum PrSubcommand {
    /// Push the current branch and open a pull request with an AI-written description
    Create {
        /// Target branch (default: the remote's default branch)
        #[arg(long)]
        base: Option<String>,
        /// Open as a draft
        #[arg(long)]
        draft: bool,
        /// Ticket key (default: taken from the branch name when JIRA is configured)
        #[arg(long)]
        ticket: Option<String>,
    },

    /// Print an AI review of an existing pull request
    Review {
        /// Pull/merge request number
        number: u64,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &AppContext, subcmd: PrSubcommand) -> anyhow::Result<()> {
    match subcmd {
        PrSubcommand::Create {
            base,
            draft,
            ticket,
        } => create(ctx, base, draft, ticket.as_deref()),
        PrSubcommand::Review { number } => review(ctx, number),
    }
}

fn create(ctx: &AppContext, base: Option<String>, draft: bool, ticket: Option<&str>) -> anyhow::Result<()> {
    let git = ctx.git();
    let head = git.current_branch()?;
    let base = match base {
        Some(b) => b,
        None => git.default_branch()?,
    };
    if head == base {
        anyhow::bail!("current branch '{head}' is the base branch; create a feature branch first");
    }

    let diff = git
        .diff_against(&base)
        .with_context(|| format!("failed to diff {head} against {base}"))?;
    if diff.trim().is_empty() {
        anyhow::bail!("'{head}' has no changes compared to '{base}'");
    }
    let ticket = ctx.ticket(ticket)?;

    let description = describe_pr(&ctx.agent(), &head, &diff, ticket.as_ref())
        .context("could not get a PR description from the agent")?;

    git.push(&head).with_context(|| format!("failed to push '{head}'"))?;

    let forge = ForgeCli::new(ctx.config.forge.kind, &ctx.root);
    let url = forge
        .create_pr(&PullRequest {
            title: description.title.clone(),
            body: description.body.clone(),
            base: base.clone(),
            head: head.clone(),
            draft: draft || ctx.config.forge.draft,
        })
        .context("failed to create pull request")?;

    if ctx.json {
        print_json(&serde_json::json!({
            "url": url,
            "title": description.title,
            "base": base,
            "head": head,
        }))?;
    } else {
        println!("{}", description.title);
        println!("{url}");
    }
    Ok(())
}

fn review(ctx: &AppContext, number: u64) -> anyhow::Result<()> {
    let forge = ForgeCli::new(ctx.config.forge.kind, &ctx.root);
    let diff = forge
        .pr_diff(number)
        .with_context(|| format!("failed to fetch diff for #{number}"))?;
    if diff.trim().is_empty() {
        anyhow::bail!("#{number} has an empty diff");
    }
    let review = review_diff(&ctx.agent(), &diff).context("agent review failed")?;

    if ctx.json {
        print_json(&serde_json::json!({ "number": number, "review": review }))?;
    } else {
        println!("{review}");
    }
    Ok(())
}
