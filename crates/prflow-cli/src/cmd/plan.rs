use anyhow::Context;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use thiserror::Error;

use prflow_core::assist::generate_plan;
use prflow_core::jira::is_ticket_key;
use prflow_core::paths;
use prflow_core::plan::{self, PlanStep, PlanSummary, StepExecutor};

use crate::context::AppContext;
use crate::operator::ConsoleOperator;
use crate::output::{one_line, print_json, print_table};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Ask the agent for an implementation plan and save it as markdown
    Generate {
        /// A ticket key (e.g. PROJ-123) or a freeform description of the work
        source: String,
        /// Output file (default: .prflow/plans/<slug>.md). A `.json` path
        /// stores the parsed steps instead of the markdown.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Parse a plan file and list its steps
    Show {
        /// Markdown or JSON plan
        file: PathBuf,
    },

    /// Execute a plan step by step
    Run {
        /// Markdown or JSON plan
        file: PathBuf,
        /// Never prompt: manual steps are skipped and the first failure stops the run
        #[arg(long)]
        non_interactive: bool,
        /// Write the run summary as JSON to this file
        #[arg(long)]
        results: Option<PathBuf>,
    },
}

/// Plan outcomes that end the process with a specific exit code.
#[derive(Debug, Error)]
pub enum PlanExit {
    #[error("plan stopped after step {step} failed")]
    Aborted { step: u32 },

    #[error("no steps found in {0}")]
    NoSteps(String),
}

impl PlanExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            PlanExit::Aborted { .. } => 2,
            PlanExit::NoSteps(_) => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &AppContext, subcmd: PlanSubcommand) -> anyhow::Result<()> {
    match subcmd {
        PlanSubcommand::Generate { source, output } => generate(ctx, &source, output),
        PlanSubcommand::Show { file } => show(ctx, &resolve(ctx, &file)),
        PlanSubcommand::Run {
            file,
            non_interactive,
            results,
        } => run_steps(ctx, &resolve(ctx, &file), non_interactive, results),
    }
}

fn resolve(ctx: &AppContext, file: &Path) -> PathBuf {
    if file.is_absolute() || file.exists() {
        file.to_path_buf()
    } else {
        ctx.root.join(file)
    }
}

fn load(path: &Path) -> anyhow::Result<Vec<PlanStep>> {
    let steps = plan::load_plan(path).with_context(|| format!("failed to read plan {}", path.display()))?;
    if steps.is_empty() {
        return Err(PlanExit::NoSteps(path.display().to_string()).into());
    }
    Ok(steps)
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

fn generate(ctx: &AppContext, source: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let ticket = if is_ticket_key(source) {
        ctx.ticket(Some(source))?
    } else {
        None
    };

    let plan = generate_plan(&ctx.agent(), source, ticket.as_ref()).context("plan generation failed")?;

    let path = output.unwrap_or_else(|| paths::plan_path(&ctx.root, source));
    let written = if plan::is_json_path(&path) {
        plan::save_plan(&path, &plan.steps)
    } else {
        prflow_core::io::atomic_write(&path, plan.text.as_bytes())
    };
    written.with_context(|| format!("failed to write {}", path.display()))?;

    if ctx.json {
        print_json(&serde_json::json!({
            "path": path,
            "steps": plan.steps,
        }))?;
    } else {
        println!("Saved {} steps to {}", plan.steps.len(), path.display());
        print_steps(&plan.steps);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(ctx: &AppContext, path: &Path) -> anyhow::Result<()> {
    let steps = load(path)?;
    if ctx.json {
        print_json(&steps)?;
    } else {
        print_steps(&steps);
    }
    Ok(())
}

fn step_target(step: &PlanStep) -> String {
    step.file_path
        .as_deref()
        .or(step.trimmed_command())
        .map(|t| one_line(t, 60))
        .unwrap_or_default()
}

fn print_steps(steps: &[PlanStep]) {
    let rows: Vec<Vec<String>> = steps
        .iter()
        .map(|s| {
            vec![
                s.number.to_string(),
                s.step_type.to_string(),
                one_line(&s.title, 50),
                step_target(s),
            ]
        })
        .collect();
    print_table(&["#", "TYPE", "TITLE", "TARGET"], &rows);
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn run_steps(
    ctx: &AppContext,
    path: &Path,
    non_interactive: bool,
    results: Option<PathBuf>,
) -> anyhow::Result<()> {
    let steps = load(path)?;
    let executor = StepExecutor::new(&ctx.root, &ctx.config.plan);
    let mut operator = ConsoleOperator::new(!non_interactive, ctx.json);

    tracing::info!(plan = %path.display(), steps = steps.len(), "running plan");
    let summary = plan::run_plan(&steps, &executor, &mut operator);

    let results_path = results.or_else(|| {
        ctx.config
            .plan
            .save_results
            .then(|| paths::results_path_for(path))
    });
    if let Some(out) = &results_path {
        plan::save_results(out, &summary)
            .with_context(|| format!("failed to write results to {}", out.display()))?;
    }

    let skipped = summary.skipped(steps.len());
    if ctx.json {
        print_json(&serde_json::json!({
            "summary": summary,
            "totalSteps": steps.len(),
            "skipped": skipped,
            "allSucceeded": summary.all_succeeded(),
            "resultsFile": results_path,
        }))?;
    } else {
        print_summary(&summary, skipped);
        if let Some(out) = &results_path {
            println!("Results written to {}", out.display());
        }
    }

    if summary.aborted {
        let step = summary.results.last().map(|r| r.step.number).unwrap_or(0);
        return Err(PlanExit::Aborted { step }.into());
    }
    Ok(())
}

fn print_summary(summary: &PlanSummary, skipped: usize) {
    let rows: Vec<Vec<String>> = summary
        .results
        .iter()
        .map(|r| {
            let detail = if r.success {
                r.output.as_deref().map(|o| one_line(o, 60)).unwrap_or_default()
            } else {
                r.error.as_deref().map(|e| one_line(e, 60)).unwrap_or_default()
            };
            vec![
                r.step.number.to_string(),
                if r.success { "ok" } else { "FAIL" }.to_string(),
                format!("{}ms", r.duration_ms),
                one_line(&r.step.title, 40),
                detail,
            ]
        })
        .collect();
    print_table(&["#", "STATUS", "TIME", "TITLE", "DETAIL"], &rows);
    println!();
    println!(
        "{} succeeded, {} failed, {} skipped ({}ms)",
        summary.success_count, summary.failure_count, skipped, summary.total_duration_ms
    );
}
