mod agent;
mod cmd;
mod context;
mod operator;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand,
    name::NameSubcommand,
    plan::{PlanExit, PlanSubcommand},
    pr::PrSubcommand,
};
use context::AppContext;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "prflow",
    about = "AI-assisted branch names, commit messages, pull requests and implementation plans",
    version,
    propagate_version = true
)]
struct Cli {
    /// Repository root (default: auto-detect from .prflow.yaml or .git)
    #[arg(long, global = true, env = "PRFLOW_ROOT")]
    root: Option<PathBuf>,

    /// Config file (default: <root>/.prflow.yaml, then ~/.config/prflow/config.yaml)
    #[arg(long, global = true, env = "PRFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Debug logging
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest branch names for the current changes
    Branch {
        /// Ticket key (default: taken from the branch name when JIRA is configured)
        #[arg(long)]
        ticket: Option<String>,
        /// Create and switch to the chosen branch
        #[arg(long)]
        create: bool,
    },

    /// Suggest commit messages for the staged changes and commit
    Commit {
        /// Ticket key (default: taken from the branch name when JIRA is configured)
        #[arg(long)]
        ticket: Option<String>,
        /// Take the first suggestion without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Pull requests
    Pr {
        #[command(subcommand)]
        subcommand: PrSubcommand,
    },

    /// Generate, inspect and run implementation plans
    Plan {
        #[command(subcommand)]
        subcommand: PlanSubcommand,
    },

    /// Branch-name helpers
    Name {
        #[command(subcommand)]
        subcommand: NameSubcommand,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let load = || AppContext::load(&root, cli.config.as_deref(), cli.json);

    let result = match cli.command {
        Commands::Branch { ticket, create } => {
            load().and_then(|ctx| cmd::branch::run(&ctx, ticket.as_deref(), create))
        }
        Commands::Commit { ticket, yes } => {
            load().and_then(|ctx| cmd::commit::run(&ctx, ticket.as_deref(), yes))
        }
        Commands::Pr { subcommand } => load().and_then(|ctx| cmd::pr::run(&ctx, subcommand)),
        Commands::Plan { subcommand } => load().and_then(|ctx| cmd::plan::run(&ctx, subcommand)),
        Commands::Config { subcommand } => load().and_then(|ctx| cmd::config::run(&ctx, subcommand)),
        Commands::Name { subcommand } => cmd::name::run(subcommand, cli.json),
    };

    if let Err(e) = result {
        if let Some(exit) = e.downcast_ref::<PlanExit>() {
            eprintln!("error: {exit}");
            std::process::exit(exit.exit_code());
        }
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
