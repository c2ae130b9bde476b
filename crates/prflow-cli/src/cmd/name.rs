use clap::{Subcommand, ValueEnum};
use std::io::Read;

use prflow_core::naming::{extract_branch_names, extract_commit_messages, sanitize_branch_name};
use prflow_core::parse::ParseResult;

use crate::output::print_json;

#[derive(Subcommand)]
pub enum NameSubcommand {
    /// Strip markdown decoration from a branch name
    Sanitize {
        text: String,
    },

    /// Parse candidates out of AI output read from stdin
    Extract {
        #[arg(long, value_enum, default_value_t = ExtractKind::Branch)]
        kind: ExtractKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExtractKind {
    /// `BRANCH_NAME_n:` lines
    Branch,
    /// `OPTION_n:` lines
    Commit,
}

pub fn run(subcmd: NameSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        NameSubcommand::Sanitize { text } => sanitize(&text, json),
        NameSubcommand::Extract { kind } => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            extract(&raw, kind, json)
        }
    }
}

fn sanitize(text: &str, json: bool) -> anyhow::Result<()> {
    let name = sanitize_branch_name(text);
    if json {
        print_json(&serde_json::json!({ "input": text, "name": name }))?;
    } else if !name.is_empty() {
        println!("{name}");
    }
    if name.is_empty() {
        anyhow::bail!("'{text}' is empty after sanitization");
    }
    Ok(())
}

fn extract(raw: &str, kind: ExtractKind, json: bool) -> anyhow::Result<()> {
    let result: ParseResult<String> = match kind {
        ExtractKind::Branch => extract_branch_names(raw),
        ExtractKind::Commit => extract_commit_messages(raw, None),
    };
    if json {
        print_json(&result)?;
    } else {
        for v in &result.values {
            println!("{v}");
        }
    }
    if let Some(e) = result.error {
        anyhow::bail!(e);
    }
    Ok(())
}
