use clap::Subcommand;
use prflow_core::config::{ConfigWarning, WarnLevel};

use crate::agent::missing_agent_warning;
use crate::context::AppContext;
use crate::output::print_json;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective config and where it was loaded from
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(ctx: &AppContext, subcmd: ConfigSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(ctx),
        ConfigSubcommand::Validate => validate(ctx),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(ctx: &AppContext) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(&serde_json::json!({
            "source": ctx.config_source,
            "config": ctx.config,
        }));
    }
    match &ctx.config_source {
        Some(p) => println!("# loaded from {}", p.display()),
        None => println!("# built-in defaults (no config file found)"),
    }
    print!("{}", serde_yaml::to_string(&ctx.config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(ctx: &AppContext) -> anyhow::Result<()> {
    let mut warnings = ctx.config.validate();
    if let Some(message) = missing_agent_warning(&ctx.config.agent) {
        warnings.push(ConfigWarning {
            level: WarnLevel::Warning,
            message,
        });
    }

    if ctx.json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
