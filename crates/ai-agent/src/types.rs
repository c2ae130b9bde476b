use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─── AgentBackend ─────────────────────────────────────────────────────────

/// Which assistant CLI to drive.
///
/// Every backend is run in non-interactive "print" mode with the prompt
/// written to stdin, so the only protocol difference between them is the
/// argv used to launch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentBackend {
    #[default]
    Claude,
    Codex,
    Gemini,
    Custom {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl AgentBackend {
    pub fn name(&self) -> &str {
        match self {
            AgentBackend::Claude => "claude",
            AgentBackend::Codex => "codex",
            AgentBackend::Gemini => "gemini",
            AgentBackend::Custom { command, .. } => command,
        }
    }

    /// Default executable for this backend.
    pub fn executable(&self) -> &str {
        self.name()
    }

    /// Whether [`executable`](Self::executable) resolves on `PATH`.
    pub fn is_installed(&self) -> bool {
        which::which(self.executable()).is_ok()
    }

    /// Arguments that put the CLI into single-shot mode reading the prompt
    /// from stdin.
    pub fn print_args(&self, model: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        match self {
            AgentBackend::Claude => {
                args.push("--print".into());
                if let Some(m) = model {
                    args.push("--model".into());
                    args.push(m.into());
                }
            }
            AgentBackend::Codex => {
                args.push("exec".into());
                if let Some(m) = model {
                    args.push("--model".into());
                    args.push(m.into());
                }
                args.push("-".into());
            }
            AgentBackend::Gemini => {
                if let Some(m) = model {
                    args.push("--model".into());
                    args.push(m.into());
                }
            }
            AgentBackend::Custom { args: extra, .. } => {
                args.extend(extra.iter().cloned());
            }
        }
        args
    }
}

impl std::fmt::Display for AgentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── QueryOptions ─────────────────────────────────────────────────────────

/// Options for a single agent invocation.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub backend: AgentBackend,
    /// Model name passed through to the CLI, if it supports one.
    pub model: Option<String>,
    /// Working directory for the subprocess (default: current dir)
    pub cwd: Option<PathBuf>,
    /// Additional environment variables for the subprocess
    pub env: HashMap<String, String>,
    /// Overrides [`AgentBackend::executable`].
    pub path_to_executable: Option<String>,
    /// Wall-clock limit for the whole run. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}
