use std::io::Write;
use std::path::Path;

use ai_agent::{run, run_streaming, AgentBackend, QueryOptions, RunConfig};
use prflow_core::assist::AgentInvoker;
use prflow_core::config::{AgentConfig, AgentKind};
use prflow_core::PrflowError;

/// [`AgentInvoker`] that runs the configured assistant CLI as a subprocess.
pub struct CliAgent {
    opts: QueryOptions,
    echo: bool,
}

impl CliAgent {
    /// `echo` streams the response to stderr while it arrives; it is forced
    /// off in JSON mode by the caller.
    pub fn new(cfg: &AgentConfig, root: &Path, echo: bool) -> Self {
        let opts = QueryOptions {
            backend: backend_for(&cfg.backend),
            model: cfg.model.clone().filter(|m| !m.trim().is_empty()),
            cwd: Some(root.to_path_buf()),
            timeout: cfg.timeout(),
            ..Default::default()
        };
        Self { opts, echo }
    }
}

pub fn backend_for(kind: &AgentKind) -> AgentBackend {
    match kind {
        AgentKind::Claude => AgentBackend::Claude,
        AgentKind::Codex => AgentBackend::Codex,
        AgentKind::Gemini => AgentBackend::Gemini,
        AgentKind::Custom { command, args } => AgentBackend::Custom {
            command: command.clone(),
            args: args.clone(),
        },
    }
}

/// `config validate` warning for an agent whose executable is not on `PATH`,
/// naming an installed alternative when there is one.
pub fn missing_agent_warning(cfg: &AgentConfig) -> Option<String> {
    let backend = backend_for(&cfg.backend);
    // an empty custom command is already a config error
    if backend.executable().trim().is_empty() || backend.is_installed() {
        return None;
    }
    let hint = match ai_agent::detect_backend() {
        Some(found) => format!("; '{found}' is installed (agent.backend.type: {found})"),
        None => String::new(),
    };
    Some(format!(
        "agent executable '{}' not found on PATH{hint}",
        backend.executable()
    ))
}

impl AgentInvoker for CliAgent {
    fn invoke(&self, prompt: &str) -> prflow_core::Result<String> {
        let run_cfg = RunConfig {
            prompt: prompt.to_string(),
            opts: self.opts.clone(),
        };
        let echo = self.echo;
        let response = async move {
            if echo {
                run_streaming(run_cfg, |line| {
                    let mut err = std::io::stderr().lock();
                    let _ = writeln!(err, "{line}");
                })
                .await
            } else {
                run(run_cfg).await
            }
        };

        tracing::info!(backend = %self.opts.backend, "invoking agent");
        let result = match tokio::runtime::Handle::try_current() {
            // Already inside a runtime (e.g. an async test harness)
            Ok(handle) => tokio::task::block_in_place(|| handle.block_on(response)),
            Err(_) => {
                let rt = tokio::runtime::Runtime::new().map_err(PrflowError::Io)?;
                rt.block_on(response)
            }
        }
        .map_err(|e| PrflowError::Agent(e.to_string()))?;

        tracing::debug!(duration_ms = result.duration_ms, "agent finished");
        Ok(result.text)
    }
}
