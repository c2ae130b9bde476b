use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

use crate::types::QueryOptions;
use crate::{AgentError, Result};

// ─── AgentProcess ─────────────────────────────────────────────────────────

/// A running assistant CLI in single-shot print mode.
///
/// The prompt is written to stdin and stdin is closed immediately; the
/// response is read line by line from stdout. Stderr is captured in a
/// background task and surfaced on a non-zero exit.
pub(crate) struct AgentProcess {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    /// Stderr output collected by a background reader task.
    stderr_buf: Arc<Mutex<String>>,
}

impl AgentProcess {
    /// Spawn the configured agent executable and feed it `prompt`.
    pub(crate) async fn spawn(prompt: &str, opts: &QueryOptions) -> Result<Self> {
        let mut cmd = build_command(opts);

        for (k, v) in &opts.env {
            cmd.env(k, v);
        }

        let mut process = Self::from_command(cmd, Some(prompt))?;
        process.write_prompt(prompt).await?;
        Ok(process)
    }

    /// Spawn an arbitrary command as a mock agent.
    /// Used in unit tests to inject a command that emits fixed output.
    #[cfg(test)]
    pub(crate) fn spawn_command(cmd: Command) -> Result<Self> {
        Self::from_command(cmd, None)
    }

    fn from_command(mut cmd: Command, prompt: Option<&str>) -> Result<Self> {
        if prompt.is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AgentError::NotFound(format!("{:?}", cmd.as_std().get_program()))
            } else {
                AgentError::Io(e)
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Process("stdout not captured".into()))?;

        let stderr_buf = Arc::new(Mutex::new(String::new()));
        if let Some(stderr) = child.stderr.take() {
            let buf = Arc::clone(&stderr_buf);
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    if let Ok(mut b) = buf.lock() {
                        if !b.is_empty() {
                            b.push('\n');
                        }
                        b.push_str(&line);
                    }
                }
            });
        }

        let lines = BufReader::new(stdout).lines();
        Ok(Self {
            child,
            lines,
            stderr_buf,
        })
    }

    /// Write the prompt and close stdin so the agent sees EOF.
    async fn write_prompt(&mut self, prompt: &str) -> Result<()> {
        let mut stdin = self
            .child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Process("stdin not captured".into()))?;

        stdin.write_all(prompt.as_bytes()).await?;
        if !prompt.ends_with('\n') {
            stdin.write_all(b"\n").await?;
        }
        stdin.flush().await?;
        // dropping closes the pipe
        Ok(())
    }

    /// Read the next stdout line. Returns `Ok(None)` on EOF.
    pub(crate) async fn next_line(&mut self) -> Result<Option<String>> {
        self.lines.next_line().await.map_err(AgentError::Io)
    }

    /// Wait for the child to exit and return an error if the exit code is
    /// non-zero or the process was killed by a signal. Captured stderr is
    /// included in the message.
    pub(crate) async fn wait_exit_error(&mut self) -> Option<AgentError> {
        let status = match self.child.wait().await {
            Ok(s) => s,
            Err(e) => return Some(AgentError::Io(e)),
        };

        if status.success() {
            return None;
        }

        let stderr = self
            .stderr_buf
            .lock()
            .ok()
            .map(|b| b.clone())
            .unwrap_or_default();

        let head = match status.code() {
            Some(code) => format!("agent process exited with code {code}"),
            None => "agent process terminated by signal".to_string(),
        };
        let msg = if stderr.is_empty() {
            head
        } else {
            format!("{head}\nstderr: {stderr}")
        };

        Some(AgentError::Process(msg))
    }

    /// Kill the subprocess (best-effort; errors are silently ignored).
    pub(crate) async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }
}

// ─── Command builder ──────────────────────────────────────────────────────

pub(crate) fn build_command(opts: &QueryOptions) -> Command {
    let exe = opts
        .path_to_executable
        .as_deref()
        .unwrap_or_else(|| opts.backend.executable());
    let mut cmd = Command::new(exe);
    cmd.args(opts.backend.print_args(opts.model.as_deref()));

    // Allow running from inside an assistant session.
    cmd.env_remove("CLAUDECODE");

    if let Some(cwd) = &opts.cwd {
        cmd.current_dir(cwd);
    }

    cmd
}
