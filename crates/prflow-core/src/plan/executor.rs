use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;

use super::operator::Operator;
use super::step::{ExecutionResult, PlanStep, StepType};
use crate::config::PlanConfig;
use crate::shell::{run_shell_command, ShellOutput};

// ---------------------------------------------------------------------------
// StepError
// ---------------------------------------------------------------------------

/// Why a single step failed. Rendered into `ExecutionResult::error`.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("No command specified for step {0}")]
    MissingCommand(usize),

    #[error("No file path specified for step {0}")]
    MissingFilePath(usize),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("{0}")]
    CommandFailed(String),

    #[error("Command timed out after {0}s")]
    TimedOut(u64),

    #[error("Unknown step type: {0}")]
    UnknownType(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// StepExecutor
// ---------------------------------------------------------------------------

/// Runs one [`PlanStep`] at a time against a working directory.
pub struct StepExecutor {
    root: PathBuf,
    test_command: String,
    build_command: String,
    timeout: Option<Duration>,
}

impl StepExecutor {
    pub fn new(root: &Path, config: &PlanConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            test_command: config.default_test_command.clone(),
            build_command: config.default_build_command.clone(),
            timeout: config.step_timeout(),
        }
    }

    /// Execute `step` and record the outcome. Never panics or returns `Err`:
    /// every failure ends up in the result's `error`.
    pub fn execute_step(
        &self,
        step: &PlanStep,
        step_number: usize,
        operator: &mut dyn Operator,
    ) -> ExecutionResult {
        let start = Instant::now();
        let outcome = self.perform(step, step_number, operator);
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                tracing::debug!(step = step_number, step_type = %step.step_type, duration_ms, "step succeeded");
                ExecutionResult {
                    step: step.clone(),
                    success: true,
                    output: Some(output),
                    error: None,
                    duration_ms,
                    timestamp: Utc::now(),
                }
            }
            Err(e) => {
                tracing::warn!(step = step_number, step_type = %step.step_type, duration_ms, error = %e, "step failed");
                ExecutionResult {
                    step: step.clone(),
                    success: false,
                    output: None,
                    error: Some(e.to_string()),
                    duration_ms,
                    timestamp: Utc::now(),
                }
            }
        }
    }

    fn perform(
        &self,
        step: &PlanStep,
        step_number: usize,
        operator: &mut dyn Operator,
    ) -> Result<String, StepError> {
        match &step.step_type {
            StepType::Command | StepType::Git | StepType::Npm => {
                let cmd = step
                    .trimmed_command()
                    .ok_or(StepError::MissingCommand(step_number))?;
                self.shell(cmd)
            }
            StepType::Test => self.shell(step.trimmed_command().unwrap_or(self.test_command.as_str())),
            StepType::Build => self.shell(step.trimmed_command().unwrap_or(self.build_command.as_str())),
            StepType::CreateFile => {
                let path = self.file_path(step, step_number)?;
                crate::io::atomic_write(&path, step.body().as_bytes())
                    .map_err(|e| StepError::Other(e.to_string()))?;
                Ok(format!("Created file: {}", display_path(step)))
            }
            StepType::EditFile => {
                let path = self.file_path(step, step_number)?;
                if !path.is_file() {
                    return Err(StepError::FileNotFound(display_path(step)));
                }
                crate::io::atomic_write(&path, step.body().as_bytes())
                    .map_err(|e| StepError::Other(e.to_string()))?;
                Ok(format!("Updated file: {}", display_path(step)))
            }
            StepType::DeleteFile => {
                let path = self.file_path(step, step_number)?;
                if path.exists() {
                    std::fs::remove_file(&path)?;
                    Ok(format!("Deleted file: {}", display_path(step)))
                } else {
                    tracing::warn!(path = %path.display(), "file to delete does not exist");
                    Ok(format!("File not found, nothing to delete: {}", display_path(step)))
                }
            }
            // Fence-inferred mkdir steps carry a command instead of a path
            StepType::Mkdir if step.file_path.is_none() && step.trimmed_command().is_some() => {
                self.shell(step.trimmed_command().unwrap_or_default())
            }
            StepType::Mkdir => {
                let path = self.file_path(step, step_number)?;
                std::fs::create_dir_all(&path)?;
                Ok(format!("Created directory: {}", display_path(step)))
            }
            StepType::Manual => {
                if operator.confirm_manual(step) {
                    Ok("Completed by user".to_string())
                } else {
                    Ok("Skipped by user".to_string())
                }
            }
            StepType::Unknown(name) => Err(StepError::UnknownType(name.clone())),
        }
    }

    fn shell(&self, command: &str) -> Result<String, StepError> {
        tracing::info!(command, cwd = %self.root.display(), "running step command");
        let out = run_shell_command(command, &self.root, self.timeout)
            .map_err(|e| StepError::Other(e.to_string()))?;
        shell_outcome(out, self.timeout)
    }

    fn file_path(&self, step: &PlanStep, step_number: usize) -> Result<PathBuf, StepError> {
        let raw = step
            .file_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(StepError::MissingFilePath(step_number))?;
        let p = Path::new(raw);
        Ok(if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        })
    }
}

fn display_path(step: &PlanStep) -> String {
    step.file_path.as_deref().unwrap_or("").trim().to_string()
}

fn shell_outcome(out: ShellOutput, timeout: Option<Duration>) -> Result<String, StepError> {
    if out.timed_out {
        return Err(StepError::TimedOut(timeout.map_or(0, |t| t.as_secs())));
    }
    if out.success() {
        return Ok(out.stdout.trim().to_string());
    }
    let stderr = out.stderr.trim();
    let message = if !stderr.is_empty() {
        stderr.to_string()
    } else {
        match out.exit_code {
            Some(code) => format!("Command exited with code {code}"),
            None => "Command terminated by signal".to_string(),
        }
    };
    Err(StepError::CommandFailed(message))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
