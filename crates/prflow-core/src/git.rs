use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PrflowError, Result};

/// Version-control operations the CLI commands depend on.
pub trait Vcs {
    fn current_branch(&self) -> Result<String>;
    fn default_branch(&self) -> Result<String>;
    /// Diff of the index against HEAD.
    fn staged_diff(&self) -> Result<String>;
    /// Diff of HEAD against the merge base with `base`.
    fn diff_against(&self, base: &str) -> Result<String>;
    fn create_branch(&self, name: &str) -> Result<()>;
    fn commit(&self, message: &str) -> Result<()>;
    fn push(&self, branch: &str) -> Result<()>;
}

/// [`Vcs`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

const ORIGIN_HEAD_PREFIX: &str = "refs/remotes/origin/";
const FALLBACK_DEFAULT_BRANCH: &str = "main";

impl GitCli {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!(?args, "git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| PrflowError::Git {
                command: args.first().copied().unwrap_or_default().to_string(),
                message: e.to_string(),
            })?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.to_lowercase().contains("not a git repository") {
                return Err(PrflowError::NotARepository(self.root.display().to_string()));
            }
            Err(PrflowError::Git {
                command: args.join(" "),
                message: if stderr.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    stderr
                },
            })
        }
    }
}

impl Vcs for GitCli {
    fn current_branch(&self) -> Result<String> {
        Ok(self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?.trim().to_string())
    }

    fn default_branch(&self) -> Result<String> {
        match self.run(&["symbolic-ref", "refs/remotes/origin/HEAD"]) {
            Ok(out) => Ok(parse_origin_head(&out)),
            Err(e) => {
                tracing::debug!(error = %e, "origin/HEAD not set, assuming {FALLBACK_DEFAULT_BRANCH}");
                Ok(FALLBACK_DEFAULT_BRANCH.to_string())
            }
        }
    }

    fn staged_diff(&self) -> Result<String> {
        self.run(&["diff", "--cached"])
    }

    fn diff_against(&self, base: &str) -> Result<String> {
        let range = format!("{base}...HEAD");
        self.run(&["diff", &range])
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.run(&["checkout", "-b", name]).map(drop)
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "-m", message]).map(drop)
    }

    fn push(&self, branch: &str) -> Result<()> {
        self.run(&["push", "-u", "origin", branch]).map(drop)
    }
}

/// `refs/remotes/origin/develop\n` → `develop`.
fn parse_origin_head(symbolic_ref: &str) -> String {
    let trimmed = symbolic_ref.trim();
    let name = trimmed.strip_prefix(ORIGIN_HEAD_PREFIX).unwrap_or(trimmed);
    if name.is_empty() {
        FALLBACK_DEFAULT_BRANCH.to_string()
    } else {
        name.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
