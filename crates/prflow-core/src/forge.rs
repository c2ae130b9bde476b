use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PrflowError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForgeKind {
    #[default]
    GitHub,
    GitLab,
}

impl ForgeKind {
    /// The forge CLI executable.
    pub fn tool(self) -> &'static str {
        match self {
            ForgeKind::GitHub => "gh",
            ForgeKind::GitLab => "glab",
        }
    }
}

impl fmt::Display for ForgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForgeKind::GitHub => f.write_str("github"),
            ForgeKind::GitLab => f.write_str("gitlab"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    pub base: String,
    pub head: String,
    pub draft: bool,
}

/// Pull/merge request operations through `gh` or `glab`.
#[derive(Debug, Clone)]
pub struct ForgeCli {
    kind: ForgeKind,
    root: PathBuf,
}

impl ForgeCli {
    pub fn new(kind: ForgeKind, root: &Path) -> Self {
        Self {
            kind,
            root: root.to_path_buf(),
        }
    }

    pub fn kind(&self) -> ForgeKind {
        self.kind
    }

    /// Open a pull request and return its URL.
    pub fn create_pr(&self, pr: &PullRequest) -> Result<String> {
        let out = self.run(&create_args(self.kind, pr))?;
        Ok(extract_url(&out).unwrap_or_else(|| out.trim().to_string()))
    }

    pub fn pr_diff(&self, number: u64) -> Result<String> {
        let n = number.to_string();
        let args: Vec<String> = match self.kind {
            ForgeKind::GitHub => vec!["pr".into(), "diff".into(), n],
            ForgeKind::GitLab => vec!["mr".into(), "diff".into(), n],
        };
        self.run(&args)
    }

    fn run(&self, args: &[String]) -> Result<String> {
        let tool = self.kind.tool();
        tracing::debug!(tool, ?args, "forge");
        let output = Command::new(tool)
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| PrflowError::Forge {
                tool: tool.to_string(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PrflowError::Forge {
                tool: tool.to_string(),
                message: if stderr.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    stderr
                },
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn create_args(kind: ForgeKind, pr: &PullRequest) -> Vec<String> {
    let mut args: Vec<String> = match kind {
        ForgeKind::GitHub => vec![
            "pr".into(),
            "create".into(),
            "--title".into(),
            pr.title.clone(),
            "--body".into(),
            pr.body.clone(),
            "--base".into(),
            pr.base.clone(),
            "--head".into(),
            pr.head.clone(),
        ],
        ForgeKind::GitLab => vec![
            "mr".into(),
            "create".into(),
            "--title".into(),
            pr.title.clone(),
            "--description".into(),
            pr.body.clone(),
            "--target-branch".into(),
            pr.base.clone(),
            "--source-branch".into(),
            pr.head.clone(),
            "--yes".into(),
        ],
    };
    if pr.draft {
        args.push("--draft".into());
    }
    args
}

/// Last `http(s)://` token in the tool's output.
fn extract_url(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .filter(|t| t.starts_with("https://") || t.starts_with("http://"))
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(draft: bool) -> PullRequest {
        PullRequest {
            title: "feat: login".into(),
            body: "Adds login".into(),
            base: "main".into(),
            head: "feat/login".into(),
            draft,
        }
    }

    #[test]
    fn github_args() {
        let args = create_args(ForgeKind::GitHub, &pr(false));
        assert_eq!(&args[..2], ["pr", "create"]);
        assert!(args.windows(2).any(|w| w == ["--base", "main"]));
        assert!(args.windows(2).any(|w| w == ["--head", "feat/login"]));
        assert!(!args.contains(&"--draft".to_string()));
    }

    #[test]
    fn gitlab_args_with_draft() {
        let args = create_args(ForgeKind::GitLab, &pr(true));
        assert_eq!(&args[..2], ["mr", "create"]);
        assert!(args.windows(2).any(|w| w == ["--target-branch", "main"]));
        assert!(args.windows(2).any(|w| w == ["--description", "Adds login"]));
        assert_eq!(args.last().map(String::as_str), Some("--draft"));
    }

    #[test]
    fn url_from_tool_output() {
        let out = "Creating pull request for feat/login into main\n\nhttps://github.com/acme/app/pull/42\n";
        assert_eq!(
            extract_url(out).as_deref(),
            Some("https://github.com/acme/app/pull/42")
        );
        assert!(extract_url("nothing here").is_none());
    }

    #[test]
    fn kind_yaml_names() {
        assert_eq!(serde_yaml::to_string(&ForgeKind::GitLab).unwrap().trim(), "gitlab");
        let k: ForgeKind = serde_yaml::from_str("github").unwrap();
        assert_eq!(k, ForgeKind::GitHub);
        assert_eq!(ForgeKind::GitLab.tool(), "glab");
    }
}
