use crate::error::{PrflowError, Result};
use crate::forge::ForgeKind;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AgentConfig
// ---------------------------------------------------------------------------

/// Which AI-agent CLI to drive.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentKind {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub backend: AgentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Echo agent output line by line while it arrives.
    #[serde(default)]
    pub stream: bool,
    /// 0 disables the timeout.
    #[serde(default = "default_agent_timeout")]
    pub timeout_seconds: u64,
}

fn default_agent_timeout() -> u64 {
    300
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backend: AgentKind::default(),
            model: None,
            stream: false,
            timeout_seconds: default_agent_timeout(),
        }
    }
}

impl AgentConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

// ---------------------------------------------------------------------------
// JiraConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub api_token_env: String,
}

fn default_token_env() -> String {
    "JIRA_API_TOKEN".to_string()
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            email: None,
            api_token_env: default_token_env(),
        }
    }
}

impl JiraConfig {
    pub fn enabled(&self) -> bool {
        self.base_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api_token_env)
            .ok()
            .filter(|t| !t.is_empty())
    }
}

// ---------------------------------------------------------------------------
// ForgeConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeConfig {
    #[serde(default)]
    pub kind: ForgeKind,
    /// Open pull requests as drafts unless overridden on the command line.
    #[serde(default)]
    pub draft: bool,
}

// ---------------------------------------------------------------------------
// PlanConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(default = "default_test_command")]
    pub default_test_command: String,
    #[serde(default = "default_build_command")]
    pub default_build_command: String,
    /// Per-step shell timeout. 0 waits forever.
    #[serde(default = "default_step_timeout")]
    pub step_timeout_seconds: u64,
    /// Write `<plan>.results.json` after every run.
    #[serde(default)]
    pub save_results: bool,
}

fn default_test_command() -> String {
    "npm test".to_string()
}

fn default_build_command() -> String {
    "npm run build".to_string()
}

fn default_step_timeout() -> u64 {
    600
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            default_test_command: default_test_command(),
            default_build_command: default_build_command(),
            step_timeout_seconds: default_step_timeout(),
            save_results: false,
        }
    }
}

impl PlanConfig {
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_seconds > 0).then(|| Duration::from_secs(self.step_timeout_seconds))
    }
}

// ---------------------------------------------------------------------------
// NamingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Rewrite commit suggestions as `type: [KEY] title` when a ticket is known.
    #[serde(default = "default_true")]
    pub ticket_in_commit: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            ticket_in_commit: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub forge: ForgeConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub naming: NamingConfig,
}

/// A config together with the file it came from (`None` for built-in defaults).
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PrflowError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Find and load the effective config.
    ///
    /// An explicit path must exist. Otherwise `<root>/.prflow.yaml`, then
    /// `~/.config/prflow/config.yaml`, then built-in defaults.
    pub fn resolve(root: &Path, explicit: Option<&Path>) -> Result<LoadedConfig> {
        Self::resolve_with_home(root, explicit, home::home_dir().as_deref())
    }

    pub fn resolve_with_home(
        root: &Path,
        explicit: Option<&Path>,
        home: Option<&Path>,
    ) -> Result<LoadedConfig> {
        if let Some(path) = explicit {
            return Ok(LoadedConfig {
                config: Self::load(path)?,
                source: Some(path.to_path_buf()),
            });
        }

        let candidates = std::iter::once(paths::repo_config_path(root))
            .chain(home.map(paths::user_config_path));
        for path in candidates {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading config");
                return Ok(LoadedConfig {
                    config: Self::load(&path)?,
                    source: Some(path),
                });
            }
        }

        Ok(LoadedConfig {
            config: Self::default(),
            source: None,
        })
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let AgentKind::Custom { command, .. } = &self.agent.backend {
            if command.trim().is_empty() {
                warnings.push(ConfigWarning::error(
                    "agent.backend is custom but has an empty command",
                ));
            }
        }
        if self.agent.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            warnings.push(ConfigWarning::warning(
                "agent.model is set but empty; the backend default will be used",
            ));
        }

        if let Some(url) = self.jira.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                warnings.push(ConfigWarning::error(format!(
                    "jira.base_url '{url}' must start with http:// or https://"
                )));
            }
            if !self.jira.email.as_deref().is_some_and(|e| !e.trim().is_empty()) {
                warnings.push(ConfigWarning::warning(
                    "jira.base_url is set without jira.email; ticket lookups will fail",
                ));
            }
            if self.jira.api_token_env.trim().is_empty() {
                warnings.push(ConfigWarning::error("jira.api_token_env is empty"));
            }
        }

        if self.plan.default_test_command.trim().is_empty() {
            warnings.push(ConfigWarning::warning(
                "plan.default_test_command is empty; test steps without a command will fail",
            ));
        }
        if self.plan.default_build_command.trim().is_empty() {
            warnings.push(ConfigWarning::warning(
                "plan.default_build_command is empty; build steps without a command will fail",
            ));
        }
        if self.plan.step_timeout_seconds > 86_400 {
            warnings.push(ConfigWarning::warning(format!(
                "plan.step_timeout_seconds={} (>1 day is unusual)",
                self.plan.step_timeout_seconds
            )));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.agent.backend, AgentKind::Claude);
        assert_eq!(cfg.plan.default_test_command, "npm test");
        assert_eq!(cfg.plan.default_build_command, "npm run build");
        assert_eq!(cfg.plan.step_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(cfg.jira.api_token_env, "JIRA_API_TOKEN");
        assert!(!cfg.jira.enabled());
        assert!(cfg.naming.ticket_in_commit);
        assert_eq!(cfg.forge.kind, ForgeKind::GitHub);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "plan:\n  default_test_command: cargo test\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.plan.default_test_command, "cargo test");
        assert_eq!(cfg.plan.default_build_command, "npm run build");
        assert_eq!(cfg.agent.timeout_seconds, 300);
    }

    #[test]
    fn agent_kind_yaml_tagged() {
        let yaml = "agent:\n  backend:\n    type: custom\n    command: my-llm\n    args: [--quiet]\n  model: fast\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            cfg.agent.backend,
            AgentKind::Custom {
                command: "my-llm".into(),
                args: vec!["--quiet".into()]
            }
        );
        assert_eq!(cfg.agent.model.as_deref(), Some("fast"));

        let out = serde_yaml::to_string(&AgentKind::Codex).unwrap();
        assert!(out.contains("type: codex"));
    }

    #[test]
    fn zero_timeouts_mean_unlimited() {
        let yaml = "agent:\n  timeout_seconds: 0\nplan:\n  step_timeout_seconds: 0\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.agent.timeout().is_none());
        assert!(cfg.plan.step_timeout().is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.yaml");
        let mut cfg = Config::default();
        cfg.forge.kind = ForgeKind::GitLab;
        cfg.plan.save_results = true;
        cfg.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.forge.kind, ForgeKind::GitLab);
        assert!(loaded.plan.save_results);
    }

    #[test]
    fn empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert!(Config::load(&path).is_ok());
    }

    #[test]
    fn explicit_missing_path_is_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::resolve_with_home(dir.path(), Some(&dir.path().join("nope.yaml")), None)
            .unwrap_err();
        assert!(matches!(err, PrflowError::ConfigNotFound(_)));
    }

    #[test]
    fn repo_config_beats_user_config() {
        let repo = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let user = paths::user_config_path(home.path());
        std::fs::create_dir_all(user.parent().unwrap()).unwrap();
        std::fs::write(&user, "plan:\n  default_test_command: from-home\n").unwrap();

        let loaded = Config::resolve_with_home(repo.path(), None, Some(home.path())).unwrap();
        assert_eq!(loaded.config.plan.default_test_command, "from-home");
        assert_eq!(loaded.source.as_deref(), Some(user.as_path()));

        std::fs::write(
            paths::repo_config_path(repo.path()),
            "plan:\n  default_test_command: from-repo\n",
        )
        .unwrap();
        let loaded = Config::resolve_with_home(repo.path(), None, Some(home.path())).unwrap();
        assert_eq!(loaded.config.plan.default_test_command, "from-repo");
    }

    #[test]
    fn no_config_anywhere_is_defaults() {
        let repo = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let loaded = Config::resolve_with_home(repo.path(), None, Some(home.path())).unwrap();
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config.plan.step_timeout_seconds, 600);
    }

    #[test]
    fn validate_default_is_clean() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_custom_backend_without_command() {
        let mut cfg = Config::default();
        cfg.agent.backend = AgentKind::Custom {
            command: " ".into(),
            args: vec![],
        };
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("empty command")));
    }

    #[test]
    fn validate_jira_without_email() {
        let mut cfg = Config::default();
        cfg.jira.base_url = Some("https://acme.atlassian.net".into());
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("jira.email"));
    }

    #[test]
    fn validate_jira_bad_scheme() {
        let mut cfg = Config::default();
        cfg.jira.base_url = Some("acme.atlassian.net".into());
        cfg.jira.email = Some("me@acme.io".into());
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("http://")));
    }

    #[test]
    fn validate_empty_test_command() {
        let mut cfg = Config::default();
        cfg.plan.default_test_command = String::new();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("plan.default_test_command")));
    }
}
