use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrflowError {
    #[error("not a git repository: {0}")]
    NotARepository(String),

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("{tool} failed: {message}")]
    Forge { tool: String, message: String },

    #[error("failed to spawn shell: {0}")]
    ShellSpawn(String),

    #[error("JIRA request failed: {0}")]
    Jira(String),

    #[error("JIRA is not configured: set jira.base_url and jira.email")]
    JiraNotConfigured,

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("agent failed: {0}")]
    Agent(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PrflowError>;
