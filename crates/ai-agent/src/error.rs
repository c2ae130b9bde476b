use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process error: {0}")]
    Process(String),

    #[error("agent executable not found on PATH: {0}")]
    NotFound(String),

    #[error("agent returned an empty response")]
    EmptyResponse,

    #[error("agent did not finish within {0}s")]
    Timeout(u64),
}
