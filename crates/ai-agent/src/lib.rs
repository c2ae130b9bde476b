//! `ai-agent`: drive an AI assistant CLI as a single-shot subprocess.
//!
//! The assistant is treated as a black box that reads a prompt on stdin and
//! writes a freeform text answer to stdout. Parsing that text into something
//! structured is the caller's job.
//!
//! # Architecture
//!
//! ```text
//! QueryOptions
//!     │
//!     ▼
//! AgentProcess    ← spawns `claude --print` / `codex exec -` / `gemini` / custom
//!     │              writes prompt to stdin, reads stdout line by line
//!     ▼
//! QueryStream     ← implements futures::Stream<Item = Result<String>>
//!     │              background task + mpsc channel
//!     ▼
//! runner::run     ← collects the full text (optionally echoing each line)
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use ai_agent::{run, QueryOptions, RunConfig};
//!
//! let result = run(RunConfig {
//!     prompt: "Suggest three branch names.".into(),
//!     opts: QueryOptions::default(),
//! })
//! .await?;
//! println!("{}", result.text);
//! ```

pub mod error;
pub mod runner;
pub mod stream;
pub mod types;

pub(crate) mod process;


pub use error::AgentError;
pub use runner::{run, run_streaming, RunConfig, RunResult};
pub use stream::QueryStream;
pub use types::{AgentBackend, QueryOptions};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Start a single agent query.
///
/// Returns a [`QueryStream`] that yields stdout lines as they arrive. The
/// stream terminates on process exit.
pub fn query(prompt: impl Into<String>, opts: QueryOptions) -> QueryStream {
    QueryStream::new(prompt.into(), opts)
}

/// Find the first known backend whose executable is on `PATH`.
///
/// Priority: claude > codex > gemini.
pub fn detect_backend() -> Option<AgentBackend> {
    [AgentBackend::Claude, AgentBackend::Codex, AgentBackend::Gemini]
        .into_iter()
        .find(AgentBackend::is_installed)
}
