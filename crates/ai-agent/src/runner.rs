use std::time::Instant;

use futures::StreamExt;

use crate::stream::QueryStream;
use crate::{query, AgentError, QueryOptions, Result};

// ─── RunConfig ────────────────────────────────────────────────────────────

/// Configuration for a single agent invocation.
///
/// Pass to [`run`] or [`run_streaming`] to drive the agent to completion.
#[derive(Debug)]
pub struct RunConfig {
    /// The prompt the agent will answer.
    pub prompt: String,
    /// Backend, model, working directory, timeout.
    pub opts: QueryOptions,
}

// ─── RunResult ────────────────────────────────────────────────────────────

/// The full response of a completed agent run.
#[derive(Debug)]
pub struct RunResult {
    /// Everything the agent wrote to stdout, lines joined with `\n`.
    pub text: String,
    pub duration_ms: u64,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run the agent and capture its whole response.
///
/// Returns `Err` if the process fails to start, exits non-zero, exceeds
/// `opts.timeout`, or produces only whitespace.
pub async fn run(config: RunConfig) -> Result<RunResult> {
    run_streaming(config, |_| {}).await
}

/// Run the agent, calling `on_line` for every stdout line as it arrives.
///
/// The complete text is still returned in the [`RunResult`].
pub async fn run_streaming<F>(config: RunConfig, on_line: F) -> Result<RunResult>
where
    F: FnMut(&str),
{
    let timeout = config.opts.timeout;
    let stream = query(config.prompt, config.opts);
    match timeout {
        None => collect(stream, on_line).await,
        Some(limit) => tokio::time::timeout(limit, collect(stream, on_line))
            .await
            .map_err(|_| AgentError::Timeout(limit.as_secs()))?,
    }
}

// ─── Internal ─────────────────────────────────────────────────────────────

/// Consume a [`QueryStream`] into a [`RunResult`].
///
/// Exposed as `pub(crate)` so tests can inject mock streams directly without
/// spawning a real agent subprocess.
pub(crate) async fn collect<F>(stream: QueryStream, mut on_line: F) -> Result<RunResult>
where
    F: FnMut(&str),
{
    let start = Instant::now();
    let mut stream = stream;
    let mut lines: Vec<String> = Vec::new();

    while let Some(line) = stream.next().await {
        let line = line?;
        on_line(&line);
        lines.push(line);
    }

    let text = lines.join("\n");
    if text.trim().is_empty() {
        return Err(AgentError::EmptyResponse);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    tracing::debug!(duration_ms, lines = lines.len(), "agent response collected");

    Ok(RunResult { text, duration_ms })
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn mock_stream(items: Vec<Result<String>>) -> QueryStream {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            for item in items {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        QueryStream::from_channel(rx)
    }

    #[tokio::test]
    async fn collect_joins_lines() {
        let stream = mock_stream(vec![Ok("OPTION_1: feat: a".into()), Ok("OPTION_2: fix: b".into())]);
        let result = collect(stream, |_| {}).await.unwrap();
        assert_eq!(result.text, "OPTION_1: feat: a\nOPTION_2: fix: b");
    }

    #[tokio::test]
    async fn collect_calls_back_per_line() {
        let stream = mock_stream(vec![Ok("a".into()), Ok("b".into())]);
        let mut seen = Vec::new();
        collect(stream, |l| seen.push(l.to_string())).await.unwrap();
        assert_eq!(seen, ["a", "b"]);
    }

    #[tokio::test]
    async fn collect_whitespace_only_is_empty_response() {
        let stream = mock_stream(vec![Ok("   ".into()), Ok(String::new())]);
        let err = collect(stream, |_| {}).await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyResponse));
    }

    #[tokio::test]
    async fn collect_propagates_process_error() {
        let stream = mock_stream(vec![
            Ok("partial".into()),
            Err(AgentError::Process("exited with code 1".into())),
        ]);
        let err = collect(stream, |_| {}).await.unwrap_err();
        assert!(err.to_string().contains("code 1"));
    }

    #[tokio::test]
    async fn run_times_out() {
        let opts = QueryOptions {
            backend: crate::AgentBackend::Custom {
                command: "sh".into(),
                args: vec!["-c".into(), "sleep 5; echo late".into()],
            },
            timeout: Some(std::time::Duration::from_millis(100)),
            ..Default::default()
        };
        let err = run(RunConfig {
            prompt: "ignored".into(),
            opts,
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AgentError::Timeout(_)));
    }

    #[tokio::test]
    async fn run_custom_backend_echoes_prompt() {
        let opts = QueryOptions {
            backend: crate::AgentBackend::Custom {
                command: "cat".into(),
                args: vec![],
            },
            ..Default::default()
        };
        let result = run(RunConfig {
            prompt: "BRANCH_NAME_1: feat/x".into(),
            opts,
        })
        .await
        .unwrap();
        assert_eq!(result.text, "BRANCH_NAME_1: feat/x");
    }
}
