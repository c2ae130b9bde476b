use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::process::AgentProcess;
use crate::types::QueryOptions;
use crate::Result;

// ─── QueryStream ──────────────────────────────────────────────────────────

/// An async stream of stdout lines from an agent subprocess.
///
/// Backed by a Tokio mpsc channel. A background task owns the
/// [`AgentProcess`] and forwards lines until EOF; a non-zero exit is
/// delivered as a final `Err` item. Dropping `QueryStream` closes the
/// receiver, which causes the background task to kill the process on the
/// next send attempt.
///
/// ```rust,ignore
/// use ai_agent::{query, QueryOptions};
/// use futures::StreamExt;
///
/// let mut stream = query("say hello", QueryOptions::default());
/// while let Some(line) = stream.next().await {
///     println!("{}", line?);
/// }
/// ```
pub struct QueryStream {
    rx: mpsc::Receiver<Result<String>>,
}

impl QueryStream {
    pub(crate) fn new(prompt: String, opts: QueryOptions) -> Self {
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let process = AgentProcess::spawn(&prompt, &opts).await;
            pump(process, tx).await;
        });

        QueryStream { rx }
    }

    /// Test-only constructor: stream the stdout of an arbitrary command.
    #[cfg(test)]
    pub(crate) fn from_command(cmd: tokio::process::Command) -> Self {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            pump(AgentProcess::spawn_command(cmd), tx).await;
        });
        QueryStream { rx }
    }

    /// Test-only constructor: wrap a raw mpsc receiver as a `QueryStream`.
    #[cfg(test)]
    pub(crate) fn from_channel(rx: mpsc::Receiver<Result<String>>) -> Self {
        Self { rx }
    }
}

async fn pump(process: Result<AgentProcess>, tx: mpsc::Sender<Result<String>>) {
    let mut process = match process {
        Ok(p) => p,
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            return;
        }
    };

    loop {
        match process.next_line().await {
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                process.kill().await;
                return;
            }
            Ok(None) => break,
            Ok(Some(line)) => {
                if tx.send(Ok(line)).await.is_err() {
                    // Receiver dropped
                    process.kill().await;
                    return;
                }
            }
        }
    }

    if let Some(exit_err) = process.wait_exit_error().await {
        let _ = tx.send(Err(exit_err)).await;
    }
}

impl Stream for QueryStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
