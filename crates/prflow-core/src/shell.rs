use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::{PrflowError, Result};

/// Captured result of a `sh -c` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Run `command` through `sh -c` in `cwd`.
///
/// Stdout and stderr are drained in dedicated threads so a chatty command
/// cannot deadlock on a full pipe. The shell leads its own process group.
/// With a timeout, a waiter thread reports the exit status over a channel
/// and the whole group is killed if the deadline passes, so nothing the
/// command forked outlives it. `None` waits indefinitely.
pub fn run_shell_command(command: &str, cwd: &Path, timeout: Option<Duration>) -> Result<ShellOutput> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    let mut child = cmd.spawn().map_err(|e| PrflowError::ShellSpawn(e.to_string()))?;

    let child_pid = child.id();
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || drain(stdout_handle));
    let stderr_thread = std::thread::spawn(move || drain(stderr_handle));

    let status = match timeout {
        None => child.wait()?,
        Some(limit) => {
            let (tx, rx) = std::sync::mpsc::channel();
            std::thread::spawn(move || {
                let _ = tx.send(child.wait());
            });
            match rx.recv_timeout(limit) {
                Ok(status) => status?,
                Err(_) => {
                    // Reader threads get EOF once the group is gone; they are
                    // not joined so a process that left the group and still
                    // holds the pipe cannot stall the caller.
                    kill_process_group(child_pid);
                    return Ok(ShellOutput {
                        stdout: String::new(),
                        stderr: format!("timed out after {}s", limit.as_secs()),
                        exit_code: None,
                        timed_out: true,
                    });
                }
            }
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    Ok(ShellOutput {
        stdout,
        stderr,
        exit_code: status.code(),
        timed_out: false,
    })
}

fn drain<R: Read>(handle: Option<R>) -> String {
    let mut buf = String::new();
    if let Some(mut r) = handle {
        let _ = r.read_to_string(&mut buf);
    }
    buf
}

/// SIGKILL the process group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        tracing::debug!(pid, error = %e, "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let out = run_shell_command("echo 'hello world'", Path::new("/tmp"), None).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello world");
        assert_eq!(out.exit_code, Some(0));
    }

    #[test]
    fn captures_stderr_and_exit_code() {
        let out = run_shell_command("echo 'bad' >&2; exit 4", Path::new("/tmp"), None).unwrap();
        assert!(!out.success());
        assert_eq!(out.stderr.trim(), "bad");
        assert_eq!(out.exit_code, Some(4));
    }

    #[test]
    fn runs_in_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let out = run_shell_command("ls", dir.path(), None).unwrap();
        assert!(out.stdout.contains("marker.txt"));
    }

    #[test]
    fn timeout_kills_process() {
        let out = run_shell_command("sleep 60", Path::new("/tmp"), Some(Duration::from_millis(150))).unwrap();
        assert!(out.timed_out);
        assert!(!out.success());
        assert!(out.exit_code.is_none());
    }

    #[test]
    fn timeout_kills_forked_children() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = run_shell_command(
            "(sleep 1; touch after-timeout) & wait",
            dir.path(),
            Some(Duration::from_millis(200)),
        )
        .unwrap();
        assert!(out.timed_out);
        std::thread::sleep(Duration::from_millis(1500));
        assert!(!dir.path().join("after-timeout").exists());
    }

    #[test]
    fn subshell_without_timeout_completes() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = run_shell_command("(touch inner; echo ran)", dir.path(), None).unwrap();
        assert!(out.success());
        assert!(dir.path().join("inner").exists());
    }

    #[test]
    fn missing_cwd_is_spawn_error() {
        let err = run_shell_command("true", Path::new("/definitely/not/here"), None).unwrap_err();
        assert!(matches!(err, PrflowError::ShellSpawn(_)));
    }
}
