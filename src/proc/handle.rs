// src/proc/handle.rs

//! One-shot wrapper around a single external process invocation.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

/// Sink receiving each output line from a running process, in arrival order.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Captured output of a cleanly exited process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("failed waiting for process: {source}")]
    Wait { source: std::io::Error },

    #[error("process exited with code {code}")]
    NonZeroExit {
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// The process was killed through [`ProcessHandle::terminate`].
    #[error("process was terminated")]
    Terminated,
}

enum HandleState {
    Idle,
    Running {
        kill: Option<oneshot::Sender<()>>,
        exited: watch::Receiver<bool>,
    },
    /// Terminated before the process was spawned; `execute` must not spawn.
    Cancelled,
    Done,
}

/// Handle onto at most one spawned OS process.
///
/// The command string runs through the platform shell with the configured
/// working directory; every stdout/stderr line is forwarded to the sink as
/// it arrives. Handles are cheaply clonable so a run future and a
/// termination future can reference the same process.
///
/// A handle is one-shot: `execute` spawns at most one process over the
/// handle's lifetime, and re-invoking it while a process is live (or after
/// it finished) resolves immediately without spawning again.
#[derive(Clone)]
pub struct ProcessHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    command: String,
    cwd: PathBuf,
    extra_paths: Vec<String>,
    sink: LineSink,
    state: Mutex<HandleState>,
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("command", &self.inner.command)
            .field("cwd", &self.inner.cwd)
            .finish_non_exhaustive()
    }
}

impl ProcessHandle {
    pub fn new(
        command: impl Into<String>,
        cwd: impl Into<PathBuf>,
        extra_paths: Vec<String>,
        sink: LineSink,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                command: command.into(),
                cwd: cwd.into(),
                extra_paths,
                sink,
                state: Mutex::new(HandleState::Idle),
            }),
        }
    }

    pub fn command(&self) -> &str {
        &self.inner.command
    }

    /// Spawn the process and wait for it to settle.
    ///
    /// Resolves with the captured stdout on clean exit; fails with the
    /// captured stderr (and partial stdout) on non-zero exit, with
    /// [`ProcessError::Terminated`] when killed through [`terminate`], and
    /// with [`ProcessError::Spawn`] when the command cannot start at all.
    ///
    /// [`terminate`]: ProcessHandle::terminate
    pub async fn execute(&self) -> Result<ProcessOutput, ProcessError> {
        let (kill_rx, exited_tx) = {
            let mut state = self.inner.state.lock().unwrap();
            match *state {
                // Start-once: never spawn a second process from one handle.
                HandleState::Running { .. } | HandleState::Done => {
                    return Ok(ProcessOutput::default());
                }
                // Terminated before the spawn: stay dead.
                HandleState::Cancelled => return Err(ProcessError::Terminated),
                HandleState::Idle => {}
            }

            let (kill_tx, kill_rx) = oneshot::channel();
            let (exited_tx, exited_rx) = watch::channel(false);
            *state = HandleState::Running {
                kill: Some(kill_tx),
                exited: exited_rx,
            };
            (kill_rx, exited_tx)
        };

        let result = self.run_child(kill_rx).await;

        {
            let mut state = self.inner.state.lock().unwrap();
            *state = HandleState::Done;
        }
        let _ = exited_tx.send(true);

        result
    }

    async fn run_child(
        &self,
        mut kill_rx: oneshot::Receiver<()>,
    ) -> Result<ProcessOutput, ProcessError> {
        debug!(
            command = %self.inner.command,
            cwd = %self.inner.cwd.display(),
            "starting process"
        );

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.inner.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.inner.command);
            c
        };

        cmd.current_dir(&self.inner.cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(path) = merged_path(&self.inner.extra_paths) {
            cmd.env("PATH", path);
        }

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: self.inner.command.clone(),
            source,
        })?;

        // Forward both streams to the sink as lines arrive, collecting them
        // for the final result.
        let stdout_lines = spawn_line_reader(child.stdout.take(), self.inner.sink.clone());
        let stderr_lines = spawn_line_reader(child.stderr.take(), self.inner.sink.clone());

        // Either the process exits on its own (normal case), or we receive a
        // termination request and kill it.
        tokio::select! {
            status_res = child.wait() => {
                let status = status_res.map_err(|source| ProcessError::Wait { source })?;

                let stdout = stdout_lines.await.unwrap_or_default();
                let stderr = stderr_lines.await.unwrap_or_default();
                let code = status.code().unwrap_or(-1);

                debug!(
                    command = %self.inner.command,
                    exit_code = code,
                    success = status.success(),
                    "process exited"
                );

                if status.success() {
                    Ok(ProcessOutput { stdout })
                } else {
                    Err(ProcessError::NonZeroExit { code, stdout, stderr })
                }
            }

            _ = &mut kill_rx => {
                debug!(command = %self.inner.command, "termination requested; killing process");
                if let Err(e) = child.kill().await {
                    warn!(
                        command = %self.inner.command,
                        error = %e,
                        "failed to kill child process"
                    );
                }
                Err(ProcessError::Terminated)
            }
        }
    }

    /// Kill the process if and only if one is running, and wait for its exit
    /// to be observed. Resolves immediately when nothing is running.
    ///
    /// Terminating a handle that has not spawned yet latches it dead: a
    /// later `execute` settles with [`ProcessError::Terminated`] instead of
    /// starting the process. Only the first caller issues the kill;
    /// concurrent callers wait for the same exit.
    pub async fn terminate(&self) {
        let (kill, mut exited) = {
            let mut state = self.inner.state.lock().unwrap();
            match &mut *state {
                HandleState::Idle => {
                    *state = HandleState::Cancelled;
                    return;
                }
                HandleState::Cancelled | HandleState::Done => return,
                HandleState::Running { kill, exited } => (kill.take(), exited.clone()),
            }
        };

        if let Some(kill) = kill {
            let _ = kill.send(());
        }

        while !*exited.borrow() {
            if exited.changed().await.is_err() {
                break;
            }
        }
    }

    /// Whether a process is currently live.
    pub fn is_running(&self) -> bool {
        matches!(
            *self.inner.state.lock().unwrap(),
            HandleState::Running { .. }
        )
    }
}

/// Read a child stream line by line, feeding the sink and collecting the
/// full text for the process result.
fn spawn_line_reader<R>(stream: Option<R>, sink: LineSink) -> tokio::task::JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut collected = String::new();
        let Some(stream) = stream else {
            return collected;
        };

        let reader = BufReader::new(stream);
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            sink(&line);
            collected.push_str(&line);
            collected.push('\n');
        }

        collected
    })
}

/// Merge configured extra directories into the inherited `PATH`.
fn merged_path(extra: &[String]) -> Option<String> {
    if extra.is_empty() {
        return None;
    }

    let delimiter = if cfg!(windows) { ";" } else { ":" };
    let current = std::env::var("PATH").unwrap_or_default();

    let mut parts: Vec<String> = current
        .split(delimiter)
        .map(str::to_string)
        .chain(extra.iter().cloned())
        .filter(|p| !p.is_empty())
        .collect();
    parts.dedup();

    Some(parts.join(delimiter))
}
