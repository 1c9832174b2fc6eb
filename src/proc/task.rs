// src/proc/task.rs

//! Single-flight execution wrapper.
//!
//! A [`Task`] guards a process-producing factory so that at most one run is
//! in flight at a time: a duplicate `execute` attaches to the pending run
//! instead of starting a second one, and concurrent `terminate` calls
//! perform a single underlying kill.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

/// Boxed future used by run factories and terminators.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// One-shot termination action retained while a run is in flight.
pub type Terminator = Box<dyn FnOnce() -> BoxFuture<()> + Send>;

/// Outcome of a settled task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(i32),
    /// The run was stopped through [`Task::terminate`]; not a failure.
    Terminated,
}

/// A single prepared run: the future that drives the process to completion
/// and the terminator that stops it early.
pub struct TaskRun {
    pub run: BoxFuture<TaskOutcome>,
    pub terminator: Terminator,
}

type RunFactory = Box<dyn Fn() -> TaskRun + Send + Sync>;

enum TaskState {
    Idle,
    Running {
        terminator: Option<Terminator>,
        settled: watch::Receiver<bool>,
    },
}

/// Single-flight execution wrapper around a run factory.
///
/// State machine: Idle → Running → Idle; success, failure and termination
/// all return to Idle. Tasks are cheaply clonable handles onto shared state
/// so an event loop can run and terminate them from independently spawned
/// futures.
#[derive(Clone)]
pub struct Task {
    inner: Arc<TaskInner>,
}

struct TaskInner {
    factory: RunFactory,
    state: Mutex<TaskState>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Task {
    pub fn new(factory: impl Fn() -> TaskRun + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                factory: Box::new(factory),
                state: Mutex::new(TaskState::Idle),
            }),
        }
    }

    /// Synchronously claim the single flight and prepare one run.
    ///
    /// If the task is Idle, the factory is invoked, the state moves to
    /// Running **before** this returns, and the returned future drives the
    /// run to its outcome. If a run is already in flight, `None` is
    /// returned — the factory is not invoked and no second process is
    /// spawned. The synchronous transition means a terminate issued right
    /// after `begin` can never miss the run.
    pub fn begin(&self) -> Option<BoxFuture<TaskOutcome>> {
        let (run, settled_tx) = {
            let mut state = self.inner.state.lock().unwrap();
            if let TaskState::Running { .. } = *state {
                return None;
            }

            let TaskRun { run, terminator } = (self.inner.factory)();
            let (settled_tx, settled_rx) = watch::channel(false);
            *state = TaskState::Running {
                terminator: Some(terminator),
                settled: settled_rx,
            };
            (run, settled_tx)
        };

        let inner = self.inner.clone();
        Some(Box::pin(async move {
            let outcome = run.await;

            {
                let mut state = inner.state.lock().unwrap();
                *state = TaskState::Idle;
            }
            let _ = settled_tx.send(true);

            outcome
        }))
    }

    /// Drive one run to completion.
    ///
    /// Convenience wrapper around [`begin`]: `Some(outcome)` once the run
    /// settles, `None` when a run was already in flight.
    ///
    /// [`begin`]: Task::begin
    pub async fn execute(&self) -> Option<TaskOutcome> {
        match self.begin() {
            Some(run) => Some(run.await),
            None => None,
        }
    }

    /// Stop the in-flight run, if any.
    ///
    /// Resolves immediately when Idle. When Running, the retained terminator
    /// is invoked at most once (later concurrent callers only wait), and the
    /// call resolves after the run has settled, so the task is Idle again
    /// once `terminate` returns.
    pub async fn terminate(&self) {
        let (terminator, mut settled) = {
            let mut state = self.inner.state.lock().unwrap();
            match &mut *state {
                TaskState::Idle => return,
                TaskState::Running {
                    terminator,
                    settled,
                } => (terminator.take(), settled.clone()),
            }
        };

        if let Some(terminator) = terminator {
            terminator().await;
        }

        while !*settled.borrow() {
            if settled.changed().await.is_err() {
                break;
            }
        }
    }

    /// Terminate with the result discarded; called when the owning node is
    /// removed from the tree so no process outlives a rebuild.
    pub async fn dispose(&self) {
        self.terminate().await;
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.inner.state.lock().unwrap(), TaskState::Running { .. })
    }
}
