use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use gulptree::discover::DiscoveredFile;
use gulptree::errors::{GulptreeError, Result};
use gulptree::proc::{LineSink, Task, TaskOutcome, TaskRun, Terminator};
use gulptree::runner::RunnerBackend;

/// Remote control for one created fake task.
///
/// The fake run waits until [`complete`] fires and settles with the
/// configured outcome, or with `Terminated` when the terminator fired
/// first.
///
/// [`complete`]: RunControl::complete
pub struct RunControl {
    finish: Notify,
    outcome: Mutex<TaskOutcome>,
    killed: AtomicBool,
    starts: AtomicUsize,
    kills: AtomicUsize,
    sink: Mutex<Option<LineSink>>,
}

impl RunControl {
    fn new(sink: LineSink) -> Self {
        Self {
            finish: Notify::new(),
            outcome: Mutex::new(TaskOutcome::Success),
            killed: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            kills: AtomicUsize::new(0),
            sink: Mutex::new(Some(sink)),
        }
    }

    /// Let the run settle with the given outcome.
    pub fn complete(&self, outcome: TaskOutcome) {
        *self.outcome.lock().unwrap() = outcome;
        self.finish.notify_one();
    }

    /// Push a raw output line through the task's sink.
    pub fn emit(&self, line: &str) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink(line);
        }
    }

    pub fn started(&self) -> bool {
        self.starts.load(Ordering::SeqCst) > 0
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    /// How many times the terminator actually fired.
    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

/// Build the controllable task for a control handle.
fn task_for_control(control: Arc<RunControl>) -> Task {
    Task::new(move || {
        control.starts.fetch_add(1, Ordering::SeqCst);

        let run_control = control.clone();
        let run: Pin<Box<dyn Future<Output = TaskOutcome> + Send>> = Box::pin(async move {
            run_control.finish.notified().await;
            if run_control.killed.load(Ordering::SeqCst) {
                TaskOutcome::Terminated
            } else {
                *run_control.outcome.lock().unwrap()
            }
        });

        let term_control = control.clone();
        let terminator: Terminator = Box::new(move || {
            Box::pin(async move {
                term_control.kills.fetch_add(1, Ordering::SeqCst);
                term_control.killed.store(true, Ordering::SeqCst);
                term_control.finish.notify_one();
            })
        });

        TaskRun { run, terminator }
    })
}

/// Standalone controllable task, not tied to a runner. Useful for exercising
/// the `Task` state machine and node disposal directly.
pub fn manual_task() -> (Task, Arc<RunControl>) {
    let control = Arc::new(RunControl::new(Arc::new(|_line: &str| {})));
    (task_for_control(control.clone()), control)
}

/// Shared observation handles for a [`FakeRunner`] that has been moved into
/// an explorer.
#[derive(Clone)]
pub struct FakeRunnerProbe {
    created: Arc<Mutex<Vec<String>>>,
    controls: Arc<Mutex<HashMap<String, Vec<Arc<RunControl>>>>>,
    tool_error: Arc<Mutex<Option<String>>>,
}

impl FakeRunnerProbe {
    /// Node ids for which tasks were created, in creation order.
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    /// The most recent control for the given node id.
    pub fn control(&self, node_id: &str) -> Option<Arc<RunControl>> {
        self.controls
            .lock()
            .unwrap()
            .get(node_id)
            .and_then(|controls| controls.last().cloned())
    }

    /// Every control ever created for the given node id.
    pub fn controls(&self, node_id: &str) -> Vec<Arc<RunControl>> {
        self.controls
            .lock()
            .unwrap()
            .get(node_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Make `ensure_tool` fail (or succeed again) on subsequent refreshes.
    pub fn set_tool_error(&self, message: Option<&str>) {
        *self.tool_error.lock().unwrap() = message.map(str::to_string);
    }

    /// Poll until `count` tasks have been created.
    pub async fn wait_for_created(&self, count: usize) {
        for _ in 0..200 {
            if self.created.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!(
            "timed out waiting for {count} created tasks (got {:?})",
            self.created()
        );
    }
}

/// A fake [`RunnerBackend`] with scripted task lists and controllable runs:
///
/// - `list_tasks` answers from a per-file script (or fails for files marked
///   as failing).
/// - `create_task` records the creation and hands out a [`RunControl`] so
///   the test decides when and how each run settles.
/// - No OS process is ever spawned.
pub struct FakeRunner {
    tasks: HashMap<String, Vec<String>>,
    failing_files: Vec<String>,
    tool_error: Arc<Mutex<Option<String>>>,
    created: Arc<Mutex<Vec<String>>>,
    controls: Arc<Mutex<HashMap<String, Vec<Arc<RunControl>>>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            failing_files: Vec::new(),
            tool_error: Arc::new(Mutex::new(None)),
            created: Arc::new(Mutex::new(Vec::new())),
            controls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Script the task list for a file (keyed by relative path).
    pub fn with_tasks(mut self, file: &str, tasks: &[&str]) -> Self {
        self.tasks
            .insert(file.to_string(), tasks.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Make `list_tasks` fail for the given relative path.
    pub fn with_failing_file(mut self, file: &str) -> Self {
        self.failing_files.push(file.to_string());
        self
    }

    /// Make `ensure_tool` fail, simulating a missing gulp install.
    pub fn without_tool(self, message: &str) -> Self {
        *self.tool_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn probe(&self) -> FakeRunnerProbe {
        FakeRunnerProbe {
            created: self.created.clone(),
            controls: self.controls.clone(),
            tool_error: self.tool_error.clone(),
        }
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerBackend for FakeRunner {
    fn ensure_tool(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let result = match self.tool_error.lock().unwrap().as_ref() {
            Some(message) => Err(GulptreeError::ToolUnavailable(message.clone())),
            None => Ok(()),
        };
        Box::pin(async move { result })
    }

    fn list_tasks<'a>(
        &'a self,
        file: &DiscoveredFile,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
        let rel = file.relative_path.clone();

        Box::pin(async move {
            if self.failing_files.contains(&rel) {
                return Err(GulptreeError::DiscoveryFailed {
                    file: rel,
                    reason: "scripted failure".to_string(),
                });
            }
            Ok(self.tasks.get(&rel).cloned().unwrap_or_default())
        })
    }

    fn create_task(&self, name: &str, file: &DiscoveredFile, sink: LineSink) -> Task {
        let node_id = format!("{}:{}", file.node_id(), name);
        self.created.lock().unwrap().push(node_id.clone());

        let control = Arc::new(RunControl::new(sink));
        self.controls
            .lock()
            .unwrap()
            .entry(node_id)
            .or_default()
            .push(control.clone());

        task_for_control(control)
    }
}
