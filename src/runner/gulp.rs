// src/runner/gulp.rs

//! Real gulp runner backend.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use regex::{Regex, RegexBuilder};
use tracing::{debug, info, trace, warn};

use crate::config::ToolSection;
use crate::discover::DiscoveredFile;
use crate::errors::{GulptreeError, Result};
use crate::proc::{
    LineSink, ProcessError, ProcessHandle, Task, TaskOutcome, TaskRun, Terminator,
};
use crate::runner::RunnerBackend;

/// A resolved gulp installation.
#[derive(Debug, Clone)]
struct GulpInstall {
    /// Program prefix for command lines (`gulp`, or the quoted path to the
    /// project-local binary).
    program: String,
    /// Human-readable context: install scope plus reported version lines.
    context: Vec<String>,
}

impl GulpInstall {
    fn new(program: impl Into<String>, scope: &str, versions: Vec<String>) -> Self {
        let mut context = vec![format!("Scope: {scope}")];
        context.extend(versions);
        Self {
            program: program.into(),
            context,
        }
    }
}

/// Production [`RunnerBackend`] that shells out to the gulp CLI.
#[derive(Debug)]
pub struct GulpRunner {
    root: PathBuf,
    extra_args: Vec<String>,
    extra_paths: Vec<String>,
    failure_marker: Option<Regex>,
    install: Option<GulpInstall>,
}

impl GulpRunner {
    pub fn new(root: PathBuf, tool: &ToolSection) -> Result<Self> {
        let failure_marker = compile_marker(&tool.failure_marker)?;

        Ok(Self {
            root,
            extra_args: tool.args.clone(),
            extra_paths: tool.extra_paths.clone(),
            failure_marker,
            install: None,
        })
    }

    /// Context lines (scope + versions) of the resolved installation.
    pub fn tool_context(&self) -> Option<&[String]> {
        self.install.as_ref().map(|i| i.context.as_slice())
    }

    /// Find a gulp installation that responds to `--version`.
    ///
    /// A global install is preferred; the project-local binary under
    /// `node_modules/.bin` is the fallback.
    async fn resolve_install(&self) -> Result<GulpInstall> {
        match self.probe("gulp").await {
            Ok(versions) => return Ok(GulpInstall::new("gulp", "Global", versions)),
            Err(err) => debug!(error = %err, "no global gulp install"),
        }

        let local = self.root.join("node_modules").join(".bin").join("gulp");
        let program = format!("\"{}\"", local.display());

        match self.probe(&program).await {
            Ok(versions) => Ok(GulpInstall::new(program, "Local", versions)),
            Err(err) => Err(GulptreeError::ToolUnavailable(format!(
                "no global or local gulp responded to --version ({err})"
            ))),
        }
    }

    async fn probe(&self, program: &str) -> anyhow::Result<Vec<String>> {
        let sink: LineSink = Arc::new(|line: &str| trace!(line = %line, "gulp --version"));
        let handle = ProcessHandle::new(
            format!("{program} --version"),
            self.root.clone(),
            self.extra_paths.clone(),
            sink,
        );

        let output = handle.execute().await?;
        Ok(sanitize_lines(&output.stdout))
    }
}

impl RunnerBackend for GulpRunner {
    fn ensure_tool(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.install.is_some() {
                return Ok(());
            }

            let install = self.resolve_install().await?;
            info!(context = ?install.context, "resolved gulp install");
            self.install = Some(install);
            Ok(())
        })
    }

    fn list_tasks<'a>(
        &'a self,
        file: &DiscoveredFile,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
        let file = file.clone();

        Box::pin(async move {
            let install = self.install.as_ref().ok_or_else(|| {
                GulptreeError::ToolUnavailable("gulp install has not been resolved".to_string())
            })?;

            let command = list_command(&install.program, &self.root, &file.absolute_path);
            let sink: LineSink = Arc::new(|line: &str| trace!(line = %line, "gulp --tasks-simple"));
            let handle =
                ProcessHandle::new(command, self.root.clone(), self.extra_paths.clone(), sink);

            match handle.execute().await {
                Ok(output) => Ok(sanitize_lines(&output.stdout)),
                Err(err @ ProcessError::Spawn { .. }) => {
                    Err(GulptreeError::ToolUnavailable(err.to_string()))
                }
                Err(err) => Err(GulptreeError::DiscoveryFailed {
                    file: file.relative_path.clone(),
                    reason: err.to_string(),
                }),
            }
        })
    }

    fn create_task(&self, name: &str, file: &DiscoveredFile, sink: LineSink) -> Task {
        let program = self
            .install
            .as_ref()
            .map(|i| i.program.clone())
            .unwrap_or_else(|| "gulp".to_string());
        let command = task_command(
            &program,
            name,
            &self.root,
            &file.absolute_path,
            &self.extra_args,
        );
        let cwd = self.root.clone();
        let extra_paths = self.extra_paths.clone();
        let marker = self.failure_marker.clone();
        let task_name = name.to_string();
        let file_rel = file.relative_path.clone();

        Task::new(move || {
            command_run(
                &command,
                &cwd,
                extra_paths.clone(),
                marker.clone(),
                sink.clone(),
                &task_name,
                &file_rel,
            )
        })
    }
}

/// Build one prepared run for a shell command: a process handle wired to the
/// sanitizing/marker-scanning sink, an outcome-classifying run future, and
/// the matching terminator.
pub fn command_run(
    command: &str,
    cwd: &Path,
    extra_paths: Vec<String>,
    marker: Option<Regex>,
    sink: LineSink,
    task_name: &str,
    file_rel: &str,
) -> TaskRun {
    let (line_sink, marker_hit) = marker_scanner(marker, sink);
    let handle = ProcessHandle::new(command, cwd, extra_paths, line_sink);

    let run_handle = handle.clone();
    let task_name = task_name.to_string();
    let file_rel = file_rel.to_string();
    let run = Box::pin(async move {
        // The marker flag wins over a clean exit: gulp reports nested task
        // failures on stdout while still exiting 0.
        match run_handle.execute().await {
            Ok(_) if marker_hit.load(Ordering::SeqCst) => {
                let err = GulptreeError::TaskExecutionFailed {
                    task: task_name,
                    file: file_rel,
                };
                warn!(error = %err, "in-band failure marker observed");
                TaskOutcome::Failed(0)
            }
            Ok(_) => TaskOutcome::Success,
            Err(ProcessError::Terminated) => TaskOutcome::Terminated,
            Err(ProcessError::NonZeroExit { code, .. }) => {
                let err = GulptreeError::TaskExecutionFailed {
                    task: task_name,
                    file: file_rel,
                };
                warn!(error = %err, exit_code = code, "task process failed");
                TaskOutcome::Failed(code)
            }
            Err(err) => {
                warn!(error = %err, "task process failed to start");
                TaskOutcome::Failed(-1)
            }
        }
    });

    let terminator: Terminator =
        Box::new(move || Box::pin(async move { handle.terminate().await }));

    TaskRun { run, terminator }
}

/// Wrap `sink` so every raw line is sanitized before delivery and scanned
/// for the failure marker. Returns the wrapped sink and the hit flag.
pub fn marker_scanner(marker: Option<Regex>, sink: LineSink) -> (LineSink, Arc<AtomicBool>) {
    let hit = Arc::new(AtomicBool::new(false));
    let flag = hit.clone();

    let wrapped: LineSink = Arc::new(move |raw: &str| {
        let Some(line) = sanitize_line(raw) else { return };

        if let Some(marker) = &marker {
            if marker.is_match(&line) {
                flag.store(true, Ordering::SeqCst);
            }
        }

        sink(&line);
    });

    (wrapped, hit)
}

/// Command line for running a single task.
pub fn task_command(
    program: &str,
    task: &str,
    root: &Path,
    gulpfile: &Path,
    extra_args: &[String],
) -> String {
    let mut command = format!(
        "{program} {task} --cwd \"{}\" --gulpfile \"{}\"",
        root.display(),
        gulpfile.display()
    );

    for arg in extra_args {
        command.push(' ');
        command.push_str(arg);
    }

    command
}

/// Command line for enumerating task names, one per output line.
pub fn list_command(program: &str, root: &Path, gulpfile: &Path) -> String {
    format!(
        "{program} --tasks-simple --cwd \"{}\" --gulpfile \"{}\"",
        root.display(),
        gulpfile.display()
    )
}

/// Strip a leading `[timestamp]`-style prefix and surrounding whitespace.
///
/// Returns `None` for lines that end up empty.
pub fn sanitize_line(line: &str) -> Option<String> {
    let mut line = line;

    if line.starts_with('[') {
        if let Some(end) = line.find(']') {
            line = &line[end + 1..];
        }
    }

    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// Split captured output into sanitized, non-empty lines.
pub fn sanitize_lines(output: &str) -> Vec<String> {
    output.lines().filter_map(sanitize_line).collect()
}

fn compile_marker(marker: &str) -> Result<Option<Regex>> {
    if marker.is_empty() {
        return Ok(None);
    }

    RegexBuilder::new(marker)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|err| {
            GulptreeError::ConfigError(format!("invalid failure marker '{marker}': {err}"))
        })
}
