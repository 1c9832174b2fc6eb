// src/runner/mod.rs

//! Gulp invocation layer.
//!
//! The explorer talks to a [`RunnerBackend`] instead of invoking gulp
//! directly. This makes it easy to swap in a fake runner in tests while
//! keeping the production implementation in [`gulp`].
//!
//! - [`gulp::GulpRunner`] is the real backend: it resolves the gulp
//!   installation, enumerates tasks with `--tasks-simple` and builds the
//!   shell command for a task run.
//! - Tests can provide their own `RunnerBackend` that, for example, scripts
//!   task lists per file and completes runs on demand.

pub mod gulp;

use std::future::Future;
use std::pin::Pin;

use crate::discover::DiscoveredFile;
use crate::errors::Result;
use crate::proc::{LineSink, Task};

/// Trait abstracting how build files are interrogated and tasks are built.
pub trait RunnerBackend: Send {
    /// Locate the external tool once per refresh.
    ///
    /// Fails with `ToolUnavailable` when the tool cannot be invoked at all;
    /// a refresh treats that as fatal.
    fn ensure_tool(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Enumerate the task names defined by the given build file.
    fn list_tasks<'a>(
        &'a self,
        file: &DiscoveredFile,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;

    /// Build a single-flight [`Task`] around the invocation of `name`,
    /// streaming sanitized output lines to `sink`.
    fn create_task(&self, name: &str, file: &DiscoveredFile, sink: LineSink) -> Task;
}

pub use gulp::{
    GulpRunner, command_run, list_command, marker_scanner, sanitize_line, sanitize_lines,
    task_command,
};
