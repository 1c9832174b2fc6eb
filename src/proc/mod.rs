// src/proc/mod.rs

//! Process lifecycle layer.
//!
//! - [`handle`] wraps exactly one external OS process invocation.
//! - [`task`] provides the single-flight execution wrapper around a
//!   process-producing factory.

pub mod handle;
pub mod task;

pub use handle::{LineSink, ProcessError, ProcessHandle, ProcessOutput};
pub use task::{BoxFuture, Task, TaskOutcome, TaskRun, Terminator};
