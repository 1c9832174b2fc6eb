// src/explorer/mod.rs

//! Orchestration layer for gulptree.
//!
//! This module ties together:
//! - build-file discovery
//! - the runner backend
//! - the node tree and the single selection cursor
//! - the main event loop that reacts to:
//!   - host commands (select / activate / execute / terminate / restart /
//!     refresh)
//!   - task settle events from spawned runs
//!   - shutdown signals
//!
//! The loop itself lives in [`orchestrator`].

use tokio::sync::oneshot;

use crate::proc::TaskOutcome;
use crate::tree::NodeId;

/// External command surface exposed to the host shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerCommand {
    /// Track the given node as the selection; anything but a task node
    /// clears it.
    Select(NodeId),
    /// Select the given node and immediately execute it (the explicit
    /// two-step replacement for double-click detection).
    Activate(NodeId),
    /// Execute the selected task, if idle.
    Execute,
    /// Terminate the selected task, if running.
    Terminate,
    /// Terminate-then-execute the selected task; plain execute when idle.
    Restart,
    /// Rebuild the tree from discovery.
    Refresh,
}

/// Events flowing into the explorer loop from the host and from spawned
/// task runs.
#[derive(Debug)]
pub enum ExplorerEvent {
    Command(ExplorerCommand),
    /// A task's run future settled with the given outcome.
    TaskSettled { node: NodeId, outcome: TaskOutcome },
    /// Reply with a snapshot of the current state.
    Snapshot(oneshot::Sender<ExplorerSnapshot>),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Command-availability flags published after every state transition.
///
/// These are the only signal exposed to the command-enablement
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandFlags {
    pub can_execute: bool,
    pub can_terminate: bool,
    pub can_restart: bool,
}

/// Collaborator receiving flag updates after every transition.
pub trait FlagPublisher: Send {
    fn publish(&mut self, flags: CommandFlags);
}

/// Change-notification observer invoked synchronously after every state
/// transition, with the node the transition touched (if any).
pub type ChangeHandler = Box<dyn FnMut(Option<&NodeId>) + Send>;

/// Point-in-time view of the explorer state, for hosts and tests.
#[derive(Debug, Clone)]
pub struct ExplorerSnapshot {
    pub selected: Option<NodeId>,
    pub flags: CommandFlags,
    /// All task node ids in display order.
    pub task_ids: Vec<NodeId>,
    /// Rendered tree text.
    pub rendered: String,
}

pub mod orchestrator;

pub use orchestrator::{Explorer, request_snapshot};
