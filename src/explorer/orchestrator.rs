// src/explorer/orchestrator.rs

//! The explorer event loop.
//!
//! All user-visible transitions are serialized through one mpsc channel:
//! host commands and the settle events posted by spawned task runs. The
//! loop never blocks on a running process; execution and termination happen
//! in spawned futures whose only effect is a later `TaskSettled` event.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::discover::{FileMatcher, find_build_files};
use crate::errors::{GulptreeError, Result};
use crate::fs::FileSystem;
use crate::output::{Logger, OutputCategory};
use crate::proc::{LineSink, TaskOutcome};
use crate::runner::RunnerBackend;
use crate::tree::{self, FileNode, NodeId, RootNode, TaskNode};
use crate::config::NotificationSettings;

use super::{
    ChangeHandler, CommandFlags, ExplorerCommand, ExplorerEvent, ExplorerSnapshot, FlagPublisher,
};

/// Orchestrator owning the current tree, the selection and the
/// command-availability flags.
///
/// Driven by [`Explorer::run`]; hosts interact only through the event
/// sender and the observer hooks.
pub struct Explorer<R: RunnerBackend> {
    runner: R,
    fs: Arc<dyn FileSystem>,
    matcher: FileMatcher,
    root_dir: PathBuf,
    logger: Logger,
    notifications: NotificationSettings,

    root: RootNode,
    selected: Option<NodeId>,
    /// Leaf waiting to re-execute once its terminated run settles. Pinned at
    /// restart time so the selection may change mid-restart without
    /// redirecting the re-execution.
    pending_restart: Option<NodeId>,
    flags: CommandFlags,

    flag_publisher: Option<Box<dyn FlagPublisher>>,
    change_handlers: Vec<ChangeHandler>,

    events_tx: mpsc::Sender<ExplorerEvent>,
    events_rx: mpsc::Receiver<ExplorerEvent>,
}

impl<R: RunnerBackend> fmt::Debug for Explorer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explorer")
            .field("root_dir", &self.root_dir)
            .field("selected", &self.selected)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl<R: RunnerBackend> Explorer<R> {
    pub fn new(
        runner: R,
        fs: Arc<dyn FileSystem>,
        matcher: FileMatcher,
        root_dir: PathBuf,
        logger: Logger,
        notifications: NotificationSettings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel::<ExplorerEvent>(64);

        Self {
            runner,
            fs,
            matcher,
            root_dir,
            logger,
            notifications,
            root: RootNode::empty(),
            selected: None,
            pending_restart: None,
            flags: CommandFlags::default(),
            flag_publisher: None,
            change_handlers: Vec::new(),
            events_tx,
            events_rx,
        }
    }

    /// Sender for feeding commands and events into the loop.
    pub fn sender(&self) -> mpsc::Sender<ExplorerEvent> {
        self.events_tx.clone()
    }

    /// Register a change-notification observer.
    pub fn on_change(&mut self, handler: ChangeHandler) {
        self.change_handlers.push(handler);
    }

    /// Attach the command-enablement collaborator.
    pub fn set_flag_publisher(&mut self, publisher: Box<dyn FlagPublisher>) {
        self.flag_publisher = Some(publisher);
    }

    /// Main event loop.
    ///
    /// Consumes events until shutdown or until every sender is gone, then
    /// disposes the tree so no process is leaked.
    pub async fn run(mut self) -> Result<()> {
        info!("explorer loop started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "explorer received event");

            match event {
                ExplorerEvent::Command(command) => self.handle_command(command).await,
                ExplorerEvent::TaskSettled { node, outcome } => {
                    self.handle_settled(node, outcome)
                }
                ExplorerEvent::Snapshot(reply) => self.handle_snapshot(reply),
                ExplorerEvent::ShutdownRequested => {
                    info!("shutdown requested; stopping explorer loop");
                    break;
                }
            }
        }

        // Release any live task before exiting.
        let root = std::mem::replace(&mut self.root, RootNode::empty());
        root.dispose().await;

        info!("explorer loop exiting");
        Ok(())
    }

    async fn handle_command(&mut self, command: ExplorerCommand) {
        match command {
            ExplorerCommand::Select(id) => self.select(id),
            ExplorerCommand::Activate(id) => {
                self.select(id);
                self.execute_selected();
            }
            ExplorerCommand::Execute => self.execute_selected(),
            ExplorerCommand::Terminate => self.terminate_selected(),
            ExplorerCommand::Restart => self.restart_selected(),
            ExplorerCommand::Refresh => self.refresh().await,
        }
    }

    /// Track the node as the selection when it is a task leaf; clear it
    /// otherwise. No process side effects.
    fn select(&mut self, id: NodeId) {
        self.selected = if self.root.contains_task(&id) {
            Some(id)
        } else {
            None
        };

        self.update(self.selected.clone());
    }

    fn execute_selected(&mut self) {
        let Some(id) = self.selected.clone() else {
            return;
        };
        self.execute_node(id);
    }

    /// Start the given leaf's task, unless one is already in flight.
    ///
    /// Used both by the execute command (on the selection) and by the
    /// restart continuation (on the pinned leaf).
    fn execute_node(&mut self, id: NodeId) {
        let Some(leaf) = self.root.find_task(&id) else {
            return;
        };
        if leaf.task().is_some_and(|task| task.is_running()) {
            return;
        }

        let name = leaf.name().to_string();
        let file = leaf.file().clone();

        self.logger
            .output
            .log_with(&format!("> {name}: STARTED"), OutputCategory::Start);

        // Stream sanitized process output into the channel as progress
        // lines.
        let channel = self.logger.output.clone();
        let sink_name = name.clone();
        let sink: LineSink = Arc::new(move |line: &str| {
            channel.log_with(&format!("> {sink_name}: {line}"), OutputCategory::Progress);
        });

        let task = self.runner.create_task(&name, &file, sink);

        // Claim the single flight synchronously: the task is Running before
        // any later terminate command can be processed.
        let Some(run) = task.begin() else {
            return;
        };

        if let Some(leaf) = self.root.find_task_mut(&id) {
            leaf.set_task(Some(task));
        }
        self.update(Some(id.clone()));

        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = run.await;
            let _ = events
                .send(ExplorerEvent::TaskSettled { node: id, outcome })
                .await;
        });
    }

    fn terminate_selected(&mut self) {
        let Some(id) = self.selected.clone() else {
            return;
        };
        let Some(task) = self.root.find_task(&id).and_then(|leaf| leaf.task()) else {
            return;
        };

        // The running execute future settles with `Terminated`; all cleanup
        // happens on that settle event.
        let task = task.clone();
        tokio::spawn(async move { task.terminate().await });
    }

    fn restart_selected(&mut self) {
        let Some(id) = self.selected.clone() else {
            return;
        };
        let Some(leaf) = self.root.find_task(&id) else {
            return;
        };

        match leaf.task() {
            // Nothing running: restart behaves as a plain execute.
            None => self.execute_node(id),
            Some(task) => {
                let name = leaf.name().to_string();
                self.logger.output.log(&format!("> {name}: RESTARTING"));

                // Pin the leaf for re-execution; the settle handler picks it
                // up regardless of where the selection moves meanwhile.
                self.pending_restart = Some(id);

                let task = task.clone();
                tokio::spawn(async move { task.terminate().await });
            }
        }
    }

    /// Handle a settled run: clear the leaf, report the outcome and drive a
    /// pending restart.
    fn handle_settled(&mut self, node: NodeId, outcome: TaskOutcome) {
        let Some(leaf) = self.root.find_task(&node) else {
            debug!(node = %node, "settle event for a node no longer in the tree");
            return;
        };
        match leaf.task() {
            None => {
                debug!(node = %node, "stale settle event; leaf already cleared");
                return;
            }
            // A newer run owns the leaf; this settle belongs to a superseded
            // task instance.
            Some(task) if task.is_running() => {
                debug!(node = %node, "settle event for a superseded run");
                return;
            }
            Some(_) => {}
        }

        let name = leaf.name().to_string();
        if let Some(leaf) = self.root.find_task_mut(&node) {
            leaf.set_task(None);
        }

        let restarting = self.pending_restart.as_deref() == Some(node.as_str());
        if restarting {
            self.pending_restart = None;
        }

        match outcome {
            TaskOutcome::Success => {
                self.logger
                    .output
                    .log_with(&format!("> {name}: COMPLETED"), OutputCategory::Complete);

                if !restarting && self.notifications.executed {
                    self.logger
                        .alert
                        .info(&format!("The task '{name}' has completed successfully."));
                }
            }
            TaskOutcome::Failed(_) => {
                self.logger
                    .output
                    .log_with(&format!("> {name}: FAILED"), OutputCategory::Error);
                self.logger
                    .alert
                    .error(&format!("The task '{name}' has failed."));
            }
            TaskOutcome::Terminated if !restarting => {
                self.logger.output.log(&format!("> {name}: TERMINATED"));

                if self.notifications.terminated {
                    self.logger
                        .alert
                        .info(&format!("The task '{name}' has been terminated."));
                }
            }
            TaskOutcome::Terminated => {}
        }

        if restarting {
            if self.notifications.restarted {
                self.logger
                    .alert
                    .info(&format!("The task '{name}' has been restarted."));
            }

            // Terminate-then-execute: the re-execution happens only now,
            // after the terminated run has settled, and targets the pinned
            // leaf rather than the current selection.
            self.execute_node(node);
            return;
        }

        self.update(Some(node));
    }

    /// Rebuild the tree from discovery and re-validate the selection.
    async fn refresh(&mut self) {
        // Restart intents don't survive a rebuild.
        self.pending_restart = None;

        // Dispose before rebuilding to ensure node resources are released
        // and no process survives the old tree.
        let old = std::mem::replace(&mut self.root, RootNode::empty());
        old.dispose().await;

        self.logger.output.log("Loading gulp tasks...");

        match self.load_files().await {
            Ok(root) => {
                self.root = root;

                if self.root.is_empty() {
                    self.logger.output.log("> No gulp files found");
                } else {
                    self.logger.output.log("Let's get gulping...");
                }
            }
            Err(err) => {
                let message = err.to_string();
                self.logger.error(&message);
                self.root = RootNode::diagnostic(message);
            }
        }

        // Stale-selection guard: keep the selection only when the same
        // (file, task) pair exists in the new tree.
        if let Some(id) = &self.selected {
            if !self.root.contains_task(id) {
                self.selected = None;
            }
        }

        self.update(self.selected.clone());
    }

    /// Discover build files and list their tasks.
    ///
    /// A per-file listing failure is reported and yields that file with no
    /// tasks; only tool unavailability or a discovery error aborts the
    /// whole load.
    async fn load_files(&mut self) -> Result<RootNode> {
        self.runner.ensure_tool().await?;

        let files = find_build_files(self.fs.as_ref(), &self.root_dir, &self.matcher)
            .map_err(GulptreeError::Other)?;

        let mut nodes = Vec::new();
        for file in files {
            let tasks = match self.runner.list_tasks(&file).await {
                Ok(tasks) => tasks,
                Err(err @ GulptreeError::ToolUnavailable(_)) => return Err(err),
                Err(err) => {
                    self.logger.error(&err.to_string());
                    Vec::new()
                }
            };

            self.logger
                .output
                .log(&format!("> {} [{}]", file.relative_path, tasks.join(",")));

            let file_id = file.node_id();
            let leaves = tasks
                .iter()
                .map(|name| TaskNode::new(&file_id, name, file.clone()))
                .collect();

            nodes.push(FileNode::new(file, leaves));
        }

        Ok(RootNode::new(nodes))
    }

    fn handle_snapshot(&self, reply: oneshot::Sender<ExplorerSnapshot>) {
        let _ = reply.send(ExplorerSnapshot {
            selected: self.selected.clone(),
            flags: self.flags,
            task_ids: self.root.task_ids(),
            rendered: tree::render(&self.root),
        });
    }

    /// Recompute the command flags from the selection, publish them and
    /// notify the change observers.
    fn update(&mut self, node: Option<NodeId>) {
        let executing = self
            .selected
            .as_ref()
            .and_then(|id| self.root.find_task(id))
            .map(|leaf| leaf.executing());

        self.flags = match executing {
            Some(executing) => CommandFlags {
                can_execute: !executing,
                can_terminate: executing,
                can_restart: executing,
            },
            None => CommandFlags::default(),
        };

        if let Some(publisher) = &mut self.flag_publisher {
            publisher.publish(self.flags);
        }

        for handler in self.change_handlers.iter_mut() {
            handler(node.as_ref());
        }
    }
}

/// Ask a running explorer for a state snapshot.
pub async fn request_snapshot(
    events: &mpsc::Sender<ExplorerEvent>,
) -> Result<ExplorerSnapshot> {
    let (tx, rx) = oneshot::channel();

    events
        .send(ExplorerEvent::Snapshot(tx))
        .await
        .map_err(|_| GulptreeError::Other(anyhow!("explorer loop is not running")))?;

    rx.await
        .map_err(|_| GulptreeError::Other(anyhow!("explorer loop dropped the snapshot request")))
}
