// src/tree/mod.rs

//! Ownership tree mirroring discovered files and their tasks.
//!
//! The tree has a fixed depth: a root owning file groups owning task
//! leaves. Placeholder [`EmptyNode`]s are synthesized by `children()` when a
//! parent has nothing to show, and stand in for the whole tree after a
//! failed refresh. Each variant carries the shared capability surface
//! (`id`, `kind`, `children`, `dispose`); consumers dispatch on
//! [`NodeKind`], not on inheritance.
//!
//! Disposal is strictly top-down and consumes the tree, terminating any
//! live task so no process survives a rebuild.

use crate::discover::DiscoveredFile;
use crate::proc::Task;

/// Canonical node identifier type used throughout the explorer.
pub type NodeId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    File,
    Task,
    Empty,
}

/// Placeholder message node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyNode {
    id: NodeId,
    message: String,
}

impl EmptyNode {
    pub fn new(parent_id: &str, message: impl Into<String>) -> Self {
        Self {
            id: format!("{parent_id}::empty"),
            message: message.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Empty
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Leaf node for a single named task, optionally owning its live run.
#[derive(Debug)]
pub struct TaskNode {
    id: NodeId,
    name: String,
    file: DiscoveredFile,
    task: Option<Task>,
}

impl TaskNode {
    pub fn new(file_id: &str, name: impl Into<String>, file: DiscoveredFile) -> Self {
        let name = name.into();
        Self {
            id: format!("{file_id}:{name}"),
            name,
            file,
            task: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Task
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &DiscoveredFile {
        &self.file
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// Attach or clear the owned task; the visual state follows ownership.
    pub fn set_task(&mut self, task: Option<Task>) {
        self.task = task;
    }

    /// Whether the leaf currently owns a live run.
    pub fn executing(&self) -> bool {
        self.task.is_some()
    }

    pub async fn dispose(&mut self) {
        if let Some(task) = self.task.take() {
            task.dispose().await;
        }
    }
}

/// Group node for one discovered build file.
#[derive(Debug)]
pub struct FileNode {
    id: NodeId,
    file: DiscoveredFile,
    tasks: Vec<TaskNode>,
}

impl FileNode {
    pub fn new(file: DiscoveredFile, tasks: Vec<TaskNode>) -> Self {
        Self {
            id: file.node_id(),
            file,
            tasks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::File
    }

    pub fn file(&self) -> &DiscoveredFile {
        &self.file
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[TaskNode] {
        &self.tasks
    }

    /// Return either the task leaves or an empty message node.
    pub fn children(&self) -> Vec<ChildNode<'_>> {
        if self.is_empty() {
            return vec![ChildNode::Empty(EmptyNode::new(&self.id, "No gulp tasks"))];
        }

        self.tasks.iter().map(ChildNode::Task).collect()
    }

    pub async fn dispose(&mut self) {
        for task in self.tasks.iter_mut() {
            task.dispose().await;
        }
    }
}

/// Root of the tree, owning the ordered file groups.
#[derive(Debug, Default)]
pub struct RootNode {
    files: Vec<FileNode>,
    diagnostic: Option<String>,
}

impl RootNode {
    /// Build a root over the given file groups.
    ///
    /// Files sitting directly in the project root sort ahead of nested
    /// ones; within each group the order is lexicographic by relative path.
    pub fn new(mut files: Vec<FileNode>) -> Self {
        files.sort_by(|a, b| {
            let a_nested = !a.file.is_workspace_root();
            let b_nested = !b.file.is_workspace_root();
            a_nested
                .cmp(&b_nested)
                .then_with(|| a.file.relative_path.cmp(&b.file.relative_path))
        });

        Self {
            files,
            diagnostic: None,
        }
    }

    /// Fresh tree with no files.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tree consisting of a single diagnostic placeholder, used when a
    /// refresh fails outright.
    pub fn diagnostic(message: impl Into<String>) -> Self {
        Self {
            files: Vec::new(),
            diagnostic: Some(message.into()),
        }
    }

    pub fn id(&self) -> &str {
        "root"
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Root
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn diagnostic_message(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn files(&self) -> &[FileNode] {
        &self.files
    }

    /// Return the file groups, or a single placeholder when none exist.
    pub fn children(&self) -> Vec<ChildNode<'_>> {
        if self.files.is_empty() {
            let message = self.diagnostic.as_deref().unwrap_or("No gulp files found");
            return vec![ChildNode::Empty(EmptyNode::new(self.id(), message))];
        }

        self.files.iter().map(ChildNode::File).collect()
    }

    pub fn find_task(&self, id: &str) -> Option<&TaskNode> {
        self.files
            .iter()
            .flat_map(|file| file.tasks.iter())
            .find(|task| task.id() == id)
    }

    pub fn find_task_mut(&mut self, id: &str) -> Option<&mut TaskNode> {
        self.files
            .iter_mut()
            .flat_map(|file| file.tasks.iter_mut())
            .find(|task| task.id() == id)
    }

    pub fn contains_task(&self, id: &str) -> bool {
        self.find_task(id).is_some()
    }

    /// All task node ids, in display order.
    pub fn task_ids(&self) -> Vec<NodeId> {
        self.files
            .iter()
            .flat_map(|file| file.tasks.iter())
            .map(|task| task.id().to_string())
            .collect()
    }

    /// Dispose the whole tree, terminating any live task.
    ///
    /// Consuming `self` makes double disposal unrepresentable.
    pub async fn dispose(mut self) {
        for file in self.files.iter_mut() {
            file.dispose().await;
        }
    }
}

/// Borrowed child view returned by `children()`.
///
/// Placeholders are synthesized on the fly, so they are owned; real nodes
/// are borrowed from their parent.
#[derive(Debug)]
pub enum ChildNode<'a> {
    File(&'a FileNode),
    Task(&'a TaskNode),
    Empty(EmptyNode),
}

impl ChildNode<'_> {
    pub fn id(&self) -> &str {
        match self {
            ChildNode::File(node) => node.id(),
            ChildNode::Task(node) => node.id(),
            ChildNode::Empty(node) => node.id(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            ChildNode::File(_) => NodeKind::File,
            ChildNode::Task(_) => NodeKind::Task,
            ChildNode::Empty(_) => NodeKind::Empty,
        }
    }

    /// Display label: relative path for files, task name for tasks, message
    /// for placeholders.
    pub fn label(&self) -> &str {
        match self {
            ChildNode::File(node) => &node.file().relative_path,
            ChildNode::Task(node) => node.name(),
            ChildNode::Empty(node) => node.message(),
        }
    }
}

/// Render the tree as indented text, marking executing tasks.
pub fn render(root: &RootNode) -> String {
    let mut out = String::new();

    for child in root.children() {
        match child {
            ChildNode::File(file) => {
                out.push_str(&file.file().relative_path);
                out.push('\n');

                for child in file.children() {
                    match child {
                        ChildNode::Task(node) => {
                            let marker = if node.executing() { "* " } else { "  " };
                            out.push_str(&format!("  {marker}{}  [{}]\n", node.name(), node.id()));
                        }
                        other => {
                            out.push_str(&format!("    {}\n", other.label()));
                        }
                    }
                }
            }
            other => {
                out.push_str(other.label());
                out.push('\n');
            }
        }
    }

    out
}
