// tests/tree_nodes.rs

//! Node hierarchy: ordering, placeholders and disposal.

mod common;
use crate::common::{init_tracing, wait_until};

use std::error::Error;

use gulptree::proc::TaskOutcome;
use gulptree::tree::{ChildNode, FileNode, NodeKind, RootNode, TaskNode, render};
use gulptree_test_utils::builders::discovered;
use gulptree_test_utils::fake_runner::manual_task;

type TestResult = Result<(), Box<dyn Error>>;

fn file_node(rel: &str, tasks: &[&str]) -> FileNode {
    let file = discovered(rel);
    let file_id = file.node_id();
    let leaves = tasks
        .iter()
        .map(|name| TaskNode::new(&file_id, *name, file.clone()))
        .collect();
    FileNode::new(file, leaves)
}

#[test]
fn workspace_root_files_sort_ahead_of_nested_ones() {
    init_tracing();

    let root = RootNode::new(vec![
        file_node("a/build.js", &["compile"]),
        file_node("build.js", &["compile"]),
        file_node("zz.js", &["compile"]),
    ]);

    let children = root.children();
    let labels: Vec<&str> = children.iter().map(|c| c.label()).collect();
    assert_eq!(labels, vec!["build.js", "zz.js", "a/build.js"]);
}

#[test]
fn empty_root_and_empty_file_produce_placeholders() {
    init_tracing();

    let root = RootNode::empty();
    let children = root.children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].kind(), NodeKind::Empty);
    assert_eq!(children[0].label(), "No gulp files found");

    let diagnostic = RootNode::diagnostic("gulp is not available: nope");
    assert_eq!(diagnostic.children()[0].label(), "gulp is not available: nope");

    let file = file_node("gulpfile.js", &[]);
    let children = file.children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].label(), "No gulp tasks");
}

#[test]
fn task_lookup_uses_file_and_name() {
    init_tracing();

    let root = RootNode::new(vec![
        file_node("gulpfile.js", &["lint", "build"]),
        file_node("sub/gulpfile.js", &["lint"]),
    ]);

    assert!(root.contains_task("gulpfile.js:lint"));
    assert!(root.contains_task("sub-gulpfile.js:lint"));
    assert!(!root.contains_task("gulpfile.js:deploy"));

    let leaf = root.find_task("gulpfile.js:build").expect("leaf");
    assert_eq!(leaf.name(), "build");
    assert_eq!(leaf.kind(), NodeKind::Task);
    assert_eq!(leaf.file().relative_path, "gulpfile.js");

    assert_eq!(
        root.task_ids(),
        vec![
            "gulpfile.js:lint".to_string(),
            "gulpfile.js:build".to_string(),
            "sub-gulpfile.js:lint".to_string(),
        ]
    );
}

#[test]
fn executing_state_follows_task_ownership() {
    init_tracing();

    let mut root = RootNode::new(vec![file_node("gulpfile.js", &["lint"])]);
    let leaf = root.find_task_mut("gulpfile.js:lint").expect("leaf");
    assert!(!leaf.executing());

    let (task, _control) = manual_task();
    leaf.set_task(Some(task));
    assert!(leaf.executing());

    let rendered = render(&root);
    assert!(rendered.contains("* lint"));

    let leaf = root.find_task_mut("gulpfile.js:lint").expect("leaf");
    leaf.set_task(None);
    assert!(!leaf.executing());
}

#[tokio::test]
async fn disposal_terminates_every_owned_task() -> TestResult {
    init_tracing();

    let mut root = RootNode::new(vec![
        file_node("gulpfile.js", &["serve"]),
        file_node("sub/gulpfile.js", &["watch"]),
    ]);

    let (serve_task, serve_control) = manual_task();
    let (watch_task, watch_control) = manual_task();

    let serve_run = {
        let task = serve_task.clone();
        tokio::spawn(async move { task.execute().await })
    };
    let watch_run = {
        let task = watch_task.clone();
        tokio::spawn(async move { task.execute().await })
    };
    wait_until("runs started", || {
        serve_control.started() && watch_control.started()
    })
    .await;

    root.find_task_mut("gulpfile.js:serve")
        .expect("serve leaf")
        .set_task(Some(serve_task));
    root.find_task_mut("sub-gulpfile.js:watch")
        .expect("watch leaf")
        .set_task(Some(watch_task));

    root.dispose().await;

    assert_eq!(serve_control.kill_count(), 1);
    assert_eq!(watch_control.kill_count(), 1);
    assert_eq!(serve_run.await?, Some(TaskOutcome::Terminated));
    assert_eq!(watch_run.await?, Some(TaskOutcome::Terminated));

    Ok(())
}

#[test]
fn child_view_exposes_ids_by_kind() {
    init_tracing();

    let root = RootNode::new(vec![file_node("gulpfile.js", &["lint"])]);
    let children = root.children();

    match &children[0] {
        ChildNode::File(file) => {
            assert_eq!(file.id(), "gulpfile.js");
            let tasks = file.children();
            assert_eq!(tasks[0].id(), "gulpfile.js:lint");
        }
        other => panic!("expected a file child, got {other:?}"),
    }
}
