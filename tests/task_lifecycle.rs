// tests/task_lifecycle.rs

//! Unit-level tests for the single-flight `Task` wrapper.

mod common;
use crate::common::{init_tracing, wait_until};

use std::error::Error;

use gulptree::proc::TaskOutcome;
use gulptree_test_utils::fake_runner::manual_task;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn execute_twice_invokes_the_factory_once() -> TestResult {
    init_tracing();

    let (task, control) = manual_task();

    let runner = task.clone();
    let first = tokio::spawn(async move { runner.execute().await });
    wait_until("first run start", || control.started()).await;

    // The duplicate start attaches to the pending run instead of spawning.
    let second = task.execute().await;
    assert_eq!(second, None);
    assert_eq!(control.start_count(), 1);

    control.complete(TaskOutcome::Success);
    assert_eq!(first.await?, Some(TaskOutcome::Success));

    // Settled and Idle again: a fresh execute starts a second run.
    let runner = task.clone();
    let third = tokio::spawn(async move { runner.execute().await });
    wait_until("second run start", || control.start_count() == 2).await;
    control.complete(TaskOutcome::Success);
    assert_eq!(third.await?, Some(TaskOutcome::Success));

    Ok(())
}

#[tokio::test]
async fn terminate_on_idle_task_resolves_immediately() -> TestResult {
    init_tracing();

    let (task, control) = manual_task();

    task.terminate().await;

    assert_eq!(control.start_count(), 0);
    assert_eq!(control.kill_count(), 0);
    assert!(!task.is_running());

    Ok(())
}

#[tokio::test]
async fn terminate_stops_the_running_task() -> TestResult {
    init_tracing();

    let (task, control) = manual_task();

    let runner = task.clone();
    let run = tokio::spawn(async move { runner.execute().await });
    wait_until("run start", || control.started()).await;
    assert!(task.is_running());

    task.terminate().await;

    // Once terminate resolves, the run has settled and the task is Idle.
    assert!(!task.is_running());
    assert_eq!(control.kill_count(), 1);
    assert_eq!(run.await?, Some(TaskOutcome::Terminated));

    Ok(())
}

#[tokio::test]
async fn concurrent_terminates_perform_one_kill() -> TestResult {
    init_tracing();

    let (task, control) = manual_task();

    let runner = task.clone();
    let run = tokio::spawn(async move { runner.execute().await });
    wait_until("run start", || control.started()).await;

    let (t1, t2) = (task.clone(), task.clone());
    let first = tokio::spawn(async move { t1.terminate().await });
    let second = tokio::spawn(async move { t2.terminate().await });

    first.await?;
    second.await?;

    assert_eq!(control.kill_count(), 1);
    assert_eq!(run.await?, Some(TaskOutcome::Terminated));

    Ok(())
}

#[tokio::test]
async fn dispose_is_terminate_with_result_discarded() -> TestResult {
    init_tracing();

    let (task, control) = manual_task();

    let runner = task.clone();
    let run = tokio::spawn(async move { runner.execute().await });
    wait_until("run start", || control.started()).await;

    task.dispose().await;

    assert!(!task.is_running());
    assert_eq!(control.kill_count(), 1);
    assert_eq!(run.await?, Some(TaskOutcome::Terminated));

    Ok(())
}
