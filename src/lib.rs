// src/lib.rs

pub mod cli;
pub mod config;
pub mod discover;
pub mod errors;
pub mod explorer;
pub mod fs;
pub mod logging;
pub mod output;
pub mod proc;
pub mod runner;
pub mod tree;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_or_default;
use crate::discover::FileMatcher;
use crate::explorer::{Explorer, ExplorerCommand, ExplorerEvent, request_snapshot};
use crate::fs::{FileSystem, RealFileSystem};
use crate::output::{Logger, StdoutChannel, TracingAlerts};
use crate::runner::GulpRunner;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading
/// - the gulp runner backend
/// - the explorer event loop
/// - the stdin command loop (or `--once` mode)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_or_default(args.config.as_deref())?;
    let root_dir = resolve_root_dir(args.root.as_deref())?;

    let matcher = FileMatcher::from_settings(settings.discovery())?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let logger = Logger::new(
        Arc::new(StdoutChannel::new(settings.output().reveal)),
        Arc::new(TracingAlerts),
    );

    let runner = GulpRunner::new(root_dir.clone(), settings.tool())?;
    let explorer = Explorer::new(
        runner,
        fs,
        matcher,
        root_dir,
        logger,
        settings.notifications(),
    );
    let events = explorer.sender();

    // Ctrl-C → graceful shutdown.
    {
        let tx = events.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(ExplorerEvent::ShutdownRequested).await;
        });
    }

    // Seed the initial refresh before the loop starts.
    events
        .send(ExplorerEvent::Command(ExplorerCommand::Refresh))
        .await
        .context("seeding initial refresh")?;

    if args.once {
        // The snapshot request is queued behind the refresh, so the reply
        // reflects the freshly built tree.
        let loop_handle = tokio::spawn(explorer.run());

        let snapshot = request_snapshot(&events).await?;
        print!("{}", snapshot.rendered);

        let _ = events.send(ExplorerEvent::ShutdownRequested).await;
        loop_handle.await.context("joining explorer loop")??;
        return Ok(());
    }

    spawn_stdin_loop(events);
    explorer.run().await?;
    Ok(())
}

/// Figure out the project root for discovery.
///
/// - With `--root`, the given directory is used as-is.
/// - Otherwise the current working directory.
fn resolve_root_dir(root: Option<&str>) -> Result<PathBuf> {
    match root {
        Some(dir) => {
            let path = PathBuf::from(dir);
            if !path.is_dir() {
                anyhow::bail!("--root {dir} is not a directory");
            }
            Ok(path)
        }
        None => std::env::current_dir().context("resolving current directory"),
    }
}

/// Read host commands from stdin, one per line.
fn spawn_stdin_loop(events: mpsc::Sender<ExplorerEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.splitn(2, char::is_whitespace);
            let verb = parts.next().unwrap_or_default();
            let arg = parts.next().map(str::trim).unwrap_or_default();

            let event = match (verb, arg) {
                ("refresh" | "r", _) => ExplorerEvent::Command(ExplorerCommand::Refresh),
                ("select", id) if !id.is_empty() => {
                    ExplorerEvent::Command(ExplorerCommand::Select(id.to_string()))
                }
                ("activate", id) if !id.is_empty() => {
                    ExplorerEvent::Command(ExplorerCommand::Activate(id.to_string()))
                }
                ("execute" | "x", _) => ExplorerEvent::Command(ExplorerCommand::Execute),
                ("terminate" | "stop", _) => ExplorerEvent::Command(ExplorerCommand::Terminate),
                ("restart", _) => ExplorerEvent::Command(ExplorerCommand::Restart),
                ("tree" | "ls", _) => {
                    match request_snapshot(&events).await {
                        Ok(snapshot) => {
                            print!("{}", snapshot.rendered);
                            if let Some(selected) = snapshot.selected {
                                println!("selected: {selected}");
                            }
                        }
                        Err(err) => debug!(error = %err, "snapshot request failed"),
                    }
                    continue;
                }
                ("quit" | "exit" | "q", _) => {
                    let _ = events.send(ExplorerEvent::ShutdownRequested).await;
                    break;
                }
                _ => {
                    println!(
                        "commands: refresh | select <id> | activate <id> | execute | \
                         terminate | restart | tree | quit"
                    );
                    continue;
                }
            };

            if events.send(event).await.is_err() {
                break;
            }
        }

        info!("stdin command loop finished");
    });
}
