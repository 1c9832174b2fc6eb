// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `gulptree`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gulptree",
    version,
    about = "Discover gulp files, browse their tasks and run one at a time.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Gulptree.toml` in the current working directory. The default
    /// may be absent (built-in settings apply); an explicitly provided path
    /// must exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Project root to discover gulp files in.
    ///
    /// Default: the current working directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Refresh once, print the discovered tree and exit (no command loop).
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GULPTREE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
