// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GulptreeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("gulp is not available: {0}")]
    ToolUnavailable(String),

    #[error("listing tasks for '{file}' failed: {reason}")]
    DiscoveryFailed { file: String, reason: String },

    #[error("task '{task}' in file '{file}' failed")]
    TaskExecutionFailed { task: String, file: String },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GulptreeError>;
