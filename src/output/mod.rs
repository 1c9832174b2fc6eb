// src/output/mod.rs

//! User-facing output: the persistent output channel and transient alerts.
//!
//! Diagnostic logs go through `tracing`; everything here is what a host
//! shell shows to the user. The output channel receives every line
//! unconditionally and decides from the configured [`RevealPolicy`] whether
//! a line should also surface the pane.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use tracing::{error, info, warn};

/// Category attached to lifecycle lines written to the output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCategory {
    Start,
    Progress,
    Complete,
    Error,
}

/// When the output pane is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevealPolicy {
    Always,
    OnStart,
    OnCompleteOrError,
    OnErrorOnly,
    Never,
}

impl Default for RevealPolicy {
    fn default() -> Self {
        RevealPolicy::Always
    }
}

impl RevealPolicy {
    /// Whether a line of the given category should surface the pane.
    pub fn should_reveal(self, category: OutputCategory) -> bool {
        match self {
            RevealPolicy::Always => true,
            RevealPolicy::OnStart => category == OutputCategory::Start,
            RevealPolicy::OnCompleteOrError => {
                matches!(category, OutputCategory::Complete | OutputCategory::Error)
            }
            RevealPolicy::OnErrorOnly => category == OutputCategory::Error,
            RevealPolicy::Never => false,
        }
    }
}

impl FromStr for RevealPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(RevealPolicy::Always),
            "on-start" => Ok(RevealPolicy::OnStart),
            "on-complete-or-error" => Ok(RevealPolicy::OnCompleteOrError),
            "on-error-only" => Ok(RevealPolicy::OnErrorOnly),
            "never" => Ok(RevealPolicy::Never),
            other => Err(format!(
                "invalid reveal policy: {other} (expected \"always\", \"on-start\", \
                 \"on-complete-or-error\", \"on-error-only\" or \"never\")"
            )),
        }
    }
}

/// Persistent, append-only output channel.
///
/// Lines are never dropped; the category only drives pane visibility.
pub trait OutputChannel: Send + Sync {
    /// Append a plain line (no visibility side effect).
    fn log(&self, message: &str);

    /// Append a categorized lifecycle line.
    fn log_with(&self, message: &str, category: OutputCategory);
}

/// Transient user alerts (toasts in a UI host, stderr lines here).
pub trait AlertSink: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Output channel writing to stdout.
///
/// "Revealing" the pane has no terminal equivalent, so the channel only
/// tracks whether the policy would have surfaced it.
pub struct StdoutChannel {
    policy: RevealPolicy,
    revealed: AtomicBool,
}

impl StdoutChannel {
    pub fn new(policy: RevealPolicy) -> Self {
        Self {
            policy,
            revealed: AtomicBool::new(false),
        }
    }

    pub fn revealed(&self) -> bool {
        self.revealed.load(Ordering::SeqCst)
    }
}

impl OutputChannel for StdoutChannel {
    fn log(&self, message: &str) {
        if !message.is_empty() {
            println!("{message}");
        }
    }

    fn log_with(&self, message: &str, category: OutputCategory) {
        self.log(message);
        if self.policy.should_reveal(category) {
            self.revealed.store(true, Ordering::SeqCst);
        }
    }
}

/// Alerts surfaced through the tracing subscriber (stderr).
#[derive(Debug, Clone, Default)]
pub struct TracingAlerts;

impl AlertSink for TracingAlerts {
    fn info(&self, message: &str) {
        if !message.is_empty() {
            info!("{message}");
        }
    }

    fn warn(&self, message: &str) {
        if !message.is_empty() {
            warn!("{message}");
        }
    }

    fn error(&self, message: &str) {
        if !message.is_empty() {
            error!("{message}");
        }
    }
}

/// Facade bundling the output channel and the alert sink.
#[derive(Clone)]
pub struct Logger {
    pub output: Arc<dyn OutputChannel>,
    pub alert: Arc<dyn AlertSink>,
}

impl Logger {
    pub fn new(output: Arc<dyn OutputChannel>, alert: Arc<dyn AlertSink>) -> Self {
        Self { output, alert }
    }

    pub fn info(&self, message: &str) {
        self.alert.info(message);
        self.output.log(message);
    }

    pub fn warn(&self, message: &str) {
        self.alert.warn(message);
        if !message.is_empty() {
            self.output.log(&format!("WARNING: {message}"));
        }
    }

    pub fn error(&self, message: &str) {
        self.alert.error(message);
        if !message.is_empty() {
            self.output
                .log_with(&format!("ERROR: {message}"), OutputCategory::Error);
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}
