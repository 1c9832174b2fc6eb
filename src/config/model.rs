// src/config/model.rs

use serde::Deserialize;

use crate::output::RevealPolicy;

/// Top-level settings as read from a TOML file.
///
/// ```toml
/// [discovery]
/// pattern = "**/gulpfile*.js"
/// exclude = ["**/node_modules/**"]
///
/// [tool]
/// args = ["--color"]
/// failure_marker = "errored after"
///
/// [notifications]
/// executed = true
///
/// [output]
/// reveal = "on-error-only"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSettings {
    /// Build-file discovery settings from `[discovery]`.
    #[serde(default)]
    pub discovery: DiscoverySection,

    /// External tool settings from `[tool]`.
    #[serde(default)]
    pub tool: ToolSection,

    /// Alert policy from `[notifications]`.
    #[serde(default)]
    pub notifications: NotificationSettings,

    /// Output channel policy from `[output]`.
    #[serde(default)]
    pub output: OutputSection,
}

/// `[discovery]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySection {
    /// Inclusion glob matched case-insensitively against relative paths.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Exclusion globs; a path matching any of these is skipped.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_pattern() -> String {
    "**/gulpfile*.js".to_string()
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".to_string()]
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            exclude: default_exclude(),
        }
    }
}

/// `[tool]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSection {
    /// Extra arguments appended to every task invocation.
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra directories appended to `PATH` for spawned processes.
    #[serde(default)]
    pub extra_paths: Vec<String>,

    /// Case-insensitive pattern marking a nested task failure inside the
    /// output stream, even when the process itself exits 0.
    ///
    /// Gulp reports nested failures on stdout while still exiting cleanly,
    /// so the marker compensates for the unreliable exit code. Set to an
    /// empty string to disable the scan.
    #[serde(default = "default_failure_marker")]
    pub failure_marker: String,
}

fn default_failure_marker() -> String {
    "errored after".to_string()
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            extra_paths: Vec::new(),
            failure_marker: default_failure_marker(),
        }
    }
}

/// `[notifications]` section: which lifecycle alerts are surfaced.
///
/// Failures are always alerted; these flags gate only the success-path
/// messages.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub executed: bool,

    #[serde(default = "default_true")]
    pub terminated: bool,

    #[serde(default = "default_true")]
    pub restarted: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            executed: true,
            terminated: true,
            restarted: true,
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct OutputSection {
    /// When the output pane is surfaced to the user.
    #[serde(default)]
    pub reveal: RevealPolicy,
}

/// Validated settings.
///
/// Constructed through `TryFrom<RawSettings>` (see [`crate::config::validate`])
/// or [`Settings::default`] for the built-in configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    raw: RawSettings,
}

impl Settings {
    /// Wrap raw settings without validating them again.
    pub(crate) fn new_unchecked(raw: RawSettings) -> Self {
        Self { raw }
    }

    pub fn discovery(&self) -> &DiscoverySection {
        &self.raw.discovery
    }

    pub fn tool(&self) -> &ToolSection {
        &self.raw.tool
    }

    pub fn notifications(&self) -> NotificationSettings {
        self.raw.notifications
    }

    pub fn output(&self) -> OutputSection {
        self.raw.output
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new_unchecked(RawSettings::default())
    }
}
