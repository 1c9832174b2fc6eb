use gulptree::config::{RawSettings, Settings};
use gulptree::discover::DiscoveredFile;
use gulptree::output::RevealPolicy;

/// Builder for `Settings` to simplify test setup.
pub struct SettingsBuilder {
    raw: RawSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawSettings::default(),
        }
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.raw.discovery.pattern = pattern.to_string();
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.raw.discovery.exclude.push(pattern.to_string());
        self
    }

    pub fn clear_excludes(mut self) -> Self {
        self.raw.discovery.exclude.clear();
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.raw.tool.args.push(arg.to_string());
        self
    }

    pub fn failure_marker(mut self, marker: &str) -> Self {
        self.raw.tool.failure_marker = marker.to_string();
        self
    }

    pub fn notifications(mut self, executed: bool, terminated: bool, restarted: bool) -> Self {
        self.raw.notifications.executed = executed;
        self.raw.notifications.terminated = terminated;
        self.raw.notifications.restarted = restarted;
        self
    }

    pub fn reveal(mut self, policy: RevealPolicy) -> Self {
        self.raw.output.reveal = policy;
        self
    }

    pub fn build(self) -> Settings {
        Settings::try_from(self.raw).expect("Failed to build valid settings from builder")
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for a discovered file with a synthetic absolute path.
pub fn discovered(relative_path: &str) -> DiscoveredFile {
    DiscoveredFile::new(relative_path, format!("/project/{relative_path}"))
}
