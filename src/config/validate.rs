// src/config/validate.rs

use globset::Glob;
use regex::RegexBuilder;

use crate::config::model::{DiscoverySection, RawSettings, Settings, ToolSection};
use crate::errors::{GulptreeError, Result};

impl TryFrom<RawSettings> for Settings {
    type Error = GulptreeError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_raw_settings(&raw)?;
        Ok(Settings::new_unchecked(raw))
    }
}

fn validate_raw_settings(cfg: &RawSettings) -> Result<()> {
    validate_discovery(&cfg.discovery)?;
    validate_tool(&cfg.tool)?;
    Ok(())
}

fn validate_discovery(discovery: &DiscoverySection) -> Result<()> {
    if discovery.pattern.trim().is_empty() {
        return Err(GulptreeError::ConfigError(
            "[discovery].pattern must not be empty".to_string(),
        ));
    }

    if let Err(err) = Glob::new(&discovery.pattern) {
        return Err(GulptreeError::ConfigError(format!(
            "[discovery].pattern is not a valid glob: {err}"
        )));
    }

    for pattern in discovery.exclude.iter() {
        if let Err(err) = Glob::new(pattern) {
            return Err(GulptreeError::ConfigError(format!(
                "[discovery].exclude entry '{pattern}' is not a valid glob: {err}"
            )));
        }
    }

    Ok(())
}

fn validate_tool(tool: &ToolSection) -> Result<()> {
    // An empty marker disables the output scan; anything else must compile.
    if !tool.failure_marker.is_empty() {
        if let Err(err) = RegexBuilder::new(&tool.failure_marker)
            .case_insensitive(true)
            .build()
        {
            return Err(GulptreeError::ConfigError(format!(
                "[tool].failure_marker is not a valid pattern: {err}"
            )));
        }
    }

    Ok(())
}
