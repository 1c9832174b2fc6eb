// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawSettings, Settings};
use crate::errors::Result;

/// Load a settings file from a given path and return the raw `RawSettings`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (glob syntax, marker syntax). Use [`load_and_validate`] for
/// that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let settings: RawSettings = toml::from_str(&contents)?;

    Ok(settings)
}

/// Load a settings file from path and run basic validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks that the discovery pattern and exclusions are valid globs and
///   that the failure marker compiles as a pattern.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Settings> {
    let raw = load_from_path(&path)?;
    let settings = Settings::try_from(raw)?;
    Ok(settings)
}

/// Resolve settings for startup.
///
/// - With an explicit path, the file must exist and parse.
/// - Without one, `Gulptree.toml` in the working directory is used when
///   present; otherwise the built-in defaults apply.
pub fn load_or_default(path: Option<&str>) -> Result<Settings> {
    match path {
        Some(path) => load_and_validate(path),
        None => {
            let default = default_config_path();
            if default.exists() {
                load_and_validate(&default)
            } else {
                debug!(path = %default.display(), "no config file found; using defaults");
                Ok(Settings::default())
            }
        }
    }
}

/// Helper to resolve the default config path.
///
/// Currently this just returns `Gulptree.toml` in the current working
/// directory, but this function exists so you can later:
///
/// - Respect an env var (e.g. `GULPTREE_CONFIG`).
/// - Look for multiple default locations.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Gulptree.toml")
}
