// src/discover/mod.rs

//! Build-file discovery.
//!
//! Walks the project root through the [`FileSystem`] abstraction and filters
//! candidate files with a case-insensitive inclusion glob plus zero or more
//! exclusion globs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::DiscoverySection;
use crate::fs::FileSystem;

/// A build-script file found under the project root.
///
/// Immutable once produced; many tasks reference one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path relative to the project root, normalized to `/` separators.
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

impl DiscoveredFile {
    pub fn new(relative_path: impl Into<String>, absolute_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            absolute_path: absolute_path.into(),
        }
    }

    /// Stable node identifier derived from the relative path.
    pub fn node_id(&self) -> String {
        self.relative_path.replace(['/', '\\'], "-")
    }

    /// Whether the file sits directly in the project root.
    pub fn is_workspace_root(&self) -> bool {
        !self.relative_path.contains('/')
    }
}

/// Compiled inclusion/exclusion patterns for build-file discovery.
///
/// Matching is case-insensitive and applies to root-relative paths with `/`
/// separators, e.g. `"sub/gulpfile.js"`.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl FileMatcher {
    pub fn new(pattern: &str, exclude: &[String]) -> Result<Self> {
        let include = build_globset(&[pattern.to_string()]).context("building inclusion globset")?;

        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclusion globset")?)
        };

        Ok(Self { include, exclude })
    }

    pub fn from_settings(discovery: &DiscoverySection) -> Result<Self> {
        Self::new(&discovery.pattern, &discovery.exclude)
    }

    /// Returns true if the given root-relative path names a build file.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a case-insensitive GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect all files under `root` that match the given patterns.
///
/// The walk descends every directory; exclusion applies to the file's
/// relative path, mirroring how the patterns are written in the settings.
pub fn find_build_files(
    fs: &dyn FileSystem,
    root: &Path,
    matcher: &FileMatcher,
) -> Result<Vec<DiscoveredFile>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if matcher.matches(&rel_str) {
                        files.push(DiscoveredFile::new(rel_str, path));
                    }
                }
            }
        }
    }

    Ok(files)
}
