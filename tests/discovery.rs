// tests/discovery.rs

//! Build-file discovery over the mock and the real filesystem.

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;

use gulptree::discover::{DiscoveredFile, FileMatcher, find_build_files};
use gulptree::fs::mock::MockFileSystem;
use gulptree::fs::{FileSystem, RealFileSystem};

type TestResult = Result<(), Box<dyn Error>>;

fn default_matcher() -> FileMatcher {
    FileMatcher::new(
        "**/gulpfile*.js",
        &["**/node_modules/**".to_string()],
    )
    .expect("matcher")
}

#[test]
fn matches_are_case_insensitive() {
    init_tracing();

    let matcher = default_matcher();

    assert!(matcher.matches("gulpfile.js"));
    assert!(matcher.matches("GULPFILE.JS"));
    assert!(matcher.matches("sub/Gulpfile.babel.js"));
    assert!(!matcher.matches("readme.md"));
}

#[test]
fn exclusions_win_over_the_inclusion_pattern() {
    init_tracing();

    let matcher = default_matcher();

    assert!(!matcher.matches("node_modules/pkg/gulpfile.js"));
    assert!(!matcher.matches("sub/node_modules/pkg/gulpfile.js"));
    assert!(matcher.matches("sub/gulpfile.js"));
}

#[test]
fn walks_the_mock_tree_and_keeps_relative_paths() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("/project/gulpfile.js");
    fs.add_file("/project/sub/deep/GULPFILE.js");
    fs.add_file("/project/node_modules/pkg/gulpfile.js");
    fs.add_file("/project/readme.md");

    let mut files = find_build_files(&fs, Path::new("/project"), &default_matcher())?;
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let relative: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(relative, vec!["gulpfile.js", "sub/deep/GULPFILE.js"]);
    assert_eq!(
        files[1].absolute_path,
        Path::new("/project/sub/deep/GULPFILE.js")
    );

    Ok(())
}

#[test]
fn walks_the_real_filesystem() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    std::fs::create_dir_all(dir.path().join("sub"))?;
    std::fs::create_dir_all(dir.path().join("node_modules/pkg"))?;
    std::fs::write(dir.path().join("gulpfile.js"), "")?;
    std::fs::write(dir.path().join("sub/gulpfile.js"), "")?;
    std::fs::write(dir.path().join("node_modules/pkg/gulpfile.js"), "")?;

    let fs = RealFileSystem;
    let mut files = find_build_files(&fs, dir.path(), &default_matcher())?;
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let relative: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(relative, vec!["gulpfile.js", "sub/gulpfile.js"]);
    assert!(fs.is_file(&files[0].absolute_path));

    Ok(())
}

#[test]
fn node_ids_normalize_path_separators() {
    init_tracing();

    let file = DiscoveredFile::new("a/b/gulpfile.js", "/project/a/b/gulpfile.js");
    assert_eq!(file.node_id(), "a-b-gulpfile.js");
    assert!(!file.is_workspace_root());

    let root_file = DiscoveredFile::new("gulpfile.js", "/project/gulpfile.js");
    assert_eq!(root_file.node_id(), "gulpfile.js");
    assert!(root_file.is_workspace_root());
}
