// tests/settings.rs

//! Settings parsing, defaults and validation.

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::str::FromStr;

use gulptree::config::loader::{load_and_validate, load_or_default};
use gulptree::config::{RawSettings, Settings};
use gulptree::errors::GulptreeError;
use gulptree::output::{OutputCategory, RevealPolicy};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn defaults_cover_every_section() {
    init_tracing();

    let settings = Settings::default();

    assert_eq!(settings.discovery().pattern, "**/gulpfile*.js");
    assert_eq!(
        settings.discovery().exclude,
        vec!["**/node_modules/**".to_string()]
    );
    assert!(settings.tool().args.is_empty());
    assert_eq!(settings.tool().failure_marker, "errored after");
    assert!(settings.notifications().executed);
    assert!(settings.notifications().terminated);
    assert!(settings.notifications().restarted);
    assert_eq!(settings.output().reveal, RevealPolicy::Always);
}

#[test]
fn full_settings_file_parses() -> TestResult {
    init_tracing();

    let raw: RawSettings = toml::from_str(
        r#"
        [discovery]
        pattern = "**/gulpfile*.{js,ts}"
        exclude = ["**/node_modules/**", "**/dist/**"]

        [tool]
        args = ["--color"]
        extra_paths = ["/opt/node/bin"]
        failure_marker = "errored after"

        [notifications]
        executed = false

        [output]
        reveal = "on-error-only"
        "#,
    )?;

    let settings = Settings::try_from(raw)?;

    assert_eq!(settings.discovery().pattern, "**/gulpfile*.{js,ts}");
    assert_eq!(settings.discovery().exclude.len(), 2);
    assert_eq!(settings.tool().args, vec!["--color".to_string()]);
    assert_eq!(settings.tool().extra_paths, vec!["/opt/node/bin".to_string()]);
    assert!(!settings.notifications().executed);
    assert!(settings.notifications().terminated, "unset flags keep their default");
    assert_eq!(settings.output().reveal, RevealPolicy::OnErrorOnly);

    Ok(())
}

#[test]
fn empty_pattern_is_rejected() {
    init_tracing();

    let raw: RawSettings = toml::from_str(
        r#"
        [discovery]
        pattern = "  "
        "#,
    )
    .expect("parse");

    match Settings::try_from(raw) {
        Err(GulptreeError::ConfigError(message)) => {
            assert!(message.contains("pattern"));
        }
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn invalid_exclude_glob_is_rejected() {
    init_tracing();

    let raw: RawSettings = toml::from_str(
        r#"
        [discovery]
        exclude = ["a{b"]
        "#,
    )
    .expect("parse");

    assert!(matches!(
        Settings::try_from(raw),
        Err(GulptreeError::ConfigError(_))
    ));
}

#[test]
fn invalid_failure_marker_is_rejected() {
    init_tracing();

    let raw: RawSettings = toml::from_str(
        r#"
        [tool]
        failure_marker = "("
        "#,
    )
    .expect("parse");

    assert!(matches!(
        Settings::try_from(raw),
        Err(GulptreeError::ConfigError(_))
    ));
}

#[test]
fn load_or_default_handles_missing_and_explicit_paths() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Gulptree.toml");
    std::fs::write(&path, "[tool]\nargs = [\"--silent\"]\n")?;

    let settings = load_and_validate(&path)?;
    assert_eq!(settings.tool().args, vec!["--silent".to_string()]);

    let settings = load_or_default(Some(path.to_str().unwrap()))?;
    assert_eq!(settings.tool().args, vec!["--silent".to_string()]);

    // An explicitly passed path must exist.
    let missing = dir.path().join("nope.toml");
    assert!(load_or_default(Some(missing.to_str().unwrap())).is_err());

    Ok(())
}

#[test]
fn reveal_policy_matrix() {
    init_tracing();

    use OutputCategory::*;

    assert!(RevealPolicy::Always.should_reveal(Progress));
    assert!(RevealPolicy::OnStart.should_reveal(Start));
    assert!(!RevealPolicy::OnStart.should_reveal(Complete));
    assert!(RevealPolicy::OnCompleteOrError.should_reveal(Complete));
    assert!(RevealPolicy::OnCompleteOrError.should_reveal(Error));
    assert!(!RevealPolicy::OnCompleteOrError.should_reveal(Progress));
    assert!(RevealPolicy::OnErrorOnly.should_reveal(Error));
    assert!(!RevealPolicy::OnErrorOnly.should_reveal(Start));
    assert!(!RevealPolicy::Never.should_reveal(Error));
}

#[test]
fn reveal_policy_parses_kebab_case_names() {
    init_tracing();

    assert_eq!(RevealPolicy::from_str("always"), Ok(RevealPolicy::Always));
    assert_eq!(RevealPolicy::from_str("On-Start"), Ok(RevealPolicy::OnStart));
    assert_eq!(
        RevealPolicy::from_str("on-complete-or-error"),
        Ok(RevealPolicy::OnCompleteOrError)
    );
    assert!(RevealPolicy::from_str("sometimes").is_err());
}
