//! Session lifecycle tests: one-time initialization, reset isolation, and
//! layered source precedence.

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde_yaml::Value;
use session_kit::{install_panic_hook, ConfigSources, Session};
use tempfile::TempDir;

fn write_config(dir: &Path, name: &str, contents: &str) -> Result<std::path::PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

fn isolated_sources(tmp: &TempDir) -> ConfigSources {
    ConfigSources::for_app("itest-absent")
        .home_dir(tmp.path().join("no-home"))
        .working_dir(tmp.path().join("no-cwd"))
}

#[test]
fn test_first_initialize_wins() -> Result<()> {
    let tmp = TempDir::new()?;
    let first_dir = tmp.path().join("first");
    let second_dir = tmp.path().join("second");
    let first = write_config(
        tmp.path(),
        "first.yaml",
        &format!(
            "logging:\n  app_name: first\n  log_dir: {}\n  timestamp: '2025-06-01'\n",
            first_dir.display()
        ),
    )?;
    let second = write_config(
        tmp.path(),
        "second.yaml",
        &format!(
            "logging:\n  app_name: second\n  log_dir: {}\n  timestamp: '2025-06-01'\n",
            second_dir.display()
        ),
    )?;

    let session = Session::new();
    session.initialize(&isolated_sources(&tmp).explicit_path(first))?;
    session.initialize(&isolated_sources(&tmp).explicit_path(second))?;

    assert!(first_dir.join("first_2025-06-01.log").exists());
    assert!(!second_dir.exists(), "second initialize must be a no-op");

    let config = session.get_config().expect("initialized");
    assert_eq!(config["logging"]["app_name"], Value::from("first"));
    Ok(())
}

#[test]
fn test_reset_then_initialize_reruns_resolution() -> Result<()> {
    let tmp = TempDir::new()?;
    let first_dir = tmp.path().join("first");
    let second_dir = tmp.path().join("second");
    let first = write_config(
        tmp.path(),
        "first.yaml",
        &format!(
            "logging:\n  app_name: first\n  log_dir: {}\n  timestamp: '2025-06-01'\n",
            first_dir.display()
        ),
    )?;
    let second = write_config(
        tmp.path(),
        "second.yaml",
        &format!(
            "logging:\n  app_name: second\n  log_dir: {}\n  timestamp: '2025-06-01'\n",
            second_dir.display()
        ),
    )?;

    let session = Session::new();
    session.initialize(&isolated_sources(&tmp).explicit_path(first))?;
    session.stop_logging();
    session.reset();
    assert!(!session.is_initialized());
    assert!(session.get_config().is_none());

    session.initialize(&isolated_sources(&tmp).explicit_path(second))?;
    assert!(second_dir.join("second_2025-06-01.log").exists());
    let config = session.get_config().expect("initialized");
    assert_eq!(config["logging"]["app_name"], Value::from("second"));
    Ok(())
}

#[test]
fn test_layered_precedence_reaches_logging_config() -> Result<()> {
    let tmp = TempDir::new()?;
    let home = tmp.path().join("home");
    let cwd = tmp.path().join("cwd");
    fs::create_dir_all(&home)?;
    fs::create_dir_all(&cwd)?;
    fs::write(home.join(".myapp.yaml"), "logging:\n  level: DEBUG\n")?;
    fs::write(cwd.join("myapp.yaml"), "logging:\n  level: WARN\n")?;

    let merged = ConfigSources::for_app("myapp")
        .default_path(tmp.path().join("missing-default.yaml"))
        .home_dir(&home)
        .working_dir(&cwd)
        .load()?;
    assert_eq!(merged["logging"]["level"], Value::from("WARN"));
    Ok(())
}

#[test]
fn test_uninitialized_session_is_safe() {
    let session = Session::new();
    assert!(!session.is_initialized());
    assert!(session.get_config().is_none());

    // Logger lookup before initialization falls back to console-only INFO.
    let log = session.get_logger("early");
    log.info("before initialize");

    // Stop is valid in either state and idempotent.
    session.stop_logging();
    session.stop_logging();
}

#[test]
fn test_failed_initialize_leaves_session_uninitialized() -> Result<()> {
    let tmp = TempDir::new()?;
    let bad = write_config(tmp.path(), "bad.yaml", "logging: [not a mapping")?;

    let session = Session::new();
    let result = session.initialize(&isolated_sources(&tmp).explicit_path(bad));
    assert!(result.is_err());
    assert!(!session.is_initialized());

    // A later call with a valid config succeeds.
    let good_dir = tmp.path().join("logs");
    let good = write_config(
        tmp.path(),
        "good.yaml",
        &format!(
            "logging:\n  app_name: svc\n  log_dir: {}\n  timestamp: '2025-06-01'\n",
            good_dir.display()
        ),
    )?;
    session.initialize(&isolated_sources(&tmp).explicit_path(good))?;
    assert!(session.is_initialized());
    Ok(())
}

#[test]
fn test_panic_hook_logs_fatal_through_pipeline() -> Result<()> {
    let tmp = TempDir::new()?;
    let log_dir = tmp.path().join("logs");
    let config = write_config(
        tmp.path(),
        "hook.yaml",
        &format!(
            "logging:\n  app_name: svc\n  log_dir: {}\n  timestamp: '2025-06-01'\n",
            log_dir.display()
        ),
    )?;
    let session = Session::new();
    session.initialize(&isolated_sources(&tmp).explicit_path(config))?;

    install_panic_hook(session.get_logger("boundary"));
    let outcome = std::panic::catch_unwind(|| panic!("task exploded"));
    // Back to the default hook so later failures print normally.
    let _ = std::panic::take_hook();
    assert!(outcome.is_err());

    session.stop_logging();
    let contents = fs::read_to_string(log_dir.join("svc_2025-06-01.log"))?;
    assert!(contents.contains("[FATAL] [boundary]"), "{contents}");
    assert!(contents.contains("task exploded"), "{contents}");
    assert!(
        contents.contains("session_tests.rs"),
        "panic location recorded: {contents}"
    );
    Ok(())
}

#[test]
fn test_omitted_fields_fall_back_to_defaults() -> Result<()> {
    let tmp = TempDir::new()?;
    let log_dir = tmp.path().join("defaulted");
    // Only log_dir and timestamp are set (to keep the test inside the
    // tempdir); every other field takes its documented default.
    let defaults = write_config(
        tmp.path(),
        "only.yaml",
        &format!("logging:\n  log_dir: {}\n  timestamp: '2025-06-01'\n", log_dir.display()),
    )?;

    let session = Session::new();
    session.initialize(&isolated_sources(&tmp).explicit_path(defaults))?;
    let log = session.get_logger("app");
    log.info("default app name");
    session.stop_logging();

    assert!(log_dir.join("app_2025-06-01.log").exists());
    Ok(())
}
