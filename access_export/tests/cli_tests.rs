//! Exit status tests for the access_export binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

const SNAPSHOT: &str = r#"{ "tables": [
    { "name": "A", "columns": [ { "name": "a", "type": "long" } ], "rows": [ { "a": 1 } ] },
    { "name": "B", "columns": [ { "name": "b", "type": "text" } ], "rows": [ { "b": "x" } ] }
] }"#;

fn access_export(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_access_export"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn path(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn test_help_and_version_exit_zero() {
    assert_eq!(access_export(&["--help"]).status.code(), Some(0));
    assert_eq!(access_export(&["--version"]).status.code(), Some(0));
}

#[test]
fn test_missing_arguments_are_a_usage_error() {
    assert_eq!(access_export(&[]).status.code(), Some(1));
    assert_eq!(access_export(&["only-source.json"]).status.code(), Some(1));
    assert_eq!(
        access_export(&["a.json", "b.sqlite", "--format", "xml"]).status.code(),
        Some(1)
    );
}

#[test]
fn test_unreadable_config_is_a_usage_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("missing.toml");
    let output = access_export(&["a.json", "b.sqlite", "--config", path(&config)]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_missing_source() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("missing.json");
    let target = dir.path().join("target.sqlite");

    let output = access_export(&[path(&source), path(&target)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_existing_sqlite_target() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.json");
    fs::write(&source, SNAPSHOT).unwrap();
    let target = dir.path().join("target.sqlite");
    fs::write(&target, b"").unwrap();

    let output = access_export(&[path(&source), path(&target)]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does already exist"));
}

#[test]
fn test_corrupt_source() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.json");
    fs::write(&source, "{").unwrap();
    let target = dir.path().join("target.sqlite");

    assert_eq!(access_export(&[path(&source), path(&target)]).status.code(), Some(4));
}

#[test]
fn test_csv_target_must_be_a_directory() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.json");
    fs::write(&source, SNAPSHOT).unwrap();
    let target = dir.path().join("nowhere");

    let output = access_export(&[path(&source), path(&target), "--format", "csv"]);
    assert_eq!(output.status.code(), Some(7));
}

#[test]
fn test_successful_exports() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.json");
    fs::write(&source, SNAPSHOT).unwrap();

    let target = dir.path().join("target.sqlite");
    let output = access_export(&[path(&source), path(&target), "-t", "A", "-v"]);
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(target.exists());

    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();
    let output = access_export(&[path(&source), path(&out), "-f", "csv", "--tables", "A,B"]);
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(fs::read_to_string(out.join("A.csv")).unwrap(), "a\n1\n");
    assert_eq!(fs::read_to_string(out.join("B.csv")).unwrap(), "b\nx\n");
}

#[test]
fn test_format_from_config_file() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.json");
    fs::write(&source, SNAPSHOT).unwrap();
    let config = dir.path().join("access_export.toml");
    fs::write(
        &config,
        "[export]\nformat = \"csv\"\ntables = [\"B\"]\n\n[csv]\ndelimiter = \";\"\nextension = \"txt\"\n",
    )
    .unwrap();
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();

    let output = access_export(&[path(&source), path(&out), "--config", path(&config)]);
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(!out.join("A.txt").exists());
    assert_eq!(fs::read_to_string(out.join("B.txt")).unwrap(), "b\nx\n");
}
