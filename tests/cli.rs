//! Tests that drive the `kiln` binary itself.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn kiln(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kiln"))
        .arg("-C")
        .arg(dir)
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to execute kiln")
}

#[test]
fn test_missing_entry_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();

    let output = kiln(dir.path(), &["build"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Entry file not found"), "stderr: {}", stderr);
    assert!(stderr.contains("project.entry"), "stderr: {}", stderr);
}

#[test]
fn test_no_subcommand_behaves_like_run() {
    let dir = tempfile::tempdir().unwrap();

    let output = kiln(dir.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Entry file not found"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("kiln.toml"), "[project\nname = ").unwrap();

    let output = kiln(dir.path(), &["build"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("kiln.toml"));
}

#[test]
fn test_unknown_compiler_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/main.cc"), "int main() {}\n").unwrap();

    let output = kiln(dir.path(), &["build", "--compiler", "tcc"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown compiler 'tcc'"));
}

#[test]
fn test_clean_removes_selected_mode() {
    let dir = tempfile::tempdir().unwrap();
    let release = dir.path().join("build/release/bin");
    let debug = dir.path().join("build/debug/bin");
    fs::create_dir_all(&release).unwrap();
    fs::create_dir_all(&debug).unwrap();

    let output = kiln(dir.path(), &["clean", "--release"]);

    assert!(output.status.success());
    assert!(!dir.path().join("build/release").exists());
    assert!(debug.exists());
}

#[test]
fn test_version_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_kiln"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
