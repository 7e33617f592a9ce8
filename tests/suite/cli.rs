//! The `tss` binary end to end.

use std::path::Path;
use std::process::{Command, Output};

use crate::common::FAKE_TSSERVER;

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let content = format!(
        "[server]\npath = \"/bin/sh\"\nargs = [\"-c\", '''{FAKE_TSSERVER}''']\n{extra}\n"
    );
    std::fs::write(&path, content).unwrap();
    path
}

fn tss(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tss"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("TSS_CLIENT_LOG", "off")
        .output()
        .expect("tss runs")
}

fn source_file(dir: &Path) -> String {
    let file = dir.join("a.ts");
    std::fs::write(&file, "const x = 1;\n").unwrap();
    file.to_string_lossy().into_owned()
}

#[test]
fn quickinfo_prints_display_string() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "completion_command = \"completionInfo\"");
    let file = source_file(dir.path());

    let output = tss(&config, &["quickinfo", &file, "1", "7"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "const x: number");
}

#[test]
fn navtree_prints_outline() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "completion_command = \"completions\"");
    let file = source_file(dir.path());

    let output = tss(&config, &["navtree", &file]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "module a\n  class C");
}

#[test]
fn diagnostics_report_errors_and_fail() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "completion_command = \"completionInfo\"");
    let file = source_file(dir.path());

    let output = tss(&config, &["diagnostics", &file]);
    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("{file}:1:7: error: [TS2322] Type string is not assignable to type number.")
    );
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = tss(&dir.path().join("absent.toml"), &["navtree", "a.ts"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read config"));
}
