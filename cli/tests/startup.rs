//! Integration test: process-level startup behavior of `kube-autoupdate`.
//!
//! These run the built binary and only cover paths that end before a
//! cluster connection is attempted.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p kube-autoupdate-cli --test startup
//! ```

use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kube-autoupdate"))
        .args(args)
        .env_remove("LOG_LEVEL")
        .env_remove("SCHEDULE_DELAY_MINUTES")
        .env_remove("SCHEDULE_INITIAL_DELAY_MINUTES")
        .output()
        .expect("failed to run kube-autoupdate")
}

#[test]
fn test_help_lists_commands() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("update"));
    assert!(stdout.contains("schedule"));
}

#[test]
fn test_zero_interval_exits_with_error() {
    let output = run(&["schedule", "--interval-minutes", "0"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("schedule interval"), "stderr: {stderr}");
}

#[test]
fn test_unreadable_config_exits_with_error() {
    let output = run(&["--config", "/nonexistent/kube-autoupdate.yaml", "update"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config file"), "stderr: {stderr}");
}

#[test]
fn test_schedule_interval_from_env() {
    let output = Command::new(env!("CARGO_BIN_EXE_kube-autoupdate"))
        .args(["schedule"])
        .env("SCHEDULE_DELAY_MINUTES", "0")
        .output()
        .expect("failed to run kube-autoupdate");
    assert_eq!(output.status.code(), Some(1));
}
