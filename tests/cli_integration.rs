//! CLI integration tests.
//!
//! These tests verify argument parsing, configuration loading, and the
//! `ptyctl` binary end to end.

use std::ffi::OsString;
use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

use ptyctl::cli::{parse_args_from, Args};
use ptyctl::config::Config;
use ptyctl::WindowSize;

fn args(args: &[&str]) -> Vec<OsString> {
    std::iter::once("ptyctl")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

// ============================================================================
// CLI Argument Tests
// ============================================================================

#[test]
fn test_cli_full_options() {
    let result = parse_args_from(args(&[
        "--cols",
        "120",
        "--rows",
        "40",
        "-C",
        "/tmp",
        "-e",
        "TERM=dumb",
        "-l",
        "debug",
        "--",
        "top",
        "-b",
    ]))
    .unwrap();

    assert_eq!(result.cols, Some(120));
    assert_eq!(result.rows, Some(40));
    assert_eq!(result.cwd.unwrap().to_str().unwrap(), "/tmp");
    assert_eq!(result.env, vec![("TERM".to_string(), "dumb".to_string())]);
    assert_eq!(result.log_level, Some("debug".to_string()));
    assert_eq!(result.command_line.as_deref(), Some("top -b"));
}

#[test]
fn test_cli_unknown_option() {
    assert!(parse_args_from(args(&["--bogus"])).is_err());
}

// ============================================================================
// Configuration Loading Tests
// ============================================================================

#[test]
fn test_config_from_json_file() {
    let json = r#"{
        "session": {
            "cols": 100,
            "rows": 30,
            "shell": "/bin/bash"
        },
        "io": {
            "read_buffer_size": 8192,
            "exit_poll_ms": 10
        },
        "logging": {
            "level": "debug"
        }
    }"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.window_size(), WindowSize::new(100, 30));
    assert_eq!(config.session.shell.as_deref(), Some("/bin/bash"));
    assert_eq!(config.io.read_buffer_size, 8192);
    assert_eq!(config.io.exit_poll_ms, 10);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_config_priority_cli_over_file() {
    let json = r#"{ "session": { "cols": 100, "rows": 30 } }"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let args = Args {
        cols: Some(200),
        config: Some(file.path().to_path_buf()),
        ..Args::default()
    };

    let config = Config::load(&args).unwrap();

    assert_eq!(config.session.cols, 200);
    assert_eq!(config.session.rows, 30);
}

#[test]
fn test_config_rejects_zero_size() {
    let json = r#"{ "session": { "rows": 0 } }"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let args = Args {
        config: Some(file.path().to_path_buf()),
        ..Args::default()
    };
    assert!(Config::load(&args).is_err());
}

#[test]
fn test_config_missing_file() {
    let args = Args {
        config: Some("/nonexistent/ptyctl.json".into()),
        ..Args::default()
    };
    assert!(Config::load(&args).is_err());
}

#[test]
fn test_config_malformed_json() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();
    assert!(Config::from_file(file.path()).is_err());
}

// ============================================================================
// Binary Tests
// ============================================================================

fn ptyctl(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ptyctl"))
        .args(args)
        .stdin(Stdio::null())
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run ptyctl")
}

#[test]
fn test_binary_version() {
    let output = ptyctl(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("ptyctl "));
}

#[test]
fn test_binary_bad_arguments() {
    let output = ptyctl(&["--cols", "zero"]);
    assert_eq!(output.status.code(), Some(2));
}

#[cfg(unix)]
#[test]
fn test_binary_relays_output() {
    let output = ptyctl(&["echo", "relayed-through-pty"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("relayed-through-pty"));
}

#[cfg(unix)]
#[test]
fn test_binary_propagates_exit_code() {
    let output = ptyctl(&["exit", "3"]);
    assert_eq!(output.status.code(), Some(3));
}

#[cfg(unix)]
#[test]
fn test_binary_reports_missing_command() {
    let output = ptyctl(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to launch process"));
}
