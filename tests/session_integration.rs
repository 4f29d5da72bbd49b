//! PTY session integration tests.
//!
//! These tests spawn real processes on the host PTY backend.

#![cfg(unix)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ptyctl::{
    AsyncPtyReader, EnvironmentBlock, LaunchSpec, PtyError, PtySession, SessionOptions,
    WindowSize, NO_EXIT_CODE,
};
use tokio::sync::mpsc;

/// Read until end-of-stream, or until `done` matches the collected output.
fn read_until(session: &PtySession, done: impl Fn(&str) -> bool) -> String {
    let mut output = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = session.read(&mut buf).expect("read failed");
        if n == 0 {
            break;
        }
        output.extend_from_slice(&buf[..n]);
        if done(&String::from_utf8_lossy(&output)) {
            break;
        }
    }
    String::from_utf8_lossy(&output).into_owned()
}

fn read_to_end(session: &PtySession) -> String {
    read_until(session, |_| false)
}

/// Poll the exit code until the child has been reaped.
fn wait_exit(session: &PtySession) -> i32 {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let code = session.exit_code();
        if code != NO_EXIT_CODE || Instant::now() > deadline {
            return code;
        }
        thread::sleep(Duration::from_millis(20));
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_echo_hello() {
    let session = PtySession::open("echo hello", None, None).unwrap();
    assert!(session.process_id().is_some());

    let output = read_to_end(&session);
    assert!(output.contains("hello"), "unexpected output: {output:?}");
    assert_eq!(wait_exit(&session), 0);
}

#[test]
fn test_exit_status_is_reported() {
    let session = PtySession::open("exit 7", None, None).unwrap();
    read_to_end(&session);
    assert_eq!(wait_exit(&session), 7);
}

#[test]
fn test_running_child_has_no_exit_code() {
    let session = PtySession::open("exec sleep 30", None, None).unwrap();
    assert_eq!(session.exit_code(), NO_EXIT_CODE);
    session.close();
}

#[test]
fn test_missing_executable_is_launch_error() {
    let err = PtySession::open_with(&LaunchSpec::default(), SessionOptions::default())
        .unwrap_err();
    assert!(matches!(err, PtyError::ProcessLaunch { .. }));
    assert_eq!(err.launch_code(), Some(libc::EINVAL));
}

#[test]
fn test_missing_app_reports_os_code() {
    let spec = LaunchSpec::app("/nonexistent/bin/prog");
    let err = PtySession::open_with(&spec, SessionOptions::default()).unwrap_err();
    assert!(matches!(err, PtyError::ProcessLaunch { .. }));
    assert_eq!(err.launch_code(), Some(libc::ENOENT));
}

#[test]
fn test_unknown_bare_name_reports_os_code() {
    let spec = LaunchSpec::app("ptyctl-no-such-program");
    let err = PtySession::open_with(&spec, SessionOptions::default()).unwrap_err();
    assert_eq!(err.launch_code(), Some(libc::ENOENT));
}

#[test]
fn test_non_executable_app_reports_os_code() {
    let spec = LaunchSpec::app("/etc/passwd");
    let err = PtySession::open_with(&spec, SessionOptions::default()).unwrap_err();
    assert_eq!(err.launch_code(), Some(libc::EACCES));
}

#[test]
fn test_missing_working_dir_reports_os_code() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone");
    let err = PtySession::open("true", Some(&missing), None).unwrap_err();
    assert!(matches!(err, PtyError::ProcessLaunch { code, .. } if code == libc::ENOENT));
}

#[test]
fn test_close_is_idempotent_and_degrades() {
    let session = PtySession::open("exec cat", None, None).unwrap();

    session.close();
    session.close();
    session.close();

    let mut buf = [0u8; 32];
    assert_eq!(session.read(&mut buf).unwrap(), 0);
    session.write(b"ignored\n").unwrap();
    assert_eq!(session.exit_code(), NO_EXIT_CODE);
    session.resize(10, 10).unwrap();
}

#[test]
fn test_exit_code_after_close_is_sentinel() {
    let session = PtySession::open("exit 0", None, None).unwrap();
    read_to_end(&session);
    assert_eq!(wait_exit(&session), 0);

    session.close();
    assert_eq!(session.exit_code(), NO_EXIT_CODE);
}

// ============================================================================
// I/O
// ============================================================================

#[test]
fn test_echo_round_trip() {
    let session = PtySession::open("exec cat", None, None).unwrap();

    session.write(b"round-trip-marker\n").unwrap();
    // The line comes back twice: terminal echo, then cat's own output.
    let output = read_until(&session, |out| out.matches("round-trip-marker").count() >= 2);
    assert!(output.contains("round-trip-marker\r\nround-trip-marker"));

    session.close();
}

#[test]
fn test_large_write_is_fully_delivered() {
    let session = Arc::new(PtySession::open("exec wc -c", None, None).unwrap());

    let drain = {
        let session = Arc::clone(&session);
        thread::spawn(move || read_to_end(&session))
    };

    // 1024 lines of 64 bytes each; well above one pipe buffer.
    let line = format!("{}\n", "a".repeat(63));
    let payload = line.repeat(1024);
    session.write(payload.as_bytes()).unwrap();
    session.write(b"\x04").unwrap();

    let output = drain.join().unwrap();
    assert!(output.contains("65536"), "wc did not see every byte");
    assert_eq!(wait_exit(&session), 0);
}

#[test]
fn test_concurrent_read_and_close() {
    let session = Arc::new(PtySession::open("exec cat", None, None).unwrap());
    session.write(b"before-close\n").unwrap();

    let reader = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            let mut chunks = Vec::new();
            let mut buf = [0u8; 256];
            loop {
                match session.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => chunks.extend_from_slice(&buf[..n]),
                }
            }
            chunks
        })
    };

    thread::sleep(Duration::from_millis(200));
    session.close();

    let chunks = reader.join().expect("reader thread panicked");
    let text = String::from_utf8_lossy(&chunks);
    assert!(text.is_empty() || text.contains("before-close"));
}

// ============================================================================
// Launch options
// ============================================================================

#[test]
fn test_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let expected = dir.path().canonicalize().unwrap();

    let session = PtySession::open("pwd -P", Some(dir.path()), None).unwrap();
    let output = read_to_end(&session);
    assert!(
        output.contains(expected.to_str().unwrap()),
        "expected cwd {expected:?}, got {output:?}"
    );
}

#[test]
fn test_explicit_environment() {
    let env = EnvironmentBlock::parse("PTYCTL_PROBE=from-block\0PATH=/usr/bin:/bin\0\0").unwrap();
    let session = PtySession::open("echo \"[$PTYCTL_PROBE][$HOME]\"", None, Some(&env)).unwrap();

    let output = read_to_end(&session);
    assert!(output.contains("[from-block][]"), "got {output:?}");
}

#[test]
fn test_command_line_quoting_is_preserved() {
    let session = PtySession::open(r#"printf '<%s>' "a  b" 'c"d'"#, None, None).unwrap();
    let output = read_to_end(&session);
    assert!(output.contains(r#"<a  b><c"d>"#), "got {output:?}");
}

#[test]
fn test_app_name_only() {
    let spec = LaunchSpec::app("/bin/echo");
    let session = PtySession::open_with(&spec, SessionOptions::default()).unwrap();
    read_to_end(&session);
    assert_eq!(wait_exit(&session), 0);
}

// ============================================================================
// Viewport
// ============================================================================

#[test]
fn test_initial_size() {
    let options = SessionOptions::with_size(WindowSize::new(100, 30));
    let session = PtySession::open_with(&LaunchSpec::command_line("exec cat"), options).unwrap();
    assert_eq!(session.size().unwrap(), WindowSize::new(100, 30));
}

#[test]
fn test_resize_then_query() {
    let session = PtySession::open("exec cat", None, None).unwrap();
    assert_eq!(session.size().unwrap(), WindowSize::new(80, 25));

    for (cols, rows) in [(1, 1), (132, 43), (300, 100), (80, 24)] {
        session.resize(cols, rows).unwrap();
        assert_eq!(session.size().unwrap(), WindowSize::new(cols, rows));
    }
}

#[test]
fn test_child_sees_resized_terminal() {
    let session = PtySession::open("sleep 0.3; stty size", None, None).unwrap();
    session.resize(123, 45).unwrap();

    let output = read_to_end(&session);
    assert!(output.contains("45 123"), "got {output:?}");
}

// ============================================================================
// Async adapter
// ============================================================================

#[tokio::test]
async fn test_async_reader_over_session() {
    let session = Arc::new(PtySession::open("echo async-path", None, None).unwrap());

    let (tx, mut rx) = mpsc::channel(16);
    let reader = tokio::spawn(AsyncPtyReader::new(session.reader(), tx).run());

    let mut output = Vec::new();
    while let Some(chunk) = rx.recv().await {
        output.extend(chunk);
    }
    reader.await.unwrap();

    assert!(String::from_utf8_lossy(&output).contains("async-path"));
}
