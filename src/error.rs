//! Error types for ptyctl.

use thiserror::Error;

use crate::session::SessionState;

/// Main error type for PTY session operations.
#[derive(Error, Debug)]
pub enum PtyError {
    /// The native PTY endpoint could not be allocated.
    #[error("failed to allocate PTY endpoint: {0}")]
    BackendInit(String),

    /// The OS rejected process creation.
    #[error("failed to launch process (code {code}): {message}")]
    ProcessLaunch {
        /// OS-reported status or error code.
        code: i32,
        /// Human readable detail from the backend.
        message: String,
    },

    /// Transport fault on an open channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A viewport dimension was zero.
    #[error("invalid window size {cols}x{rows}")]
    InvalidSize { cols: u16, rows: u16 },

    /// Malformed environment block or entry.
    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),

    /// A process has already been launched on this endpoint.
    #[error("a process is already bound to this PTY endpoint")]
    AlreadyBound,

    /// The endpoint has no process bound to it yet.
    #[error("no process is bound to this PTY endpoint")]
    NotBound,

    /// Invalid lifecycle transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: SessionState,
        to: SessionState,
    },
}

impl PtyError {
    /// Build a launch error from an OS error code.
    pub fn launch(code: i32, message: impl Into<String>) -> Self {
        PtyError::ProcessLaunch {
            code,
            message: message.into(),
        }
    }

    /// OS code carried by a [`PtyError::ProcessLaunch`].
    pub fn launch_code(&self) -> Option<i32> {
        match self {
            PtyError::ProcessLaunch { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<PtyError> for std::io::Error {
    fn from(err: PtyError) -> Self {
        match err {
            PtyError::Io(e) => e,
            other => std::io::Error::other(other),
        }
    }
}

/// Convenience Result type for ptyctl operations.
pub type Result<T> = std::result::Result<T, PtyError>;
