//! # ptyctl
//!
//! Cross-platform pseudo-terminal session controller.
//!
//! A [`PtySession`] starts a child process on a fresh pseudo-terminal and
//! exposes the controlling side as a blocking byte stream. The child sees a
//! real terminal device. Callers can resize the viewport, poll the exit
//! code and close the session from any thread while another thread reads.
//!
//! The backend is picked once per process for the host OS: a POSIX PTY
//! pair on Unix, a pseudo console bridged over pipes on Windows.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ptyctl::PtySession;
//!
//! fn main() -> ptyctl::Result<()> {
//!     ptyctl::logging::try_init().ok();
//!
//!     let session = Arc::new(PtySession::open("echo hello", None, None)?);
//!
//!     let mut buf = [0u8; 4096];
//!     loop {
//!         let n = session.read(&mut buf)?;
//!         if n == 0 {
//!             break;
//!         }
//!         print!("{}", String::from_utf8_lossy(&buf[..n]));
//!     }
//!
//!     println!("exit code: {}", session.exit_code());
//!     session.close();
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pty;
pub mod session;

// Re-export commonly used types
pub use error::{PtyError, Result};
pub use pty::{
    AsyncPtyReader, AsyncPtyWriter, BackendKind, EnvironmentBlock, HandleChannel, LaunchSpec,
    WindowSize,
};
pub use session::{
    PtySession, SessionId, SessionOptions, SessionReader, SessionState, SessionWriter,
    NO_EXIT_CODE,
};
