//! PTY (Pseudo-Terminal) abstraction layer.
//!
//! This module provides a platform-independent interface for working with
//! pseudo-terminals. A [`PtyBackend`] is chosen once per process for the host
//! OS (POSIX PTY pairs or the Windows pseudo console bridge); each session
//! allocates one [`PtyEndpoint`] from it, binds a single process described
//! by a [`LaunchSpec`], and moves bytes through a [`HandleChannel`].

mod async_adapter;
mod backend;
mod channel;
mod env;
mod launch;
mod native;
#[cfg(unix)]
mod posix;
mod size;
#[cfg(windows)]
mod windows;

pub use async_adapter::{AsyncPtyReader, AsyncPtyWriter};
pub use backend::{host_backend, BackendKind, PtyBackend, PtyEndpoint};
pub use channel::HandleChannel;
pub use env::EnvironmentBlock;
pub use launch::{Interpreter, LaunchSpec};
#[cfg(unix)]
pub use posix::{PosixBackend, DEFAULT_SHELL};
pub use size::WindowSize;
#[cfg(windows)]
pub use windows::WindowsBridgeBackend;
