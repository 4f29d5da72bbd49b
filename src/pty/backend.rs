//! Backend selection and the capability surface shared by both variants.
//!
//! A backend allocates endpoints; an endpoint binds one process, resizes,
//! reports exit status, hands out its data channel and is released once.

use std::fmt;
use std::sync::OnceLock;

use tracing::info;

use super::channel::HandleChannel;
use super::launch::LaunchSpec;
use super::size::WindowSize;
use crate::Result;

/// Which native strategy backs a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// POSIX master/slave PTY pair.
    Posix,
    /// Windows pseudo console bridged over pipes.
    WindowsBridge,
}

impl BackendKind {
    /// The strategy for the host operating system.
    pub const fn host() -> Self {
        #[cfg(unix)]
        {
            BackendKind::Posix
        }
        #[cfg(windows)]
        {
            BackendKind::WindowsBridge
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Posix => f.write_str("posix"),
            BackendKind::WindowsBridge => f.write_str("windows-bridge"),
        }
    }
}

/// Allocates PTY endpoints for one platform strategy.
pub trait PtyBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Allocate a fresh endpoint at the given size.
    ///
    /// Failures are reported as [`crate::PtyError::BackendInit`].
    fn allocate(&self, size: WindowSize) -> Result<Box<dyn PtyEndpoint>>;
}

/// One allocated PTY endpoint and the process bound to it.
pub trait PtyEndpoint: Send {
    /// Start the child process. Only one bind per endpoint is allowed; a
    /// second call fails with [`crate::PtyError::AlreadyBound`].
    fn bind_process(&mut self, spec: &LaunchSpec) -> Result<()>;

    /// Open the data channel. Requires a bound process.
    fn open_channel(&mut self) -> Result<HandleChannel>;

    /// Non-blocking poll for the child's exit status.
    fn exit_code(&mut self) -> Result<Option<i32>>;

    fn set_size(&mut self, size: WindowSize) -> Result<()>;

    /// Query the size the backend currently reports.
    fn size(&self) -> Result<WindowSize>;

    fn process_id(&self) -> Option<u32>;

    /// Terminate the child if still running and free native handles.
    /// Subsequent calls are no-ops.
    fn release(&mut self);
}

static HOST_BACKEND: OnceLock<Box<dyn PtyBackend>> = OnceLock::new();

/// The process-wide backend for the host OS, initialized on first use.
pub fn host_backend() -> &'static dyn PtyBackend {
    HOST_BACKEND
        .get_or_init(|| {
            let backend = select();
            info!("PTY backend initialized: {}", backend.kind());
            backend
        })
        .as_ref()
}

fn select() -> Box<dyn PtyBackend> {
    #[cfg(unix)]
    {
        Box::new(super::posix::PosixBackend::new())
    }
    #[cfg(windows)]
    {
        Box::new(super::windows::WindowsBridgeBackend::new())
    }
}
