//! The PTY session: one endpoint, one child process, one data channel.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::{SessionId, SessionState};
use crate::error::PtyError;
use crate::pty::{
    host_backend, BackendKind, EnvironmentBlock, HandleChannel, LaunchSpec, PtyBackend,
    PtyEndpoint, WindowSize,
};
use crate::Result;

/// Returned by [`PtySession::exit_code`] when no exit status is available.
pub const NO_EXIT_CODE: i32 = -1;

/// Options applied when a session is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Initial viewport size.
    pub size: WindowSize,
}

impl SessionOptions {
    pub fn with_size(size: WindowSize) -> Self {
        Self { size }
    }
}

struct Inner {
    state: SessionState,
    endpoint: Option<Box<dyn PtyEndpoint>>,
    size: WindowSize,
    exit_code: Option<i32>,
}

/// A child process running on a pseudo-terminal.
///
/// All methods take `&self`; share the session through an [`Arc`] to read on
/// one thread while writing, resizing or closing from others. Lifecycle
/// operations serialize on one session-wide lock, while blocking I/O runs
/// outside of it so that [`close`](Self::close) never waits for a reader.
///
/// After `close`, every operation degrades instead of failing: `read`
/// returns 0, `write` and `resize` do nothing and `exit_code` returns
/// [`NO_EXIT_CODE`].
pub struct PtySession {
    id: SessionId,
    kind: BackendKind,
    pid: Option<u32>,
    inner: Mutex<Inner>,
    channel: HandleChannel,
}

impl PtySession {
    /// Open a session running `command_line` at the default size.
    ///
    /// `working_dir` defaults to the current directory and `environment`
    /// to the current process environment.
    pub fn open(
        command_line: &str,
        working_dir: Option<&Path>,
        environment: Option<&EnvironmentBlock>,
    ) -> Result<Self> {
        let spec = LaunchSpec {
            command_line: Some(command_line.to_string()),
            working_dir: working_dir.map(Path::to_path_buf),
            environment: environment.cloned(),
            ..Default::default()
        };
        Self::open_with(&spec, SessionOptions::default())
    }

    /// Open a session from a full launch description.
    pub fn open_with(spec: &LaunchSpec, options: SessionOptions) -> Result<Self> {
        Self::open_on(host_backend(), spec, options)
    }

    /// Open a session on an explicit backend.
    ///
    /// Either the returned session is fully usable, or the endpoint has
    /// already been released when the error is returned.
    pub fn open_on(
        backend: &dyn PtyBackend,
        spec: &LaunchSpec,
        options: SessionOptions,
    ) -> Result<Self> {
        let size = WindowSize::checked(options.size.cols, options.size.rows)?;
        let endpoint = backend.allocate(size).map_err(|e| match e {
            PtyError::BackendInit(_) => e,
            other => PtyError::BackendInit(other.to_string()),
        })?;

        Self::bind(SessionId::new(), backend.kind(), endpoint, spec, size)
    }

    fn bind(
        id: SessionId,
        kind: BackendKind,
        mut endpoint: Box<dyn PtyEndpoint>,
        spec: &LaunchSpec,
        size: WindowSize,
    ) -> Result<Self> {
        let mut state = SessionState::default();

        let channel = match endpoint
            .bind_process(spec)
            .and_then(|()| endpoint.open_channel())
        {
            Ok(channel) => channel,
            Err(e) => {
                warn!("{}: open failed: {}", id, e);
                endpoint.release();
                return Err(e);
            }
        };
        state.transition_to(SessionState::Open)?;

        let pid = endpoint.process_id();
        info!("{}: opened on {} backend, pid {:?}", id, kind, pid);

        Ok(Self {
            id,
            kind,
            pid,
            inner: Mutex::new(Inner {
                state,
                endpoint: Some(endpoint),
                size,
                exit_code: None,
            }),
            channel,
        })
    }

    // The guarded data is a flag plus handles, which stay consistent even if
    // a holder panicked.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    /// OS process identifier of the child, when the backend reports one.
    pub fn process_id(&self) -> Option<u32> {
        self.pid
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn is_closed(&self) -> bool {
        self.state().is_closed()
    }

    /// Change the viewport size. Ignored once the session is closed.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        let mut inner = self.lock();
        if inner.state.is_closed() {
            return Ok(());
        }

        let size = WindowSize::checked(cols, rows)?;
        if let Some(endpoint) = inner.endpoint.as_mut() {
            endpoint.set_size(size)?;
        }
        inner.size = size;
        debug!("{}: resized to {}x{}", self.id, cols, rows);
        Ok(())
    }

    /// Current viewport size as reported by the backend.
    ///
    /// Once closed, this is the last size that was set.
    pub fn size(&self) -> Result<WindowSize> {
        let inner = self.lock();
        match inner.endpoint.as_ref() {
            Some(endpoint) if !inner.state.is_closed() => endpoint.size(),
            _ => Ok(inner.size),
        }
    }

    /// Read child output into `buf`, blocking until at least one byte is
    /// available.
    ///
    /// Returns 0 at end-of-stream (the child exited and its output is
    /// drained) and immediately on a closed session.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        if self.lock().state.is_closed() {
            return Ok(0);
        }
        self.channel.read(buf)
    }

    /// Write all of `buf` to the child's terminal input.
    ///
    /// Does nothing on a closed session.
    pub fn write(&self, buf: &[u8]) -> Result<()> {
        if self.lock().state.is_closed() {
            return Ok(());
        }
        self.channel.write(buf)
    }

    /// Poll the child's exit status without waiting.
    ///
    /// `None` while the child runs, after `close`, or when the status
    /// cannot be queried.
    pub fn exit_status(&self) -> Option<i32> {
        let mut inner = self.lock();
        if inner.state.is_closed() {
            return None;
        }
        if let Some(code) = inner.exit_code {
            return Some(code);
        }

        let polled = match inner.endpoint.as_mut() {
            Some(endpoint) => endpoint.exit_code(),
            None => Ok(None),
        };
        match polled {
            Ok(Some(code)) => {
                debug!("{}: child exited with {}", self.id, code);
                inner.exit_code = Some(code);
                Some(code)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("{}: exit status query failed: {}", self.id, e);
                None
            }
        }
    }

    /// Exit code of the child, or [`NO_EXIT_CODE`] if it is still running
    /// or the session is closed.
    pub fn exit_code(&self) -> i32 {
        self.exit_status().unwrap_or(NO_EXIT_CODE)
    }

    /// Terminate the child if needed and release the endpoint.
    ///
    /// Idempotent. Readers blocked in the OS are not interrupted directly;
    /// they observe end-of-stream once the endpoint is gone.
    pub fn close(&self) {
        let mut inner = self.lock();
        if inner.state.is_closed() {
            return;
        }

        self.channel.mark_closed();
        if let Some(mut endpoint) = inner.endpoint.take() {
            endpoint.release();
        }
        inner.exit_code = None;
        inner.state = SessionState::Closed;
        info!("{}: closed", self.id);
    }

    /// Blocking [`Read`] adapter over a shared session.
    pub fn reader(self: &Arc<Self>) -> SessionReader {
        SessionReader(Arc::clone(self))
    }

    /// Blocking [`Write`] adapter over a shared session.
    pub fn writer(self: &Arc<Self>) -> SessionWriter {
        SessionWriter(Arc::clone(self))
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for PtySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PtySession")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("pid", &self.pid)
            .field("state", &self.state())
            .finish()
    }
}

/// [`Read`] implementation backed by [`PtySession::read`].
#[derive(Debug, Clone)]
pub struct SessionReader(Arc<PtySession>);

impl Read for SessionReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.0.read(buf)?)
    }
}

/// [`Write`] implementation backed by [`PtySession::write`].
#[derive(Debug, Clone)]
pub struct SessionWriter(Arc<PtySession>);

impl Write for SessionWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
