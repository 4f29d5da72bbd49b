//! PTY endpoint implementation on top of portable-pty.
//!
//! Both backend variants allocate through the host's native PTY system and
//! differ only in how a command line is interpreted and which OS codes they
//! report.

use portable_pty::{native_pty_system, Child, MasterPty, SlavePty};
use tracing::{debug, warn};

use super::backend::{BackendKind, PtyEndpoint};
use super::channel::HandleChannel;
use super::launch::{build_command, Interpreter, LaunchSpec};
use super::size::WindowSize;
use crate::error::PtyError;
use crate::Result;

/// Per-variant launch conventions.
#[derive(Debug, Clone)]
pub(crate) struct Flavor {
    pub kind: BackendKind,
    pub interpreter: Interpreter,
    /// OS code reported when neither an application nor a command line is given.
    pub invalid_param_code: i32,
}

/// Allocate an endpoint at `size` using the host PTY system.
pub(crate) fn allocate(flavor: Flavor, size: WindowSize) -> Result<Box<dyn PtyEndpoint>> {
    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(size.into())
        .map_err(|e| PtyError::BackendInit(e.to_string()))?;

    debug!(
        "{} endpoint allocated at {}x{}",
        flavor.kind, size.cols, size.rows
    );

    Ok(Box::new(NativeEndpoint {
        flavor,
        master: Some(pair.master),
        slave: Some(pair.slave),
        child: None,
    }))
}

struct NativeEndpoint {
    flavor: Flavor,
    master: Option<Box<dyn MasterPty + Send>>,
    // Consumed by the single permitted launch.
    slave: Option<Box<dyn SlavePty + Send>>,
    child: Option<Box<dyn Child + Send + Sync>>,
}

impl NativeEndpoint {
    fn master(&self) -> Result<&(dyn MasterPty + Send)> {
        self.master.as_deref().ok_or_else(released)
    }
}

fn released() -> PtyError {
    PtyError::Io(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "PTY endpoint already released",
    ))
}

impl PtyEndpoint for NativeEndpoint {
    fn bind_process(&mut self, spec: &LaunchSpec) -> Result<()> {
        self.master()?;
        let slave = self.slave.take().ok_or(PtyError::AlreadyBound)?;

        let cmd = build_command(spec, &self.flavor.interpreter, self.flavor.invalid_param_code)?;
        let child = slave.spawn_command(cmd).map_err(|e| {
            let code = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<std::io::Error>())
                .and_then(std::io::Error::raw_os_error)
                .unwrap_or(-1);
            PtyError::launch(code, e.to_string())
        })?;

        // The master only sees end-of-stream once no slave descriptor is
        // left open in this process.
        drop(slave);

        debug!(
            "{} endpoint bound to pid {:?}",
            self.flavor.kind,
            child.process_id()
        );
        self.child = Some(child);
        Ok(())
    }

    fn open_channel(&mut self) -> Result<HandleChannel> {
        if self.child.is_none() {
            return Err(PtyError::NotBound);
        }
        let master = self.master()?;

        let reader = master
            .try_clone_reader()
            .map_err(|e| PtyError::BackendInit(format!("failed to clone reader: {e}")))?;
        let writer = master
            .take_writer()
            .map_err(|e| PtyError::BackendInit(format!("failed to take writer: {e}")))?;

        Ok(HandleChannel::new(reader, writer))
    }

    fn exit_code(&mut self) -> Result<Option<i32>> {
        if self.master.is_none() {
            return Ok(None);
        }
        let child = self.child.as_mut().ok_or(PtyError::NotBound)?;
        // Exit codes above i32::MAX (Windows NTSTATUS values) wrap, matching
        // the native DWORD-as-int convention.
        Ok(child.try_wait()?.map(|status| status.exit_code() as i32))
    }

    fn set_size(&mut self, size: WindowSize) -> Result<()> {
        self.master()?
            .resize(size.into())
            .map_err(|e| PtyError::Io(std::io::Error::other(e.to_string())))
    }

    fn size(&self) -> Result<WindowSize> {
        self.master()?
            .get_size()
            .map(WindowSize::from)
            .map_err(|e| PtyError::Io(std::io::Error::other(e.to_string())))
    }

    fn process_id(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.process_id())
    }

    fn release(&mut self) {
        if let Some(mut child) = self.child.take() {
            match child.try_wait() {
                Ok(Some(_)) => {}
                _ => match child.kill() {
                    Ok(()) => {
                        if let Err(e) = child.wait() {
                            warn!("failed to reap child after kill: {}", e);
                        }
                    }
                    Err(e) => warn!("failed to terminate child: {}", e),
                },
            }
        }

        if self.master.take().is_some() {
            debug!("{} endpoint released", self.flavor.kind);
        }
        self.slave = None;
    }
}

impl Drop for NativeEndpoint {
    fn drop(&mut self) {
        self.release();
    }
}
