//! POSIX backend: a master/slave PTY pair with the child bound to the slave.

use super::backend::{BackendKind, PtyBackend, PtyEndpoint};
use super::launch::Interpreter;
use super::native::{self, Flavor};
use super::size::WindowSize;
use crate::Result;

/// Shell used to run command lines when no application is named.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Backend for Unix-like hosts.
#[derive(Debug, Clone)]
pub struct PosixBackend {
    interpreter: Interpreter,
}

impl PosixBackend {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::posix(DEFAULT_SHELL),
        }
    }
}

impl Default for PosixBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PtyBackend for PosixBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Posix
    }

    fn allocate(&self, size: WindowSize) -> Result<Box<dyn PtyEndpoint>> {
        native::allocate(
            Flavor {
                kind: BackendKind::Posix,
                interpreter: self.interpreter.clone(),
                invalid_param_code: libc::EINVAL,
            },
            size,
        )
    }
}
