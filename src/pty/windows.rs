//! Windows bridge backend: a pseudo console whose I/O is relayed over pipes.

use super::backend::{BackendKind, PtyBackend, PtyEndpoint};
use super::launch::Interpreter;
use super::native::{self, Flavor};
use super::size::WindowSize;
use crate::Result;

/// ERROR_INVALID_PARAMETER
const ERROR_INVALID_PARAMETER: i32 = 87;

/// Backend for Windows hosts.
#[derive(Debug, Clone)]
pub struct WindowsBridgeBackend {
    interpreter: Interpreter,
}

impl WindowsBridgeBackend {
    pub fn new() -> Self {
        let comspec = std::env::var("ComSpec").unwrap_or_else(|_| "cmd.exe".to_string());
        Self {
            interpreter: Interpreter::windows(comspec),
        }
    }
}

impl Default for WindowsBridgeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PtyBackend for WindowsBridgeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::WindowsBridge
    }

    fn allocate(&self, size: WindowSize) -> Result<Box<dyn PtyEndpoint>> {
        native::allocate(
            Flavor {
                kind: BackendKind::WindowsBridge,
                interpreter: self.interpreter.clone(),
                invalid_param_code: ERROR_INVALID_PARAMETER,
            },
            size,
        )
    }
}
