//! Session lifecycle state machine.

/// Lifecycle state of a PTY session.
///
/// Whether the child is still running is not tracked here; it is observed
/// on demand through the exit code query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Endpoint allocated, no process bound yet.
    #[default]
    Uninitialized,
    /// Process bound; I/O, resize and exit queries are live.
    Open,
    /// Handles released. Every operation degrades to a no-op.
    Closed,
}

impl SessionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Uninitialized -> Open
    /// - Uninitialized -> Closed (failed open)
    /// - Open -> Closed
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (Uninitialized, Open) | (Uninitialized, Closed) | (Open, Closed)
        )
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: SessionState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::PtyError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionState::Closed)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Open)
    }
}
