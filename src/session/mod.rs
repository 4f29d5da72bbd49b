//! PTY session lifecycle.
//!
//! A [`PtySession`] owns one PTY endpoint, the single process bound to it
//! and the data channel, and moves through [`SessionState`] from
//! `Uninitialized` to `Open` to `Closed`.

mod id;
mod pty_session;
mod state;

pub use id::SessionId;
pub use pty_session::{PtySession, SessionOptions, SessionReader, SessionWriter, NO_EXIT_CODE};
pub use state::SessionState;
