//! Blocking byte channel over a PTY endpoint.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::Result;

/// Bidirectional byte stream over the controlling side of a PTY.
///
/// Reads and writes block in the OS primitive; there is no buffering here.
/// Once the owning session marks the channel closed, reads return 0 and
/// writes are dropped.
pub struct HandleChannel {
    reader: Mutex<Box<dyn Read + Send>>,
    writer: Mutex<Box<dyn Write + Send>>,
    open: AtomicBool,
}

impl HandleChannel {
    /// Wrap a reader/writer pair cloned from the same endpoint.
    pub fn new(reader: Box<dyn Read + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            open: AtomicBool::new(true),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Mirror the owning session's closed flag.
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Read up to `buf.len()` bytes.
    ///
    /// Returns 0 only at end-of-stream or when the channel is closed. A short
    /// read does not imply end-of-stream.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || !self.is_open() {
            return Ok(0);
        }

        let mut reader = lock(&self.reader);
        loop {
            match reader.read(buf) {
                Ok(0) => {
                    debug!("PTY channel: EOF");
                    return Ok(0);
                }
                Ok(n) => {
                    trace!("PTY channel: read {} bytes", n);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_end_of_stream(&e) => {
                    debug!("PTY channel: peer closed ({})", e);
                    return Ok(0);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Write all of `buf`, retrying short writes.
    pub fn write(&self, buf: &[u8]) -> Result<()> {
        if buf.is_empty() || !self.is_open() {
            return Ok(());
        }

        let mut writer = lock(&self.writer);
        writer.write_all(buf)?;
        writer.flush()?;
        trace!("PTY channel: wrote {} bytes", buf.len());
        Ok(())
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Errors that mean the other side of the PTY has gone away.
fn is_end_of_stream(e: &io::Error) -> bool {
    // EIO on the master means every slave descriptor was closed.
    #[cfg(unix)]
    if e.raw_os_error() == Some(libc::EIO) {
        return true;
    }

    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof
    )
}

impl std::fmt::Debug for HandleChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleChannel")
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}
