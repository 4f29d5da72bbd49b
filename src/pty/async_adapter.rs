//! Async adapters for PTY session I/O.
//!
//! Session reads and writes block in the OS. These adapters run them on
//! blocking threads and exchange chunks with async code over channels.

use std::io::{Read, Write};

use tokio::sync::mpsc;
use tracing::{debug, error, trace};

/// Default chunk size for reading PTY output.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Async reader for PTY output.
///
/// Runs in a blocking thread and sends output chunks through a channel.
pub struct AsyncPtyReader<R: Read + Send + 'static> {
    reader: R,
    tx: mpsc::Sender<Vec<u8>>,
    buffer_size: usize,
}

impl<R: Read + Send + 'static> AsyncPtyReader<R> {
    /// Create a new AsyncPtyReader.
    ///
    /// # Arguments
    ///
    /// * `reader` - Blocking reader, usually [`crate::SessionReader`].
    /// * `tx` - Channel sender for output data.
    pub fn new(reader: R, tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            reader,
            tx,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Create with custom buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Run the reader loop on a blocking thread.
    ///
    /// Returns when the session reaches end-of-stream or is closed, when the
    /// receiver is dropped, or on a transport error.
    pub async fn run(self) {
        let buffer_size = self.buffer_size;
        let mut reader = self.reader;
        let tx = self.tx;

        let result = tokio::task::spawn_blocking(move || {
            let mut buf = vec![0u8; buffer_size];

            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        debug!("PTY reader: end of stream");
                        break;
                    }
                    Ok(n) => {
                        trace!("PTY reader: read {} bytes", n);
                        if tx.blocking_send(buf[..n].to_vec()).is_err() {
                            debug!("PTY reader: channel closed");
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        error!("PTY reader error: {}", e);
                        break;
                    }
                }
            }
        })
        .await;

        if let Err(e) = result {
            error!("PTY reader task panicked: {}", e);
        }
    }
}

/// Async writer for PTY input.
///
/// Receives data through a channel and writes it on a blocking thread.
pub struct AsyncPtyWriter<W: Write + Send + 'static> {
    writer: W,
    rx: mpsc::Receiver<Vec<u8>>,
}

impl<W: Write + Send + 'static> AsyncPtyWriter<W> {
    /// Create a new AsyncPtyWriter.
    ///
    /// # Arguments
    ///
    /// * `writer` - Blocking writer, usually [`crate::SessionWriter`].
    /// * `rx` - Channel receiver for input data.
    pub fn new(writer: W, rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self { writer, rx }
    }

    /// Run the writer loop on a blocking thread.
    ///
    /// Returns the writer once every sender is dropped, or `None` after a
    /// write error.
    pub async fn run(self) -> Option<W> {
        let mut writer = self.writer;
        let mut rx = self.rx;

        let result = tokio::task::spawn_blocking(move || {
            while let Some(data) = rx.blocking_recv() {
                trace!("PTY writer: writing {} bytes", data.len());
                if let Err(e) = writer.write_all(&data).and_then(|()| writer.flush()) {
                    if e.kind() == std::io::ErrorKind::BrokenPipe {
                        debug!("PTY writer: broken pipe");
                    } else {
                        error!("PTY writer error: {}", e);
                    }
                    return None;
                }
            }
            debug!("PTY writer: channel closed");
            Some(writer)
        })
        .await;

        match result {
            Ok(writer) => writer,
            Err(e) => {
                error!("PTY writer task panicked: {}", e);
                None
            }
        }
    }
}
