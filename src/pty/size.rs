//! Terminal viewport size.

use portable_pty::PtySize as NativePtySize;

use crate::error::PtyError;
use crate::Result;

/// Size of a PTY viewport in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Number of columns (width).
    pub cols: u16,
    /// Number of rows (height).
    pub rows: u16,
}

impl WindowSize {
    /// Initial size used until the caller resizes.
    pub const DEFAULT: WindowSize = WindowSize { cols: 80, rows: 25 };

    /// Create a new WindowSize with the given dimensions.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Create a WindowSize, rejecting zero dimensions.
    pub fn checked(cols: u16, rows: u16) -> Result<Self> {
        if cols == 0 || rows == 0 {
            return Err(PtyError::InvalidSize { cols, rows });
        }
        Ok(Self { cols, rows })
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<WindowSize> for NativePtySize {
    fn from(size: WindowSize) -> Self {
        NativePtySize {
            rows: size.rows,
            cols: size.cols,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

impl From<NativePtySize> for WindowSize {
    fn from(size: NativePtySize) -> Self {
        WindowSize {
            cols: size.cols,
            rows: size.rows,
        }
    }
}
