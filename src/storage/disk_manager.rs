//! Disk Manager - low-level positional file I/O.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing fixed-size records at byte offsets
//! - Partial writes of a single field inside a record
//! - Tracking the logical file length

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::{Error, Result};

/// Manages I/O for a single index file.
///
/// # File Layout
/// ```text
/// ┌──────────┬──────────┬──────────┬─────┬──────────┐
/// │  Header  │ Record 0 │ Record 1 │ ... │ Record K │
/// │ (16052B) │ (fixed)  │ (fixed)  │     │ (fixed)  │
/// └──────────┴──────────┴──────────┴─────┴──────────┘
/// ```
///
/// The disk manager knows nothing about that layout; callers pass byte
/// offsets. The only rule it enforces is that reads stay inside the file.
///
/// # Durability
/// Writes are not synced individually. [`sync`](Self::sync) is called at
/// flush points; there is no crash consistency between them.
pub struct DiskManager {
    file: File,
    /// Current file length in bytes.
    len: u64,
}

impl DiskManager {
    /// Create a new index file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self { file, len: 0 })
    }

    /// Open an existing index file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();

        Ok(Self { file, len })
    }

    /// Open an existing file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Fill `buf` with the bytes stored at `offset`.
    ///
    /// # Errors
    /// Returns `Error::RecordOutOfBounds` if the range extends past the end
    /// of the file.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let end = offset
            .checked_add(buf.len() as u64)
            .ok_or(Error::RecordOutOfBounds(offset))?;
        if end > self.len {
            return Err(Error::RecordOutOfBounds(offset));
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    /// Write `buf` at `offset`, extending the file if needed.
    pub fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)?;

        self.len = self.len.max(offset + buf.len() as u64);
        Ok(())
    }

    /// Flush OS buffers to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Current file length in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the file holds no bytes at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
