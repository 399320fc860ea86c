//! Error types for pagetree.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pagetree.
///
/// Missing keys and duplicate inserts are not errors: they are reported as
/// `bool`/`Option` results by the index operations. This enum covers what
/// the caller cannot recover from by retrying with a different key.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents do not describe a valid index.
    #[error("corrupted index file: {0}")]
    Corrupted(String),

    /// The file was created with a different layout than requested.
    #[error("layout mismatch: {field} is {found} in the file, expected {expected}")]
    LayoutMismatch {
        field: &'static str,
        expected: u64,
        found: u64,
    },

    /// A record read would extend past the end of the file.
    #[error("record at offset {0} lies beyond the end of the file")]
    RecordOutOfBounds(u64),

    /// The node cache has no frame it can hand out.
    ///
    /// This indicates a bug - every occupied frame is tracked for eviction.
    #[error("no free frames available in node cache")]
    NoFreeFrames,

    /// The supplied configuration cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A structural invariant does not hold.
    ///
    /// Reported by [`BTree::verify`](crate::BTree::verify).
    #[error("integrity violation: {0}")]
    Integrity(String),
}
