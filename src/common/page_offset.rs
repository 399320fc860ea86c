//! Page offset handle.

use std::fmt;

/// Byte offset of a node record in the index file.
///
/// Offsets are the index's pointers: parent and child links are stored as
/// `PageOffset`s. Only [`OffsetAllocator`](crate::storage::record::OffsetAllocator)
/// turns allocation indexes into offsets; everything else treats the value
/// as opaque.
///
/// # Example
/// ```
/// use pagetree::PageOffset;
///
/// let offset = PageOffset::new(16052);
/// assert!(offset.is_valid());
/// assert!(!PageOffset::INVALID.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageOffset(pub u64);

impl PageOffset {
    /// Sentinel for "no record": the root's parent and empty child slots.
    pub const INVALID: PageOffset = PageOffset(u64::MAX);

    /// Create a new PageOffset.
    #[inline]
    pub fn new(offset: u64) -> Self {
        PageOffset(offset)
    }

    /// Check if this offset is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Raw byte offset.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        PageOffset(u64::from_le_bytes(bytes))
    }
}

impl fmt::Display for PageOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "@INVALID")
        } else {
            write!(f, "@{}", self.0)
        }
    }
}
