//! Frame identifier type.

use std::fmt;

/// Identifies a frame (slot) in the node cache.
///
/// Frames live in a `Vec<Frame>` and the LRU list links them by index, so
/// this is a plain `usize` wrapper: `frames[frame_id.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Create a new FrameId.
    #[inline]
    pub fn new(id: usize) -> Self {
        FrameId(id)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}
