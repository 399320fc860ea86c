//! Frame - a slot in the node cache.
//!
//! A [`Frame`] holds one node record's bytes plus the offset it was loaded
//! from. There is no dirty flag: every resident record is written back when
//! it leaves the cache.

use crate::common::PageOffset;
use crate::storage::record::PARENT_FIELD;

/// A slot in the node cache holding one record.
pub struct Frame {
    /// Which record is loaded, or None if the frame is free.
    offset: Option<PageOffset>,

    /// Record bytes, `record_size` long.
    data: Box<[u8]>,
}

impl Frame {
    /// Create an empty frame sized for one record.
    pub fn new(record_size: usize) -> Self {
        Self {
            offset: None,
            data: vec![0u8; record_size].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn offset(&self) -> Option<PageOffset> {
        self.offset
    }

    #[inline]
    pub fn set_offset(&mut self, offset: Option<PageOffset>) {
        self.offset = offset;
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite the parent link in place.
    #[inline]
    pub fn patch_parent(&mut self, parent: PageOffset) {
        self.data[PARENT_FIELD].copy_from_slice(&parent.to_le_bytes());
    }

    /// Check if the frame is empty (no record loaded).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offset.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_new() {
        let frame = Frame::new(64);
        assert!(frame.is_empty());
        assert_eq!(frame.data().len(), 64);
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_frame_offset() {
        let mut frame = Frame::new(16);
        frame.set_offset(Some(PageOffset::new(4096)));
        assert!(!frame.is_empty());
        assert_eq!(frame.offset(), Some(PageOffset::new(4096)));

        frame.set_offset(None);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_patch_parent_touches_only_parent_field() {
        let mut frame = Frame::new(16);
        frame.data_mut().fill(0xAA);

        frame.patch_parent(PageOffset::new(7));

        assert_eq!(&frame.data()[PARENT_FIELD], &7u64.to_le_bytes());
        assert!(frame.data()[PARENT_FIELD.end..].iter().all(|&b| b == 0xAA));
    }
}
