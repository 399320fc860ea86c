//! Record offset allocation.

use tracing::debug;

use crate::common::config::HEADER_SIZE;
use crate::common::PageOffset;

use super::free_pool::FreePool;

/// Hands out node record offsets.
///
/// Records live at `HEADER_SIZE + index * record_size`. Index 0 is the
/// canonical root created with the file, so fresh allocations start at 1.
/// Reclaimed offsets are reused LIFO before the counter advances.
///
/// This is the only place where record offsets are computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetAllocator {
    record_size: u64,
    /// Allocation index of the next never-used record.
    next_index: u64,
    free_pool: FreePool,
}

impl OffsetAllocator {
    /// Allocator for a freshly created file.
    pub fn new(record_size: usize) -> Self {
        Self::restore(record_size, 1, FreePool::new())
    }

    /// Allocator resumed from header state.
    pub fn restore(record_size: usize, next_index: u64, free_pool: FreePool) -> Self {
        Self {
            record_size: record_size as u64,
            next_index,
            free_pool,
        }
    }

    /// Offset of the record with the given allocation index.
    #[inline]
    pub fn offset_of(&self, index: u64) -> PageOffset {
        PageOffset::new(HEADER_SIZE as u64 + index * self.record_size)
    }

    /// Offset of the root record of an empty tree.
    #[inline]
    pub fn canonical_root(&self) -> PageOffset {
        self.offset_of(0)
    }

    /// Take an offset for a new record.
    pub fn allocate(&mut self) -> PageOffset {
        if let Some(offset) = self.free_pool.pop() {
            return offset;
        }
        let offset = self.offset_of(self.next_index);
        self.next_index += 1;
        offset
    }

    /// Return a record offset for reuse.
    ///
    /// Dropped silently when the pool is full.
    pub fn release(&mut self, offset: PageOffset) {
        if !self.free_pool.push(offset) && self.free_pool.is_full() {
            debug!(%offset, "free pool full, leaking record");
        }
    }

    /// Make sure `offset` is not handed out again.
    pub fn reclaim(&mut self, offset: PageOffset) {
        self.free_pool.take(offset);
    }

    #[inline]
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    #[inline]
    pub fn free_pool(&self) -> &FreePool {
        &self.free_pool
    }

    #[inline]
    pub fn record_size(&self) -> usize {
        self.record_size as usize
    }
}
