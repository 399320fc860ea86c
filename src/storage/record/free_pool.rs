//! Free-offset pool.

use crate::common::config::FREE_POOL_CAPACITY;
use crate::common::PageOffset;

/// A bounded LIFO stack of reclaimed record offsets.
///
/// The pool lives inside the fixed-size header, so its capacity is fixed at
/// [`FREE_POOL_CAPACITY`]. Releasing an offset while the pool is full drops
/// it: the record is leaked, not reused. Offsets already in the pool are
/// not pushed twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreePool {
    slots: Vec<PageOffset>,
}

impl FreePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(FREE_POOL_CAPACITY),
        }
    }

    /// Rebuild a pool from persisted slots, bottom of the stack first.
    ///
    /// Slots past the capacity are ignored.
    pub fn from_slots(slots: impl IntoIterator<Item = PageOffset>) -> Self {
        let mut pool = Self::new();
        pool.slots.extend(slots.into_iter().take(FREE_POOL_CAPACITY));
        pool
    }

    /// Push a reclaimed offset.
    ///
    /// Returns `false` if the offset was dropped because the pool is full or
    /// already holds it.
    pub fn push(&mut self, offset: PageOffset) -> bool {
        if self.slots.len() == FREE_POOL_CAPACITY || self.slots.contains(&offset) {
            return false;
        }
        self.slots.push(offset);
        true
    }

    /// Pop the most recently pushed offset.
    #[inline]
    pub fn pop(&mut self) -> Option<PageOffset> {
        self.slots.pop()
    }

    /// Remove a specific offset, wherever it sits in the stack.
    pub fn take(&mut self, offset: PageOffset) -> bool {
        match self.slots.iter().position(|&slot| slot == offset) {
            Some(pos) => {
                self.slots.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Slots from the bottom of the stack to the top.
    #[inline]
    pub fn as_slice(&self) -> &[PageOffset] {
        &self.slots
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.len() == FREE_POOL_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_order() {
        let mut pool = FreePool::new();
        assert!(pool.push(PageOffset::new(10)));
        assert!(pool.push(PageOffset::new(20)));
        assert!(pool.push(PageOffset::new(30)));

        assert_eq!(pool.pop(), Some(PageOffset::new(30)));
        assert_eq!(pool.pop(), Some(PageOffset::new(20)));
        assert_eq!(pool.pop(), Some(PageOffset::new(10)));
        assert_eq!(pool.pop(), None);
    }

    #[test]
    fn test_push_deduplicates() {
        let mut pool = FreePool::new();
        assert!(pool.push(PageOffset::new(10)));
        assert!(!pool.push(PageOffset::new(10)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_full_pool_drops_pushes() {
        let mut pool = FreePool::new();
        for i in 0..FREE_POOL_CAPACITY as u64 {
            assert!(pool.push(PageOffset::new(i)));
        }
        assert!(pool.is_full());

        assert!(!pool.push(PageOffset::new(u64::MAX - 1)));
        assert_eq!(pool.len(), FREE_POOL_CAPACITY);
        assert_eq!(pool.pop(), Some(PageOffset::new(FREE_POOL_CAPACITY as u64 - 1)));
    }

    #[test]
    fn test_take() {
        let mut pool = FreePool::from_slots([10, 20, 30].map(PageOffset::new));
        assert!(pool.take(PageOffset::new(20)));
        assert!(!pool.take(PageOffset::new(20)));
        assert_eq!(pool.as_slice(), &[PageOffset::new(10), PageOffset::new(30)]);
    }
}
