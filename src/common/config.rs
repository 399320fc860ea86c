//! Configuration constants and tree options.

use crate::common::{Error, Result};

/// File magic stored in the first 8 bytes of the header record.
pub const MAGIC: [u8; 8] = *b"PGTREE\0\x01";

/// On-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Number of reclaimed offsets the header can remember.
///
/// Offsets released while the pool is full are dropped, so their records
/// are leaked until the file is rebuilt.
pub const FREE_POOL_CAPACITY: usize = 2000;

/// Size of the fixed header record at offset 0.
///
/// # Layout
/// ```text
/// Offset  Size        Field
/// ------  ----        -----
/// 0       8           magic
/// 8       4           format version
/// 12      4           branching factor (M)
/// 16      4           encoded value size
/// 20      4           free pool length
/// 24      8           root offset
/// 32      8           key count
/// 40      8           next allocation index
/// 48      8 × 2000    free pool slots
/// 16048   4           CRC32 of bytes 0..16048
/// ```
pub const HEADER_SIZE: usize = 48 + FREE_POOL_CAPACITY * 8 + 4;

/// Default branching factor.
pub const DEFAULT_ORDER: usize = 4;

/// Smallest branching factor that still allows a split to leave both
/// halves non-empty.
pub const MIN_ORDER: usize = 3;

/// Default number of node records held by the cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 3000;

/// Upper bound on descent depth.
///
/// With `M >= 3` a balanced tree this tall would hold more than 2^63 keys,
/// so reaching it means the child pointers form a cycle.
pub const MAX_HEIGHT: usize = 64;

/// Options for opening a [`BTree`](crate::BTree).
///
/// # Example
/// ```
/// use pagetree::TreeConfig;
///
/// let config = TreeConfig::builder().order(6).cache_capacity(16).build();
/// assert_eq!(config.order, 6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Branching factor `M`: maximum children per node, `M - 1` entries.
    ///
    /// Fixed for the lifetime of a file; reopening with another value fails.
    pub order: usize,

    /// Number of node records the cache keeps in memory.
    pub cache_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl TreeConfig {
    /// Create a new config builder.
    pub fn builder() -> TreeConfigBuilder {
        TreeConfigBuilder::default()
    }

    /// Minimum entry count of a non-root node: `ceil(M / 2) - 1`.
    #[inline]
    pub fn min_entries(&self) -> usize {
        self.order.div_ceil(2) - 1
    }

    /// Check that the options describe a usable tree.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if `order < 3`, `order` does not fit in
    /// a `u32`, or `cache_capacity` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER {
            return Err(Error::InvalidConfig(format!(
                "order must be at least {}, got {}",
                MIN_ORDER, self.order
            )));
        }
        if u32::try_from(self.order).is_err() {
            return Err(Error::InvalidConfig(format!(
                "order {} does not fit in the header",
                self.order
            )));
        }
        if self.cache_capacity == 0 {
            return Err(Error::InvalidConfig(
                "cache capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`TreeConfig`].
#[derive(Debug, Default)]
pub struct TreeConfigBuilder {
    config: TreeConfig,
}

impl TreeConfigBuilder {
    /// Set the branching factor.
    pub fn order(mut self, order: usize) -> Self {
        self.config.order = order;
        self
    }

    /// Set the number of cached node records.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn build(self) -> TreeConfig {
        self.config
    }
}
