//! Index header record.
//!
//! The header sits at offset 0 and holds everything needed to resume the
//! tree: layout parameters, the root offset, the key count and the
//! allocator state. It carries a CRC32 so a damaged or foreign file is
//! rejected at open instead of being walked.

use crate::common::config::{FORMAT_VERSION, FREE_POOL_CAPACITY, HEADER_SIZE, MAGIC};
use crate::common::{Error, PageOffset, Result};

use super::allocator::OffsetAllocator;
use super::free_pool::FreePool;
use super::node::NodeLayout;

/// In-memory copy of the header record.
///
/// The header is read once at open and written back at flush points. It is
/// not rewritten after each mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    /// Branching factor `M`.
    pub order: u32,
    /// Encoded size of one value.
    pub value_size: u32,
    /// Offset of the root node record.
    pub root: PageOffset,
    /// Number of keys in the tree.
    pub len: u64,
    /// Record offset allocation state.
    pub allocator: OffsetAllocator,
}

impl IndexHeader {
    pub const OFFSET_MAGIC: usize = 0;
    pub const OFFSET_VERSION: usize = 8;
    pub const OFFSET_ORDER: usize = 12;
    pub const OFFSET_VALUE_SIZE: usize = 16;
    pub const OFFSET_POOL_LEN: usize = 20;
    pub const OFFSET_ROOT: usize = 24;
    pub const OFFSET_LEN: usize = 32;
    pub const OFFSET_NEXT_INDEX: usize = 40;
    pub const OFFSET_POOL: usize = 48;
    pub const OFFSET_CHECKSUM: usize = Self::OFFSET_POOL + FREE_POOL_CAPACITY * 8;

    /// Header of a new, empty tree whose root sits at the canonical offset.
    pub fn new(layout: &NodeLayout) -> Self {
        let allocator = OffsetAllocator::new(layout.record_size());
        Self {
            order: layout.order() as u32,
            value_size: layout.value_size() as u32,
            root: allocator.canonical_root(),
            len: 0,
            allocator,
        }
    }

    /// Layout of the node records described by this header.
    pub fn layout(&self) -> NodeLayout {
        NodeLayout::new(self.order as usize, self.value_size as usize)
    }

    /// Serialize into a `HEADER_SIZE` buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        let pool = self.allocator.free_pool().as_slice();

        buf[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 8].copy_from_slice(&MAGIC);
        put_u32(&mut buf, Self::OFFSET_VERSION, FORMAT_VERSION);
        put_u32(&mut buf, Self::OFFSET_ORDER, self.order);
        put_u32(&mut buf, Self::OFFSET_VALUE_SIZE, self.value_size);
        put_u32(&mut buf, Self::OFFSET_POOL_LEN, pool.len() as u32);
        put_u64(&mut buf, Self::OFFSET_ROOT, self.root.get());
        put_u64(&mut buf, Self::OFFSET_LEN, self.len);
        put_u64(&mut buf, Self::OFFSET_NEXT_INDEX, self.allocator.next_index());
        for (i, offset) in pool.iter().enumerate() {
            put_u64(&mut buf, Self::OFFSET_POOL + i * 8, offset.get());
        }

        let checksum = crc32fast::hash(&buf[..Self::OFFSET_CHECKSUM]);
        put_u32(&mut buf, Self::OFFSET_CHECKSUM, checksum);
        buf
    }

    /// Parse and validate a header.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the buffer is short, the magic, version
    /// or checksum do not match, or the stored fields are inconsistent.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::Corrupted(format!(
                "header is {} bytes, expected {}",
                buf.len(),
                HEADER_SIZE
            )));
        }
        if buf[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 8] != MAGIC {
            return Err(Error::Corrupted("bad magic".to_string()));
        }

        let stored = get_u32(buf, Self::OFFSET_CHECKSUM);
        let computed = crc32fast::hash(&buf[..Self::OFFSET_CHECKSUM]);
        if stored != computed {
            return Err(Error::Corrupted(format!(
                "header checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            )));
        }

        let version = get_u32(buf, Self::OFFSET_VERSION);
        if version != FORMAT_VERSION {
            return Err(Error::Corrupted(format!(
                "unsupported format version {}",
                version
            )));
        }

        let order = get_u32(buf, Self::OFFSET_ORDER);
        let value_size = get_u32(buf, Self::OFFSET_VALUE_SIZE);
        let pool_len = get_u32(buf, Self::OFFSET_POOL_LEN) as usize;
        if pool_len > FREE_POOL_CAPACITY {
            return Err(Error::Corrupted(format!(
                "free pool length {} exceeds capacity",
                pool_len
            )));
        }

        let layout = NodeLayout::new(order as usize, value_size as usize);
        let slots = (0..pool_len)
            .map(|i| PageOffset::new(get_u64(buf, Self::OFFSET_POOL + i * 8)));
        let allocator = OffsetAllocator::restore(
            layout.record_size(),
            get_u64(buf, Self::OFFSET_NEXT_INDEX),
            FreePool::from_slots(slots),
        );

        Ok(Self {
            order,
            value_size,
            root: PageOffset::new(get_u64(buf, Self::OFFSET_ROOT)),
            len: get_u64(buf, Self::OFFSET_LEN),
            allocator,
        })
    }
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

fn get_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(bytes)
}

fn get_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

// ============================================================================
// TESTS
// ============================================================================
