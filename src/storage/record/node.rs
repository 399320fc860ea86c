//! B-tree node records.

use std::ops::Range;

use crate::common::{Error, FixedCodec, KeyHash, PageOffset, Result};

/// Byte range of the parent offset inside every node record.
///
/// The parent link comes first so it can be rewritten on its own, without
/// touching the rest of the record.
pub const PARENT_FIELD: Range<usize> = 0..8;

const COUNT_FIELD: Range<usize> = 8..12;
const KEYS_START: usize = 12;
const KEY_SIZE: usize = 8;
const CHILD_SIZE: usize = 8;

/// Byte layout of a node record for branching factor `M` and a given value
/// size.
///
/// # Layout
/// ```text
/// Offset              Size        Field
/// ------              ----        -----
/// 0                   8           parent offset
/// 8                   4           entry count
/// 12                  8 × M       key hashes
/// 12 + 8M             V × M       values
/// 12 + (8 + V)M       8 × (M+1)   child offsets
/// ```
///
/// There are `M` key and value slots although a settled node holds at most
/// `M - 1` entries: the extra slot holds the overflow entry between an
/// insert and the split that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    order: usize,
    value_size: usize,
}

impl NodeLayout {
    pub fn new(order: usize, value_size: usize) -> Self {
        Self { order, value_size }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn value_size(&self) -> usize {
        self.value_size
    }

    #[inline]
    fn values_start(&self) -> usize {
        KEYS_START + self.order * KEY_SIZE
    }

    #[inline]
    fn children_start(&self) -> usize {
        self.values_start() + self.order * self.value_size
    }

    /// Size in bytes of one node record.
    #[inline]
    pub fn record_size(&self) -> usize {
        self.children_start() + (self.order + 1) * CHILD_SIZE
    }
}

/// Decoded node record.
///
/// `children` is empty for a leaf and holds `keys.len() + 1` offsets for an
/// internal node: `children[i]` precedes `keys[i]` precedes `children[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<V> {
    pub parent: PageOffset,
    pub keys: Vec<KeyHash>,
    pub values: Vec<V>,
    pub children: Vec<PageOffset>,
}

impl<V: FixedCodec> Node<V> {
    /// An empty leaf.
    pub fn new_leaf(parent: PageOffset) -> Self {
        Self {
            parent,
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Position of the first entry `>= hash`: `Ok` on an exact match.
    #[inline]
    pub fn search(&self, hash: KeyHash) -> std::result::Result<usize, usize> {
        self.keys.binary_search(&hash)
    }

    /// Serialize into a fresh record buffer.
    pub fn encode(&self, layout: &NodeLayout) -> Vec<u8> {
        let mut buf = vec![0u8; layout.record_size()];
        self.encode_into(layout, &mut buf);
        buf
    }

    /// Serialize into `buf`, which must be `layout.record_size()` bytes.
    ///
    /// # Panics
    /// Panics if the node holds more than `M` entries or its child count does
    /// not match its entry count. Either means a split or merge went wrong.
    pub fn encode_into(&self, layout: &NodeLayout, buf: &mut [u8]) {
        let count = self.keys.len();
        assert!(
            count <= layout.order,
            "node holds {} entries, record has room for {}",
            count,
            layout.order
        );
        assert_eq!(count, self.values.len(), "key/value count mismatch");
        assert!(
            self.children.is_empty() || self.children.len() == count + 1,
            "node with {} entries has {} children",
            count,
            self.children.len()
        );

        buf[PARENT_FIELD].copy_from_slice(&self.parent.to_le_bytes());
        buf[COUNT_FIELD].copy_from_slice(&(count as u32).to_le_bytes());

        let keys_end = layout.values_start();
        buf[KEYS_START..keys_end].fill(0);
        for (i, key) in self.keys.iter().enumerate() {
            let at = KEYS_START + i * KEY_SIZE;
            buf[at..at + KEY_SIZE].copy_from_slice(&key.to_le_bytes());
        }

        let values_start = layout.values_start();
        buf[values_start..layout.children_start()].fill(0);
        for (i, value) in self.values.iter().enumerate() {
            let at = values_start + i * layout.value_size;
            value.encode_into(&mut buf[at..at + layout.value_size]);
        }

        let children_start = layout.children_start();
        for slot in 0..=layout.order {
            let child = self.children.get(slot).copied().unwrap_or(PageOffset::INVALID);
            let at = children_start + slot * CHILD_SIZE;
            buf[at..at + CHILD_SIZE].copy_from_slice(&child.to_le_bytes());
        }
    }

    /// Parse a record buffer.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the buffer has the wrong size, the entry
    /// count exceeds `M`, or an internal node has an absent child.
    pub fn decode(layout: &NodeLayout, buf: &[u8]) -> Result<Self> {
        if buf.len() != layout.record_size() {
            return Err(Error::Corrupted(format!(
                "node record is {} bytes, expected {}",
                buf.len(),
                layout.record_size()
            )));
        }

        let parent = PageOffset::from_le_bytes(read_8(buf, PARENT_FIELD.start));
        let mut count_bytes = [0u8; 4];
        count_bytes.copy_from_slice(&buf[COUNT_FIELD]);
        let count = u32::from_le_bytes(count_bytes) as usize;
        if count > layout.order {
            return Err(Error::Corrupted(format!(
                "node entry count {} exceeds order {}",
                count, layout.order
            )));
        }

        let keys = (0..count)
            .map(|i| KeyHash::from_le_bytes(read_8(buf, KEYS_START + i * KEY_SIZE)))
            .collect();

        let values_start = layout.values_start();
        let values = (0..count)
            .map(|i| {
                let at = values_start + i * layout.value_size;
                V::decode_from(&buf[at..at + layout.value_size])
            })
            .collect();

        let children_start = layout.children_start();
        let first_child = PageOffset::from_le_bytes(read_8(buf, children_start));
        let children = if first_child.is_valid() {
            let children: Vec<PageOffset> = (0..=count)
                .map(|i| PageOffset::from_le_bytes(read_8(buf, children_start + i * CHILD_SIZE)))
                .collect();
            if children.iter().any(|child| !child.is_valid()) {
                return Err(Error::Corrupted(
                    "internal node with an absent child".to_string(),
                ));
            }
            children
        } else {
            Vec::new()
        };

        Ok(Self {
            parent,
            keys,
            values,
            children,
        })
    }
}

fn read_8(buf: &[u8], at: usize) -> [u8; 8] {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    bytes
}
