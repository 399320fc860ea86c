//! Typed node access on top of the node cache.

use std::marker::PhantomData;

use crate::buffer::NodeCache;
use crate::common::config::MAX_HEIGHT;
use crate::common::{Error, FixedCodec, KeyHash, PageOffset, Result};
use crate::storage::record::{IndexHeader, Node, NodeLayout};

/// Where a descent for a key ended.
pub(super) struct Position<V> {
    pub offset: PageOffset,
    pub node: Node<V>,
    /// `Ok(i)` if `node.keys[i]` matches, `Err(i)` for the insertion slot in
    /// a leaf.
    pub slot: std::result::Result<usize, usize>,
}

/// Read and decode the node at `offset`.
///
/// Settled nodes hold at most `M - 1` entries; the overflow slot is never
/// written, so a full record is reported as corruption.
pub(super) fn read_node<V: FixedCodec>(
    cache: &mut NodeCache,
    layout: &NodeLayout,
    offset: PageOffset,
) -> Result<Node<V>> {
    let bytes = cache
        .read(offset)?
        .ok_or_else(|| Error::Corrupted("reference to an absent record".to_string()))?;
    let node = Node::decode(layout, bytes)?;
    if node.len() >= layout.order() {
        return Err(Error::Corrupted(format!(
            "node {} holds {} entries, order is {}",
            offset,
            node.len(),
            layout.order()
        )));
    }
    Ok(node)
}

/// Walk from `root` towards `hash`.
pub(super) fn descend<V: FixedCodec>(
    cache: &mut NodeCache,
    layout: &NodeLayout,
    root: PageOffset,
    hash: KeyHash,
) -> Result<Position<V>> {
    let mut offset = root;
    for _ in 0..MAX_HEIGHT {
        let node: Node<V> = read_node(cache, layout, offset)?;
        match node.search(hash) {
            Ok(at) => {
                return Ok(Position {
                    offset,
                    node,
                    slot: Ok(at),
                })
            }
            Err(at) if node.is_leaf() => {
                return Ok(Position {
                    offset,
                    node,
                    slot: Err(at),
                })
            }
            Err(at) => offset = node.children[at],
        }
    }
    Err(too_deep())
}

pub(super) fn too_deep() -> Error {
    Error::Corrupted(format!(
        "descent exceeded {} levels, child pointers form a cycle",
        MAX_HEIGHT
    ))
}

/// Mutable view of the tree used by insert and delete.
///
/// Bundles the cache, the record layout and the header so structural
/// changes can allocate, release and rewrite records in one place.
pub(super) struct NodeStore<'a, V> {
    cache: &'a mut NodeCache,
    layout: &'a NodeLayout,
    pub header: &'a mut IndexHeader,
    _marker: PhantomData<fn() -> V>,
}

impl<'a, V: FixedCodec> NodeStore<'a, V> {
    pub fn new(
        cache: &'a mut NodeCache,
        layout: &'a NodeLayout,
        header: &'a mut IndexHeader,
    ) -> Self {
        Self {
            cache,
            layout,
            header,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.layout.order()
    }

    /// Minimum entry count of a non-root node.
    #[inline]
    pub fn min_entries(&self) -> usize {
        self.layout.order().div_ceil(2) - 1
    }

    pub fn read(&mut self, offset: PageOffset) -> Result<Node<V>> {
        read_node(self.cache, self.layout, offset)
    }

    pub fn write(&mut self, offset: PageOffset, node: &Node<V>) -> Result<()> {
        self.cache.write(offset, &node.encode(self.layout))
    }

    pub fn descend(&mut self, hash: KeyHash) -> Result<Position<V>> {
        descend(self.cache, self.layout, self.header.root, hash)
    }

    /// Point `child` at a new parent without loading it.
    ///
    /// The caller must not hold a decoded copy of `child`.
    pub fn set_parent(&mut self, child: PageOffset, parent: PageOffset) -> Result<()> {
        self.cache.write_parent(child, parent)
    }

    pub fn set_parents(&mut self, children: &[PageOffset], parent: PageOffset) -> Result<()> {
        for &child in children {
            self.set_parent(child, parent)?;
        }
        Ok(())
    }

    pub fn allocate(&mut self) -> PageOffset {
        self.header.allocator.allocate()
    }

    pub fn release(&mut self, offset: PageOffset) {
        self.header.allocator.release(offset);
    }
}

/// Position of `child` among `parent`'s children.
pub(super) fn child_slot<V>(
    parent: &Node<V>,
    parent_offset: PageOffset,
    child: PageOffset,
) -> Result<usize> {
    parent
        .children
        .iter()
        .position(|&c| c == child)
        .ok_or_else(|| {
            Error::Corrupted(format!(
                "node {} is not a child of its parent {}",
                child, parent_offset
            ))
        })
}
