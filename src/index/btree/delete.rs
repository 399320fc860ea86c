//! Deletion and rebalancing.

use tracing::{debug, trace};

use crate::common::config::MAX_HEIGHT;
use crate::common::{Error, FixedCodec, IndexKey, PageOffset, Result};
use crate::storage::record::Node;

use super::store::{child_slot, too_deep, NodeStore};
use super::BTree;

impl<K: IndexKey + ?Sized, V: FixedCodec> BTree<K, V> {
    /// Remove the entry stored under `key`.
    ///
    /// Returns `false` if the key is absent.
    pub fn delete(&mut self, key: &K) -> Result<bool> {
        let mut store = self.store();

        let found = store.descend(key.key_hash())?;
        let at = match found.slot {
            Ok(at) => at,
            Err(_) => return Ok(false),
        };
        let (offset, mut node) = (found.offset, found.node);

        let (leaf_offset, leaf) = if node.is_leaf() {
            node.keys.remove(at);
            node.values.remove(at);
            (offset, node)
        } else {
            // Replace with the in-order successor, then remove that instead.
            let (successor_offset, mut successor) =
                leftmost_leaf(&mut store, node.children[at + 1])?;
            if successor.is_empty() {
                return Err(Error::Corrupted(format!(
                    "empty leaf {} below node {}",
                    successor_offset, offset
                )));
            }
            node.keys[at] = successor.keys.remove(0);
            node.values[at] = successor.values.remove(0);
            store.write(offset, &node)?;
            (successor_offset, successor)
        };

        rebalance(&mut store, leaf_offset, leaf)?;
        store.header.len = store.header.len.saturating_sub(1);
        Ok(true)
    }
}

fn leftmost_leaf<V: FixedCodec>(
    store: &mut NodeStore<'_, V>,
    mut offset: PageOffset,
) -> Result<(PageOffset, Node<V>)> {
    for _ in 0..MAX_HEIGHT {
        let node = store.read(offset)?;
        if node.is_leaf() {
            return Ok((offset, node));
        }
        offset = node.children[0];
    }
    Err(too_deep())
}

/// Write `node` back after it lost an entry, restoring minimum occupancy
/// from the bottom up.
///
/// An underfull node first borrows through its parent from a sibling with
/// entries to spare, left before right. Otherwise it merges with a sibling
/// and the separator comes down from the parent, which may in turn become
/// underfull. An emptied root is replaced by its only child.
fn rebalance<V: FixedCodec>(
    store: &mut NodeStore<'_, V>,
    mut offset: PageOffset,
    mut node: Node<V>,
) -> Result<()> {
    let min = store.min_entries();

    for _ in 0..MAX_HEIGHT {
        if !node.parent.is_valid() {
            store.write(offset, &node)?;
            if node.is_leaf() && node.is_empty() {
                reset_empty_root(store, offset)?;
            }
            return Ok(());
        }
        if node.len() >= min {
            return store.write(offset, &node);
        }

        let parent_offset = node.parent;
        let mut parent = store.read(parent_offset)?;
        let at = child_slot(&parent, parent_offset, offset)?;

        let mut left = None;
        if at > 0 {
            let left_offset = parent.children[at - 1];
            let mut sibling = store.read(left_offset)?;
            check_same_depth(&node, &sibling, left_offset)?;

            if sibling.len() > min {
                let last = sibling.len() - 1;
                let key = std::mem::replace(&mut parent.keys[at - 1], sibling.keys.remove(last));
                let value =
                    std::mem::replace(&mut parent.values[at - 1], sibling.values.remove(last));
                node.keys.insert(0, key);
                node.values.insert(0, value);
                if let Some(child) = sibling.children.pop() {
                    store.set_parent(child, offset)?;
                    node.children.insert(0, child);
                }

                store.write(left_offset, &sibling)?;
                store.write(offset, &node)?;
                trace!(%offset, from = %left_offset, "rotated entry from left sibling");
                return store.write(parent_offset, &parent);
            }
            left = Some((left_offset, sibling));
        }

        let mut right = None;
        if let Some(&right_offset) = parent.children.get(at + 1) {
            let mut sibling = store.read(right_offset)?;
            check_same_depth(&node, &sibling, right_offset)?;

            if sibling.len() > min {
                let key = std::mem::replace(&mut parent.keys[at], sibling.keys.remove(0));
                let value = std::mem::replace(&mut parent.values[at], sibling.values.remove(0));
                node.keys.push(key);
                node.values.push(value);
                if !sibling.is_leaf() {
                    let child = sibling.children.remove(0);
                    store.set_parent(child, offset)?;
                    node.children.push(child);
                }

                store.write(right_offset, &sibling)?;
                store.write(offset, &node)?;
                trace!(%offset, from = %right_offset, "rotated entry from right sibling");
                return store.write(parent_offset, &parent);
            }
            right = Some((right_offset, sibling));
        }

        let (survivor_offset, mut survivor) = match (left, right) {
            (Some((left_offset, mut sibling)), _) => {
                sibling.keys.push(parent.keys.remove(at - 1));
                sibling.values.push(parent.values.remove(at - 1));
                parent.children.remove(at);

                store.set_parents(&node.children, left_offset)?;
                sibling.keys.append(&mut node.keys);
                sibling.values.append(&mut node.values);
                sibling.children.append(&mut node.children);
                store.release(offset);

                trace!(%offset, into = %left_offset, "merged node into left sibling");
                (left_offset, sibling)
            }
            (None, Some((right_offset, mut sibling))) => {
                node.keys.push(parent.keys.remove(at));
                node.values.push(parent.values.remove(at));
                parent.children.remove(at + 1);

                store.set_parents(&sibling.children, offset)?;
                node.keys.append(&mut sibling.keys);
                node.values.append(&mut sibling.values);
                node.children.append(&mut sibling.children);
                store.release(right_offset);

                trace!(%offset, from = %right_offset, "merged right sibling into node");
                (offset, node)
            }
            (None, None) => {
                return Err(Error::Corrupted(format!(
                    "node {} has a single child",
                    parent_offset
                )))
            }
        };

        if !parent.parent.is_valid() && parent.is_empty() {
            survivor.parent = PageOffset::INVALID;
            store.write(survivor_offset, &survivor)?;
            store.release(parent_offset);
            store.header.root = survivor_offset;
            debug!(root = %survivor_offset, "root collapsed, tree shrank");
            return Ok(());
        }

        store.write(survivor_offset, &survivor)?;
        offset = parent_offset;
        node = parent;
    }
    Err(too_deep())
}

/// Move an emptied leaf root back to the canonical root offset.
fn reset_empty_root<V: FixedCodec>(
    store: &mut NodeStore<'_, V>,
    offset: PageOffset,
) -> Result<()> {
    let canonical = store.header.allocator.canonical_root();
    if offset == canonical {
        return Ok(());
    }

    store.release(offset);
    store.header.allocator.reclaim(canonical);
    store.write(canonical, &Node::new_leaf(PageOffset::INVALID))?;
    store.header.root = canonical;
    debug!(from = %offset, "tree emptied, root reset");
    Ok(())
}

fn check_same_depth<V: FixedCodec>(
    node: &Node<V>,
    sibling: &Node<V>,
    sibling_offset: PageOffset,
) -> Result<()> {
    if node.is_leaf() != sibling.is_leaf() {
        return Err(Error::Corrupted(format!(
            "sibling {} is not at the same depth",
            sibling_offset
        )));
    }
    Ok(())
}
