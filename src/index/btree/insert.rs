//! Insertion and node splitting.

use tracing::{debug, trace};

use crate::common::config::MAX_HEIGHT;
use crate::common::{FixedCodec, IndexKey, PageOffset, Result};
use crate::storage::record::Node;

use super::store::{child_slot, too_deep, NodeStore};
use super::BTree;

impl<K: IndexKey + ?Sized, V: FixedCodec> BTree<K, V> {
    /// Insert a new entry.
    ///
    /// Returns `false` without changing anything if the key's hash is
    /// already present. Existing values are updated with
    /// [`modify`](Self::modify).
    pub fn insert(&mut self, key: &K, value: V) -> Result<bool> {
        let hash = key.key_hash();
        let mut store = self.store();

        let found = store.descend(hash)?;
        let at = match found.slot {
            Ok(_) => return Ok(false),
            Err(at) => at,
        };

        let mut leaf = found.node;
        leaf.keys.insert(at, hash);
        leaf.values.insert(at, value);
        split_upward(&mut store, found.offset, leaf)?;

        store.header.len += 1;
        Ok(true)
    }
}

/// Write `node` back, splitting it and its ancestors while they overflow.
///
/// A node that reaches `M` entries keeps the entries below the median, the
/// median moves up, and the entries above it move to a new right sibling
/// that shares the parent. A root split grows the tree by one level.
fn split_upward<V: FixedCodec>(
    store: &mut NodeStore<'_, V>,
    mut offset: PageOffset,
    mut node: Node<V>,
) -> Result<()> {
    for _ in 0..MAX_HEIGHT {
        if node.len() < store.order() {
            return store.write(offset, &node);
        }

        let mid = node.len() / 2;
        let mut sibling = Node {
            parent: node.parent,
            keys: node.keys.split_off(mid + 1),
            values: node.values.split_off(mid + 1),
            children: if node.is_leaf() {
                Vec::new()
            } else {
                node.children.split_off(mid + 1)
            },
        };
        let up_key = node.keys.remove(mid);
        let up_value = node.values.remove(mid);

        let grows = !node.parent.is_valid();
        let sibling_offset = store.allocate();
        let parent_offset = if grows { store.allocate() } else { node.parent };
        node.parent = parent_offset;
        sibling.parent = parent_offset;

        store.set_parents(&sibling.children, sibling_offset)?;
        store.write(offset, &node)?;
        store.write(sibling_offset, &sibling)?;
        trace!(%offset, sibling = %sibling_offset, key = %up_key, "split node");

        if grows {
            let root = Node {
                parent: PageOffset::INVALID,
                keys: vec![up_key],
                values: vec![up_value],
                children: vec![offset, sibling_offset],
            };
            store.write(parent_offset, &root)?;
            store.header.root = parent_offset;
            debug!(root = %parent_offset, "root split, tree grew");
            return Ok(());
        }

        let mut parent = store.read(parent_offset)?;
        let at = child_slot(&parent, parent_offset, offset)?;
        parent.keys.insert(at, up_key);
        parent.values.insert(at, up_value);
        parent.children.insert(at + 1, sibling_offset);

        offset = parent_offset;
        node = parent;
    }
    Err(too_deep())
}

#[cfg(test)]
mod tests {
    use crate::common::{KeyHash, TreeConfig};
    use crate::BTree;
    use tempfile::tempdir;

    fn open(dir: &tempfile::TempDir, order: usize) -> BTree<i64, u64> {
        let config = TreeConfig::builder().order(order).cache_capacity(16).build();
        BTree::open_with_config(dir.path().join("tree.idx"), config).unwrap()
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let dir = tempdir().unwrap();
        let mut tree = open(&dir, 4);

        assert!(tree.insert(&5, 50).unwrap());
        assert!(!tree.insert(&5, 99).unwrap());
        assert_eq!(tree.find(&5).unwrap(), Some(50));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_first_split() {
        let dir = tempdir().unwrap();
        let mut tree = open(&dir, 4);

        for key in 1..=3 {
            tree.insert(&key, 0).unwrap();
        }
        assert_eq!(tree.height().unwrap(), 1);

        tree.insert(&4, 0).unwrap();
        assert_eq!(tree.height().unwrap(), 2);

        let report = tree.verify().unwrap();
        assert_eq!(report.root_keys, vec![KeyHash(3)]);
        assert_eq!(report.node_count, 3);
    }

    #[test]
    fn test_split_order_3() {
        let dir = tempdir().unwrap();
        let mut tree = open(&dir, 3);

        for key in 0..100 {
            assert!(tree.insert(&key, key as u64).unwrap());
            tree.verify().unwrap();
        }
        for key in 0..100 {
            assert_eq!(tree.find(&key).unwrap(), Some(key as u64));
        }
    }

    #[test]
    fn test_descending_inserts() {
        let dir = tempdir().unwrap();
        let mut tree = open(&dir, 5);

        for key in (0..200).rev() {
            assert!(tree.insert(&key, 1).unwrap());
        }
        let report = tree.verify().unwrap();
        assert_eq!(report.entry_count, 200);
        assert_eq!(tree.len(), 200);
    }
}
