//! The B-tree handle: open, lookup, update and lifecycle.

use std::marker::PhantomData;
use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::buffer::{NodeCache, StatsSnapshot};
use crate::common::config::{HEADER_SIZE, MAX_HEIGHT};
use crate::common::{Error, FixedCodec, IndexKey, PageOffset, Result, TreeConfig};
use crate::storage::record::{IndexHeader, Node, NodeLayout};
use crate::storage::DiskManager;

use super::store::{descend, read_node, too_deep, NodeStore};

/// A persistent B-tree mapping [`IndexKey`]s to fixed-size values.
///
/// All node access goes through a bounded [`NodeCache`]; the file is only
/// touched on cache misses, evictions and flush points. The header is
/// written by [`flush`](Self::flush), [`close`](Self::close) and on drop.
///
/// # Example
/// ```no_run
/// use pagetree::BTree;
///
/// let mut tree: BTree<str, u64> = BTree::open("words.idx")?;
/// tree.insert("apple", 1)?;
/// assert_eq!(tree.find("apple")?, Some(1));
/// tree.close()?;
/// # Ok::<(), pagetree::Error>(())
/// ```
///
/// # Concurrency
/// Mutating operations take `&mut self`. Lookups take `&self` and lock the
/// cache, since reading a record updates its recency.
pub struct BTree<K: ?Sized, V> {
    pub(super) header: IndexHeader,
    pub(super) cache: Mutex<NodeCache>,
    pub(super) layout: NodeLayout,
    config: TreeConfig,
    closed: bool,
    _marker: PhantomData<fn(&K) -> V>,
}

impl<K: IndexKey + ?Sized, V: FixedCodec> BTree<K, V> {
    /// Open or create an index with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, TreeConfig::default())
    }

    /// Open or create an index.
    ///
    /// A missing or empty file gets a fresh header and an empty root. An
    /// existing file must have been created with the same order and value
    /// size.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if `config` fails validation
    /// - `Error::Corrupted` if the header is damaged or truncated
    /// - `Error::LayoutMismatch` if the file uses another order or value size
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let layout = NodeLayout::new(config.order, V::ENCODED_LEN);
        let mut disk = DiskManager::open_or_create(&path)?;

        let header = if disk.is_empty() {
            let header = IndexHeader::new(&layout);
            let root: Node<V> = Node::new_leaf(PageOffset::INVALID);
            disk.write_at(0, &header.encode())?;
            disk.write_at(header.root.get(), &root.encode(&layout))?;
            disk.sync()?;
            debug!(
                path = %path.as_ref().display(),
                order = config.order,
                value_size = V::ENCODED_LEN,
                "created index file"
            );
            header
        } else {
            let mut buf = vec![0u8; HEADER_SIZE];
            disk.read_at(0, &mut buf).map_err(|err| match err {
                Error::RecordOutOfBounds(_) => {
                    Error::Corrupted("file is shorter than the header".to_string())
                }
                other => other,
            })?;
            let header = IndexHeader::decode(&buf)?;
            check_layout("order", layout.order(), header.order)?;
            check_layout("value size", layout.value_size(), header.value_size)?;
            debug!(
                path = %path.as_ref().display(),
                root = %header.root,
                len = header.len,
                "opened index file"
            );
            header
        };

        Ok(Self {
            header,
            cache: Mutex::new(NodeCache::new(
                config.cache_capacity,
                layout.record_size(),
                disk,
            )),
            layout,
            config,
            closed: false,
            _marker: PhantomData,
        })
    }

    /// Look up the value stored under `key`.
    pub fn find(&self, key: &K) -> Result<Option<V>> {
        let mut cache = self.cache.lock();
        let mut found = descend::<V>(&mut cache, &self.layout, self.header.root, key.key_hash())?;
        Ok(match found.slot {
            Ok(at) => Some(found.node.values.swap_remove(at)),
            Err(_) => None,
        })
    }

    /// Replace the value of an existing key.
    ///
    /// Returns `false` if the key is absent; nothing is inserted.
    pub fn modify(&mut self, key: &K, value: V) -> Result<bool> {
        let mut store = self.store();
        let mut found = store.descend(key.key_hash())?;
        match found.slot {
            Ok(at) => {
                found.node.values[at] = value;
                store.write(found.offset, &found.node)?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Number of levels from the root to the leaves; 1 for a lone root.
    pub fn height(&self) -> Result<usize> {
        let mut cache = self.cache.lock();
        let mut offset = self.header.root;
        for height in 1..=MAX_HEIGHT {
            let node: Node<V> = read_node(&mut cache, &self.layout, offset)?;
            match node.children.first() {
                Some(&child) => offset = child,
                None => return Ok(height),
            }
        }
        Err(too_deep())
    }

    pub(super) fn store(&mut self) -> NodeStore<'_, V> {
        NodeStore::new(self.cache.get_mut(), &self.layout, &mut self.header)
    }
}

impl<K: ?Sized, V> BTree<K, V> {
    /// Number of keys in the tree.
    #[inline]
    pub fn len(&self) -> u64 {
        self.header.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.header.len == 0
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Offset of the current root record.
    pub fn root(&self) -> PageOffset {
        self.header.root
    }

    /// Snapshot of the node cache counters.
    pub fn cache_stats(&self) -> StatsSnapshot {
        self.cache.lock().stats().snapshot()
    }

    /// Write every cached record and the header, then sync the file.
    pub fn flush(&mut self) -> Result<()> {
        let cache = self.cache.get_mut();
        cache.flush_all()?;

        let disk = cache.disk_mut();
        disk.write_at(0, &self.header.encode())?;
        disk.sync()?;

        debug!(root = %self.header.root, len = self.header.len, "flushed index");
        Ok(())
    }

    /// Flush and close the index.
    pub fn close(mut self) -> Result<()> {
        let result = self.flush();
        self.closed = true;
        if result.is_ok() {
            debug!(len = self.header.len, "closed index");
        }
        result
    }
}

impl<K: ?Sized, V> Drop for BTree<K, V> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.flush() {
            error!(error = %err, "failed to flush index on drop");
        }
    }
}

fn check_layout(field: &'static str, expected: usize, found: u32) -> Result<()> {
    if expected as u64 != u64::from(found) {
        return Err(Error::LayoutMismatch {
            field,
            expected: expected as u64,
            found: u64::from(found),
        });
    }
    Ok(())
}
