//! pagetree - a persistent single-file B-tree index with a bounded
//! write-back node cache.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            pagetree                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/)                        │   │
//! │  │   BTree: find | modify | insert/split | delete/merge    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Node Cache (buffer/)                        │   │
//! │  │   NodeCache + Frame + LruReplacer + CacheStats          │   │
//! │  │   write-back on eviction, parent-only patches           │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Storage Layer (storage/)                    │   │
//! │  │   DiskManager + IndexHeader + Node records              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageOffset, FrameId, KeyHash, Error, config)
//! - [`buffer`] - Node cache and the LRU replacement policy
//! - [`storage`] - File I/O and record formats
//! - [`index`] - The B-tree
//!
//! # Keys
//! Keys are stored as 64-bit hashes. Integer keys hash to themselves, so an
//! integer index iterates in key order. String and byte keys hash with
//! XXH64; two keys with the same hash are the same entry.
//!
//! # Quick Start
//! ```no_run
//! use pagetree::{BTree, TreeConfig};
//!
//! let config = TreeConfig::builder().order(64).cache_capacity(1024).build();
//! let mut tree: BTree<i64, [u8; 16]> = BTree::open_with_config("orders.idx", config)?;
//!
//! tree.insert(&42, *b"forty-two\0\0\0\0\0\0\0")?;
//! assert!(tree.find(&42)?.is_some());
//! assert!(tree.delete(&42)?);
//!
//! tree.close()?;
//! # Ok::<(), pagetree::Error>(())
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::{Error, FixedCodec, FrameId, IndexKey, KeyHash, PageOffset, Result};
pub use common::{TreeConfig, TreeConfigBuilder};

pub use buffer::{CacheStats, NodeCache, StatsSnapshot};
pub use index::{BTree, IntegrityReport};
pub use storage::DiskManager;
