//! Node cache management.
//!
//! The node cache is the in-memory layer between the B-tree and the index
//! file. It holds a bounded number of node records and writes them back
//! when they are evicted or flushed.
//!
//! # Components
//! - [`NodeCache`] - The write-back record cache
//! - [`Frame`] - A slot in the cache holding one record
//! - [`CacheStats`] - Performance statistics
//! - [`replacer`] - The LRU eviction policy

mod frame;
mod node_cache;
pub mod replacer;
mod stats;

pub use frame::Frame;
pub use node_cache::NodeCache;
pub use stats::{CacheStats, StatsSnapshot};
