//! Eviction policy implementations (replacers).
//!
//! - [`LruReplacer`] - Least-recently-used, used by the node cache

mod lru;

pub use lru::LruReplacer;
