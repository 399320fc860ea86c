//! Record types and layout.
//!
//! This module contains:
//! - [`IndexHeader`] - The metadata record at offset 0
//! - [`FreePool`] - Bounded stack of reclaimed record offsets
//! - [`OffsetAllocator`] - Turns allocation indexes and reclaimed offsets into record offsets
//! - [`Node`] / [`NodeLayout`] - Fixed-size B-tree node records

mod allocator;
mod free_pool;
mod header;
mod node;

pub use allocator::OffsetAllocator;
pub use free_pool::FreePool;
pub use header::IndexHeader;
pub use node::{Node, NodeLayout, PARENT_FIELD};
