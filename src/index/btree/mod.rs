//! Disk-resident B-tree index.
//!
//! # Structure
//! ```text
//!                    ┌───────────────┐
//!                    │ root  [9]     │   header.root
//!                    └──────┬────────┘
//!              ┌────────────┴────────────┐
//!       ┌──────┴──────┐           ┌──────┴──────┐
//!       │ [3, 6]      │           │ [12]        │
//!       └─┬────┬────┬─┘           └──┬───────┬──┘
//!        ...  ...  ...              ...     ...
//! ```
//!
//! Every node is a fixed-size record addressed by its file offset and
//! carries a link to its parent. Splits and merges move children between
//! records and repoint them with a parent-only write, so a child never has
//! to be loaded just to be moved.
//!
//! - [`BTree`] - open, find, modify and lifecycle (`tree.rs`)
//! - insertion with upward splits (`insert.rs`)
//! - deletion with rotations and merges (`delete.rs`)
//! - [`IntegrityReport`] and the debug dump (`verify.rs`)

mod delete;
mod insert;
mod store;
mod tree;
mod verify;

pub use tree::BTree;
pub use verify::IntegrityReport;
