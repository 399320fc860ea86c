//! Storage layer - file I/O and record formats.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Positional file I/O
//! - [`record`] - Header and node record layouts, offset allocation

mod disk_manager;
pub mod record;

pub use disk_manager::DiskManager;
