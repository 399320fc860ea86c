//! Common types and utilities shared across pagetree.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`TreeConfig`]
//! - Error types
//! - Identifiers ([`PageOffset`], [`FrameId`])
//! - Key hashing ([`IndexKey`], [`KeyHash`]) and value encoding ([`FixedCodec`])

pub mod codec;
pub mod config;
pub mod error;
mod frame_id;
pub mod key_hash;
mod page_offset;

pub use codec::FixedCodec;
pub use config::{TreeConfig, TreeConfigBuilder};
pub use error::{Error, Result};
pub use frame_id::FrameId;
pub use key_hash::{IndexKey, KeyHash};
pub use page_offset::PageOffset;
