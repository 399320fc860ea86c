//! Node Cache - the write-back record caching layer.
//!
//! The [`NodeCache`] provides:
//! - Record caching between the index file and memory
//! - LRU eviction with write-back of the victim
//! - A parent-link fast path that avoids full record round trips

use std::collections::HashMap;

use tracing::trace;

use crate::buffer::replacer::LruReplacer;
use crate::buffer::{CacheStats, Frame};
use crate::common::{Error, FrameId, PageOffset, Result};
use crate::storage::record::PARENT_FIELD;
use crate::storage::DiskManager;

/// A bounded write-back cache of node records, keyed by record offset.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                        NodeCache                            │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ page_table   │  │        frames: Vec<Frame>         │   │
/// │  │Offset → Fid  │─▶│  [Frame0] [Frame1] [Frame2] ...   │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │  free_list   │  │   replacer   │  │ DiskManager  │      │
/// │  │ Vec<FrameId> │  │ LruReplacer  │  │              │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Write-back
/// [`write`](Self::write) only updates the in-memory copy. The file is
/// written when a record is evicted or on [`flush_all`](Self::flush_all).
/// There is no dirty tracking: every record leaving the cache is written,
/// including records that were only read.
///
/// # Invalid offsets
/// `read`, `write` and `write_parent` on [`PageOffset::INVALID`] do nothing.
///
/// # Usage
/// ```ignore
/// let mut cache = NodeCache::new(3000, layout.record_size(), disk);
///
/// cache.write(offset, &record)?;
/// let bytes = cache.read(offset)?.expect("valid offset");
/// cache.write_parent(child, offset)?;
/// cache.flush_all()?;
/// ```
pub struct NodeCache {
    /// Frames, allocated lazily up to `capacity`.
    frames: Vec<Frame>,

    /// Maps record offsets to frame IDs.
    page_table: HashMap<PageOffset, FrameId>,

    /// Frames that were allocated and are now empty.
    free_list: Vec<FrameId>,

    /// Recency order of occupied frames.
    replacer: LruReplacer,

    /// Handles all file I/O.
    disk: DiskManager,

    /// Performance statistics.
    stats: CacheStats,

    /// Maximum number of resident records.
    capacity: usize,

    /// Size of one record in bytes.
    record_size: usize,
}

impl NodeCache {
    /// Create a new node cache.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize, record_size: usize, disk: DiskManager) -> Self {
        assert!(capacity > 0, "capacity must be > 0");

        Self {
            frames: Vec::new(),
            page_table: HashMap::new(),
            free_list: Vec::new(),
            replacer: LruReplacer::new(),
            disk,
            stats: CacheStats::new(),
            capacity,
            record_size,
        }
    }

    // ========================================================================
    // Public API: Record access
    // ========================================================================

    /// Read the record at `offset`.
    ///
    /// A resident record becomes the most recently used. A missing record is
    /// loaded from the file, possibly evicting the least recently used one.
    ///
    /// Returns `None` for [`PageOffset::INVALID`].
    ///
    /// # Errors
    /// - `Error::RecordOutOfBounds` if the record lies past the end of file
    /// - I/O errors from the load or from the eviction write-back
    pub fn read(&mut self, offset: PageOffset) -> Result<Option<&[u8]>> {
        if !offset.is_valid() {
            return Ok(None);
        }

        let frame_id = match self.page_table.get(&offset) {
            Some(&frame_id) => {
                CacheStats::bump(&self.stats.cache_hits);
                self.replacer.record_access(frame_id);
                frame_id
            }
            None => self.load(offset)?,
        };

        Ok(Some(self.frames[frame_id.0].data()))
    }

    /// Store a record at `offset` and make it the most recently used.
    ///
    /// No file I/O happens unless another record has to be evicted.
    ///
    /// # Panics
    /// Panics if `data` is not exactly one record long.
    pub fn write(&mut self, offset: PageOffset, data: &[u8]) -> Result<()> {
        if !offset.is_valid() {
            return Ok(());
        }
        assert_eq!(data.len(), self.record_size, "record size mismatch");

        let frame_id = match self.page_table.get(&offset) {
            Some(&frame_id) => frame_id,
            None => {
                let frame_id = self.get_free_frame()?;
                self.frames[frame_id.0].set_offset(Some(offset));
                self.page_table.insert(offset, frame_id);
                frame_id
            }
        };

        self.frames[frame_id.0].data_mut().copy_from_slice(data);
        self.replacer.record_access(frame_id);
        Ok(())
    }

    /// Set the parent link of the record at `offset`.
    ///
    /// A resident record is patched in place without changing its recency.
    /// Otherwise only the parent field is written to the file; the rest of
    /// the record is neither read nor rewritten.
    pub fn write_parent(&mut self, offset: PageOffset, parent: PageOffset) -> Result<()> {
        if !offset.is_valid() {
            return Ok(());
        }

        if let Some(&frame_id) = self.page_table.get(&offset) {
            self.frames[frame_id.0].patch_parent(parent);
            return Ok(());
        }

        self.disk
            .write_at(offset.get() + PARENT_FIELD.start as u64, &parent.to_le_bytes())?;
        CacheStats::bump(&self.stats.parent_patches);
        Ok(())
    }

    // ========================================================================
    // Public API: Flush
    // ========================================================================

    /// Write every resident record back to the file, in offset order.
    ///
    /// Records stay resident.
    pub fn flush_all(&mut self) -> Result<()> {
        let mut resident: Vec<(PageOffset, FrameId)> =
            self.page_table.iter().map(|(&o, &f)| (o, f)).collect();
        resident.sort_unstable_by_key(|&(offset, _)| offset);

        for (offset, frame_id) in resident {
            self.disk
                .write_at(offset.get(), self.frames[frame_id.0].data())?;
            CacheStats::bump(&self.stats.records_written);
        }

        Ok(())
    }

    /// The underlying file, for records the cache does not manage.
    pub fn disk_mut(&mut self) -> &mut DiskManager {
        &mut self.disk
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Maximum number of resident records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident records.
    pub fn len(&self) -> usize {
        self.page_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page_table.is_empty()
    }

    /// Whether the record at `offset` is resident.
    pub fn contains(&self, offset: PageOffset) -> bool {
        self.page_table.contains_key(&offset)
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    // ========================================================================
    // Internal: Miss handling and eviction
    // ========================================================================

    /// Load a record from the file into a frame.
    fn load(&mut self, offset: PageOffset) -> Result<FrameId> {
        CacheStats::bump(&self.stats.cache_misses);

        let frame_id = self.get_free_frame()?;
        let frame = &mut self.frames[frame_id.0];
        if let Err(err) = self.disk.read_at(offset.get(), frame.data_mut()) {
            self.free_list.push(frame_id);
            return Err(err);
        }
        frame.set_offset(Some(offset));
        CacheStats::bump(&self.stats.records_read);

        self.page_table.insert(offset, frame_id);
        self.replacer.record_access(frame_id);
        Ok(frame_id)
    }

    /// Get a free frame, growing the pool or evicting as needed.
    fn get_free_frame(&mut self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.pop() {
            return Ok(frame_id);
        }

        if self.frames.len() < self.capacity {
            self.frames.push(Frame::new(self.record_size));
            return Ok(FrameId::new(self.frames.len() - 1));
        }

        self.evict()
    }

    /// Write back the least recently used record and return its frame.
    fn evict(&mut self) -> Result<FrameId> {
        let frame_id = self.replacer.evict().ok_or(Error::NoFreeFrames)?;
        let frame = &mut self.frames[frame_id.0];

        if let Some(offset) = frame.offset() {
            if let Err(err) = self.disk.write_at(offset.get(), frame.data()) {
                // Keep the record resident; nothing was lost.
                self.replacer.record_access(frame_id);
                return Err(err);
            }
            self.page_table.remove(&offset);
            CacheStats::bump(&self.stats.records_written);
            CacheStats::bump(&self.stats.evictions);
            trace!(%offset, "evicted record");
        }

        frame.set_offset(None);
        Ok(frame_id)
    }
}
