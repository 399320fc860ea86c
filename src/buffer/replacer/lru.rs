//! LRU (Least-Recently-Used) replacement policy.

use crate::common::FrameId;

/// Recency links of one frame.
#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Option<FrameId>,
    next: Option<FrameId>,
    linked: bool,
}

/// An LRU eviction policy.
///
/// Frames form a doubly-linked list threaded through a `Vec` indexed by
/// frame id: the head is the most recently used frame, the tail is the next
/// victim. Every operation is O(1).
///
/// ```text
///  head (MRU)                          tail (LRU)
///  [Frame 3] ⇄ [Frame 0] ⇄ [Frame 7] ⇄ [Frame 1]
/// ```
#[derive(Debug, Default)]
pub struct LruReplacer {
    links: Vec<Link>,
    head: Option<FrameId>,
    tail: Option<FrameId>,
    size: usize,
}

impl LruReplacer {
    /// Create an empty replacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a frame was accessed, making it the most recently used.
    pub fn record_access(&mut self, frame_id: FrameId) {
        if frame_id.0 >= self.links.len() {
            self.links.resize(frame_id.0 + 1, Link::default());
        }
        if self.head == Some(frame_id) {
            return;
        }
        if self.links[frame_id.0].linked {
            self.unlink(frame_id);
        }
        self.push_front(frame_id);
    }

    /// Select the least recently used frame and stop tracking it.
    pub fn evict(&mut self) -> Option<FrameId> {
        let victim = self.tail?;
        self.unlink(victim);
        Some(victim)
    }

    /// Stop tracking a frame.
    pub fn remove(&mut self, frame_id: FrameId) {
        if self
            .links
            .get(frame_id.0)
            .is_some_and(|link| link.linked)
        {
            self.unlink(frame_id);
        }
    }

    /// Number of tracked frames.
    pub fn size(&self) -> usize {
        self.size
    }

    fn push_front(&mut self, frame_id: FrameId) {
        let old_head = self.head;
        self.links[frame_id.0] = Link {
            prev: None,
            next: old_head,
            linked: true,
        };
        match old_head {
            Some(head) => self.links[head.0].prev = Some(frame_id),
            None => self.tail = Some(frame_id),
        }
        self.head = Some(frame_id);
        self.size += 1;
    }

    fn unlink(&mut self, frame_id: FrameId) {
        let Link { prev, next, .. } = self.links[frame_id.0];
        match prev {
            Some(p) => self.links[p.0].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.links[n.0].prev = prev,
            None => self.tail = prev,
        }
        self.links[frame_id.0] = Link::default();
        self.size -= 1;
    }
}
