//! LRU-K replacement policy.
//!
//! LRU-K evicts the frame with the largest *backward k-distance*: the time
//! elapsed since its k-th most recent access. Frames accessed fewer than k
//! times have infinite distance and are always preferred as victims; ties
//! among them break by earliest first access (FIFO). With k = 1 the policy
//! degenerates to plain LRU.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::common::{Error, FrameId, Result};

/// Hint describing why a frame was accessed.
///
/// Currently unused by the policy itself; callers pass it so smarter
/// policies (e.g. scan-resistant variants) can be dropped in later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessType {
    #[default]
    Unknown,
    Lookup,
    Scan,
    Index,
}

/// Bounded access history for one tracked frame.
struct LruKNode {
    /// Most recent access timestamps, oldest at the front, at most `k` long.
    history: VecDeque<u64>,
    /// Whether the frame may be chosen as an eviction victim.
    is_evictable: bool,
}

impl LruKNode {
    fn new() -> Self {
        Self {
            history: VecDeque::new(),
            is_evictable: false,
        }
    }

    /// Append a timestamp, dropping the oldest entry past length `k`.
    fn record(&mut self, timestamp: u64, k: usize) {
        if self.history.len() == k {
            self.history.pop_front();
        }
        self.history.push_back(timestamp);
    }
}

/// Eviction priority for one candidate frame.
///
/// The best victim is the *minimum* key: frames with a partial history
/// (`has_full_history == false`, infinite backward k-distance) sort before
/// full ones, and within each class the smallest timestamp wins. Because the
/// history is trimmed to `k` entries, the front entry is the first access
/// for a partial history and the k-th most recent access for a full one, so
/// a single `(bool, u64)` pair encodes the whole comparison.
///
/// Keys are immutable once inserted; every history mutation removes the old
/// key and inserts a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EvictKey {
    has_full_history: bool,
    oldest_tracked: u64,
    frame_id: FrameId,
}

fn evict_key(frame_id: FrameId, node: &LruKNode, k: usize) -> EvictKey {
    let &oldest_tracked = node
        .history
        .front()
        .expect("tracked frame has at least one recorded access");
    EvictKey {
        has_full_history: node.history.len() >= k,
        oldest_tracked,
        frame_id,
    }
}

/// LRU-K replacer over frame ids `0..num_frames`.
///
/// Operations take `&mut self`; the buffer pool serializes them under its
/// coarse lock, and standalone users wrap the replacer in a `Mutex`.
///
/// Candidates are indexed by a `BTreeSet<EvictKey>` so selection and every
/// bookkeeping update are O(log n).
pub struct LruKReplacer {
    /// Access history per tracked frame.
    node_store: HashMap<FrameId, LruKNode>,
    /// Evictable frames ordered by eviction priority (best victim first).
    candidates: BTreeSet<EvictKey>,
    /// Logical clock, advanced once per recorded access.
    current_timestamp: u64,
    /// Maximum number of tracked frames; valid ids are `0..num_frames`.
    num_frames: usize,
    k: usize,
}

impl LruKReplacer {
    /// Create a replacer for `num_frames` frames with parameter `k`.
    ///
    /// # Panics
    /// Panics if `k` is 0.
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k > 0, "k must be > 0");
        Self {
            node_store: HashMap::new(),
            candidates: BTreeSet::new(),
            current_timestamp: 0,
            num_frames,
            k,
        }
    }

    /// Record an access to `frame_id` at the current logical time.
    ///
    /// Creates the history on first access.
    ///
    /// # Errors
    /// `Error::FrameOutOfRange` if `frame_id >= num_frames`.
    pub fn record_access(&mut self, frame_id: FrameId, _access_type: AccessType) -> Result<()> {
        self.check_bounds(frame_id)?;

        self.current_timestamp += 1;
        let k = self.k;
        let node = self
            .node_store
            .entry(frame_id)
            .or_insert_with(LruKNode::new);

        let old_key = node.is_evictable.then(|| evict_key(frame_id, node, k));
        node.record(self.current_timestamp, k);
        let new_key = evict_key(frame_id, node, k);

        if let Some(old_key) = old_key {
            self.candidates.remove(&old_key);
            self.candidates.insert(new_key);
        }

        Ok(())
    }

    /// Toggle whether `frame_id` may be evicted.
    ///
    /// Unknown frames and unchanged flags are no-ops.
    ///
    /// # Errors
    /// `Error::FrameOutOfRange` if `frame_id >= num_frames`.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) -> Result<()> {
        self.check_bounds(frame_id)?;

        let Some(node) = self.node_store.get_mut(&frame_id) else {
            return Ok(());
        };
        if node.is_evictable == evictable {
            return Ok(());
        }

        node.is_evictable = evictable;
        let key = evict_key(frame_id, node, self.k);
        if evictable {
            self.candidates.insert(key);
        } else {
            self.candidates.remove(&key);
        }

        Ok(())
    }

    /// Select and remove the best eviction victim.
    ///
    /// Returns `None` if no frame is evictable. On success the frame's
    /// history is discarded entirely; a later access starts fresh.
    pub fn evict(&mut self) -> Option<FrameId> {
        let key = self.candidates.pop_first()?;
        self.node_store.remove(&key.frame_id);
        Some(key.frame_id)
    }

    /// Remove `frame_id`'s history regardless of its eviction priority.
    ///
    /// Unknown frames (including out-of-range ids) are a silent no-op.
    ///
    /// # Errors
    /// `Error::FrameNotEvictable` if the frame is tracked but not evictable.
    pub fn remove(&mut self, frame_id: FrameId) -> Result<()> {
        let Some(node) = self.node_store.get(&frame_id) else {
            return Ok(());
        };
        if !node.is_evictable {
            return Err(Error::FrameNotEvictable(frame_id.0));
        }

        let key = evict_key(frame_id, node, self.k);
        self.candidates.remove(&key);
        self.node_store.remove(&frame_id);

        Ok(())
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.candidates.len()
    }

    fn check_bounds(&self, frame_id: FrameId) -> Result<()> {
        if frame_id.0 >= self.num_frames {
            return Err(Error::FrameOutOfRange {
                id: frame_id.0,
                capacity: self.num_frames,
            });
        }
        Ok(())
    }
}
