//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] maps logical page ids to a fixed pool of
//! frames, drives eviction through the LRU-K replacer when the pool is
//! full, delegates persistence to the [`DiskManager`], and hands out
//! pin+latch guards for page access.

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use crate::buffer::replacer::{AccessType, LruKReplacer};
use crate::buffer::{BufferPoolStats, Frame, PageReadGuard, PageWriteGuard};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::DiskManager;

/// Bookkeeping guarded by the pool's single coarse lock.
///
/// Keeping the page table, free list, and replacer under one mutex makes a
/// pin transition and its matching evictable update atomic: a frame can
/// never be chosen as a victim between being resolved and being pinned.
struct PoolState {
    /// Maps resident page ids to frame ids.
    page_table: HashMap<PageId, FrameId>,
    /// Frames not holding any page (LIFO for locality).
    free_list: Vec<FrameId>,
    /// Eviction policy; a frame is tracked here only while resident.
    replacer: LruKReplacer,
}

/// Manages a pool of buffer frames caching disk pages.
///
/// # Lock order
/// Two tiers: the coarse [`PoolState`] mutex, and one `RwLock` latch per
/// frame. No method blocks on a *contended* latch while holding the coarse
/// lock: guard latches and miss-path disk loads happen after the coarse
/// lock is released. The one exception is the eviction write-back in
/// `acquire_frame`, which flushes the victim under the coarse lock; the
/// victim is unpinned and unmapped at that point, so its latch is free and
/// the unmapping stays atomic with the flush. A re-fetch of an evicted
/// page therefore always reads the flushed image.
///
/// # Usage
/// ```ignore
/// let dm = DiskManager::create("test.db")?;
/// let bpm = BufferPoolManager::new(10, dm, 2);
///
/// let pid = bpm.new_page()?;
/// {
///     let mut guard = bpm.fetch_page_write(pid)?;
///     guard.as_mut_slice()[0] = 0xAB;
/// } // guard drops: latch released, page unpinned
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Coarse lock over page table, free list, and replacer.
    state: Mutex<PoolState>,

    /// Serialized disk backend.
    disk_manager: Mutex<DiskManager>,

    /// Lock-free performance counters.
    stats: BufferPoolStats,

    /// Number of frames (immutable after construction).
    pool_size: usize,
}

impl BufferPoolManager {
    /// Create a buffer pool with `pool_size` frames and LRU-K parameter `k`.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0 or `k` is 0.
    pub fn new(pool_size: usize, disk_manager: DiskManager, k: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();
        let free_list: Vec<FrameId> = (0..pool_size).map(FrameId::new).collect();

        Self {
            frames,
            state: Mutex::new(PoolState {
                page_table: HashMap::new(),
                free_list,
                replacer: LruKReplacer::new(pool_size, k),
            }),
            disk_manager: Mutex::new(disk_manager),
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: page allocation and deletion
    // ========================================================================

    /// Allocate a new page and load it, zeroed, into the pool.
    ///
    /// The frame is left unpinned and evictable, and is marked dirty: the
    /// zeroed contents have not been durably written through this pool yet,
    /// so a future eviction must flush them.
    ///
    /// # Errors
    /// `Error::NoFreeFrames` if every frame is pinned.
    pub fn new_page(&self) -> Result<PageId> {
        let frame_id = self.acquire_frame()?;

        let page_id = match self.disk_manager.lock().allocate_page() {
            Ok(page_id) => page_id,
            Err(e) => {
                self.release_frame(frame_id);
                return Err(e);
            }
        };

        let frame = &self.frames[frame_id.0];
        debug_assert!(frame.is_empty(), "acquired frame still holds a page");
        frame.page_mut().reset();
        frame.set_page_id(Some(page_id));
        frame.mark_dirty();

        let mut state = self.state.lock();
        state.page_table.insert(page_id, frame_id);
        state
            .replacer
            .record_access(frame_id, AccessType::Unknown)?;
        state.replacer.set_evictable(frame_id, true)?;

        Ok(page_id)
    }

    /// Drop a page from the pool without writing it back.
    ///
    /// Returns `true` if the page is not resident (deletion is idempotent)
    /// or was reclaimed, `false` if the page is pinned. The page is not
    /// deallocated on disk.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return true;
        };

        let frame = &self.frames[frame_id.0];
        if frame.is_pinned() {
            return false;
        }

        state.page_table.remove(&page_id);
        assert!(
            state.replacer.remove(frame_id).is_ok(),
            "unpinned resident frame must be evictable"
        );
        frame.set_page_id(None);
        frame.clear_dirty();
        state.free_list.push(frame_id);

        true
    }

    // ========================================================================
    // Public API: page access
    // ========================================================================

    /// Fetch a page for shared read access.
    ///
    /// Loads the page from disk (possibly evicting another page) on a miss.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page was never allocated
    /// - `Error::NoFreeFrames` if every frame is pinned
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame_id = self.fetch_frame(page_id)?;

        // The coarse lock is no longer held; blocking here cannot invert
        // the lock order.
        let latch = self.frames[frame_id.0].page();
        Ok(PageReadGuard::new(self, frame_id, page_id, latch))
    }

    /// Fetch a page for exclusive write access.
    ///
    /// The frame is marked dirty as soon as the latch is acquired, so any
    /// later flush persists whatever this writer leaves behind.
    ///
    /// # Errors
    /// Same as [`fetch_page_read`](Self::fetch_page_read).
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.fetch_frame(page_id)?;

        let frame = &self.frames[frame_id.0];
        let latch = frame.page_mut();
        frame.mark_dirty();
        Ok(PageWriteGuard::new(self, frame_id, page_id, latch))
    }

    /// Like [`fetch_page_read`](Self::fetch_page_read), but `None` on failure.
    pub fn checked_read_page(&self, page_id: PageId) -> Option<PageReadGuard<'_>> {
        self.fetch_page_read(page_id).ok()
    }

    /// Like [`fetch_page_write`](Self::fetch_page_write), but `None` on failure.
    pub fn checked_write_page(&self, page_id: PageId) -> Option<PageWriteGuard<'_>> {
        self.fetch_page_write(page_id).ok()
    }

    // ========================================================================
    // Public API: flushing
    // ========================================================================

    /// Write a page back to disk if it is dirty.
    ///
    /// No-op when the page is not resident or not dirty.
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let frame_id = {
            let state = self.state.lock();
            match state.page_table.get(&page_id) {
                Some(&frame_id) => frame_id,
                None => return Ok(()),
            }
        };

        self.flush_frame(frame_id, page_id)
    }

    /// Write every dirty resident page back to disk.
    pub fn flush_all_pages(&self) -> Result<()> {
        let pages: Vec<(PageId, FrameId)> = {
            let state = self.state.lock();
            state
                .page_table
                .iter()
                .map(|(&page_id, &frame_id)| (page_id, frame_id))
                .collect()
        };

        for (page_id, frame_id) in pages {
            self.flush_frame(frame_id, page_id)?;
        }

        Ok(())
    }

    // ========================================================================
    // Public API: introspection
    // ========================================================================

    /// Current pin count of a resident page, or `None` if not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(self.frames[frame_id.0].pin_count())
    }

    /// Whether a page is currently resident.
    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_key(&page_id)
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn free_frame_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    pub fn page_count(&self) -> usize {
        self.state.lock().page_table.len()
    }

    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    // ========================================================================
    // Internal: guard release
    // ========================================================================

    /// Unpin a frame. Called by guards after releasing their latch.
    pub(crate) fn unpin_frame(&self, frame_id: FrameId) {
        let mut state = self.state.lock();

        if self.frames[frame_id.0].unpin() == 0 {
            // Frame ids owned by the pool are always in range.
            assert!(state.replacer.set_evictable(frame_id, true).is_ok());
        }
    }

    // ========================================================================
    // Internal: fetch and eviction
    // ========================================================================

    /// Pin a resident frame and update the replacer. Coarse lock held.
    fn pin_resident(&self, state: &mut PoolState, frame_id: FrameId) -> Result<()> {
        self.frames[frame_id.0].pin();
        state
            .replacer
            .record_access(frame_id, AccessType::Unknown)?;
        state.replacer.set_evictable(frame_id, false)?;
        Ok(())
    }

    /// Resolve `page_id` to a pinned frame, loading from disk on a miss.
    fn fetch_frame(&self, page_id: PageId) -> Result<FrameId> {
        // Fast path: cache hit.
        {
            let mut state = self.state.lock();
            if let Some(&frame_id) = state.page_table.get(&page_id) {
                self.pin_resident(&mut state, frame_id)?;
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(frame_id);
            }
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
        let frame_id = self.acquire_frame()?;
        debug_assert!(self.frames[frame_id.0].is_empty(), "acquired frame still holds a page");

        // Load from disk holding only the (uncontended) frame latch.
        {
            let mut page = self.frames[frame_id.0].page_mut();
            if let Err(e) = self.disk_manager.lock().read_page(page_id, &mut page) {
                drop(page);
                self.release_frame(frame_id);
                return Err(e);
            }
        }
        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.lock();

        // Another thread may have loaded the same page while we were off
        // the coarse lock; if so, use its frame and give ours back.
        if let Some(&winner) = state.page_table.get(&page_id) {
            state.free_list.push(frame_id);
            self.pin_resident(&mut state, winner)?;
            return Ok(winner);
        }

        let frame = &self.frames[frame_id.0];
        frame.set_page_id(Some(page_id));
        frame.clear_dirty();
        state.page_table.insert(page_id, frame_id);
        self.pin_resident(&mut state, frame_id)?;

        Ok(frame_id)
    }

    /// Obtain a detached frame: from the free list, else by eviction.
    ///
    /// The returned frame is not in the page table, not in the replacer,
    /// and has pin count 0, so this thread owns it exclusively.
    ///
    /// A dirty victim is flushed while the coarse lock is still held, so
    /// its unmapping and its write-back are atomic: a concurrent fetch of
    /// the evicted page waits on the coarse lock and can only read the
    /// flushed image from disk. The victim's latch is guaranteed free at
    /// this point (pin count 0, unmapped), so the flush cannot block on a
    /// guard holder.
    fn acquire_frame(&self) -> Result<FrameId> {
        let mut state = self.state.lock();

        if let Some(frame_id) = state.free_list.pop() {
            return Ok(frame_id);
        }

        let frame_id = state.replacer.evict().ok_or(Error::NoFreeFrames)?;
        let frame = &self.frames[frame_id.0];
        if let Some(page_id) = frame.page_id() {
            state.page_table.remove(&page_id);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            if frame.is_dirty() {
                self.flush_frame(frame_id, page_id)?;
            }
            frame.set_page_id(None);
            frame.clear_dirty();
        }

        Ok(frame_id)
    }

    /// Return a detached frame to the free list.
    fn release_frame(&self, frame_id: FrameId) {
        self.frames[frame_id.0].set_page_id(None);
        self.state.lock().free_list.push(frame_id);
    }

    /// Write a frame back to disk if it still holds `page_id` and is dirty.
    ///
    /// Takes the frame latch in shared mode, so it waits out any active
    /// writer and persists a stable image. Explicit flushes call this
    /// without the coarse lock; eviction calls it with the coarse lock
    /// held, on a detached victim whose latch is free.
    fn flush_frame(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let frame = &self.frames[frame_id.0];

        let page = frame.page();
        if frame.page_id() == Some(page_id) && frame.is_dirty() {
            self.disk_manager.lock().write_page(page_id, &page)?;
            frame.clear_dirty();
            self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
        }

        Ok(())
    }
}
