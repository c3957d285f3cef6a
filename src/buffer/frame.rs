//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds one [`Page`] plus the metadata the pool needs:
//! which page is loaded, a pin count, and a dirty flag. The page data is
//! guarded by its own `RwLock` (the per-frame latch), independent of the
//! pool-wide lock.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::page::Page;

/// A frame in the buffer pool.
///
/// All fields use interior mutability; the pool hands out `&Frame` freely.
/// Pin count and dirty flag are atomics, but their *transitions* are only
/// performed while the pool's coarse lock is held, which keeps them
/// consistent with the replacer's evictable bookkeeping.
pub struct Frame {
    /// The page data, guarded by the frame latch.
    page: RwLock<Page>,

    /// Which page is currently loaded, or `None` if the frame is free.
    page_id: Mutex<Option<PageId>>,

    /// Number of outstanding guards referencing this frame.
    pin_count: AtomicU32,

    /// Whether the contents differ from the durably persisted copy.
    is_dirty: AtomicBool,
}

impl Frame {
    /// Create a new empty frame.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
            page_id: Mutex::new(None),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
        }
    }

    /// Acquire the frame latch in shared mode.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire the frame latch in exclusive mode.
    #[inline]
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    #[inline]
    pub fn page_id(&self) -> Option<PageId> {
        *self.page_id.lock()
    }

    #[inline]
    pub fn set_page_id(&self, page_id: Option<PageId>) {
        *self.page_id.lock() = page_id;
    }

    /// Increment the pin count, returning the new value.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Decrement the pin count, returning the new value.
    ///
    /// # Panics
    /// Panics if the pin count is already 0.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::Relaxed);
        assert!(old > 0, "pin count underflow");
        old - 1
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    #[inline]
    pub fn mark_dirty(&self) {
        self.is_dirty.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn clear_dirty(&self) {
        self.is_dirty.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Relaxed)
    }

    /// Whether no page is loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.page_id().is_none()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
