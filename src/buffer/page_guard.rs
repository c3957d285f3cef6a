//! RAII guards for page access.
//!
//! A guard owns exactly one pin and one frame latch acquisition:
//! - [`PageReadGuard`] — shared access, any number may coexist
//! - [`PageWriteGuard`] — exclusive access
//!
//! Release order is fixed: latch first, then unpin through the pool. Both
//! happen at most once per guard, either via the idempotent
//! [`drop_guard`](PageReadGuard::drop_guard) or when the guard goes out of
//! scope. Guards are move-only; moving transfers the pin/latch pair and the
//! compiler invalidates the source.

use std::ops::{Deref, DerefMut};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId};
use crate::storage::page::Page;

use super::buffer_pool_manager::BufferPoolManager;

/// Guard for shared read access to one page.
pub struct PageReadGuard<'a> {
    bpm: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    /// `None` once the guard has been released.
    latch: Option<RwLockReadGuard<'a, Page>>,
}

impl<'a> PageReadGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        latch: RwLockReadGuard<'a, Page>,
    ) -> Self {
        Self {
            bpm,
            frame_id,
            page_id,
            latch: Some(latch),
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Release the latch and the pin. Safe to call more than once; only the
    /// first call has an effect.
    pub fn drop_guard(&mut self) {
        if let Some(latch) = self.latch.take() {
            drop(latch);
            self.bpm.unpin_frame(self.frame_id);
        }
    }
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        self.latch.as_deref().expect("page guard already released")
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        self.drop_guard();
    }
}

/// Guard for exclusive write access to one page.
///
/// The frame is marked dirty when the guard is created, so an eviction or
/// explicit flush that runs after this writer releases always persists the
/// new contents.
pub struct PageWriteGuard<'a> {
    bpm: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    /// `None` once the guard has been released.
    latch: Option<RwLockWriteGuard<'a, Page>>,
}

impl<'a> PageWriteGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        latch: RwLockWriteGuard<'a, Page>,
    ) -> Self {
        Self {
            bpm,
            frame_id,
            page_id,
            latch: Some(latch),
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Release the latch and the pin. Safe to call more than once; only the
    /// first call has an effect.
    pub fn drop_guard(&mut self) {
        if let Some(latch) = self.latch.take() {
            drop(latch);
            self.bpm.unpin_frame(self.frame_id);
        }
    }
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        self.latch.as_deref().expect("page guard already released")
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        self.latch
            .as_deref_mut()
            .expect("page guard already released")
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        self.drop_guard();
    }
}
