//! pagepool - a concurrent buffer pool with LRU-K page eviction.
//!
//! The pool caches fixed-size disk pages in a fixed set of in-memory
//! frames. Page access goes through scoped guards that bundle a pin with a
//! per-frame reader/writer latch; when the pool fills up, the LRU-K
//! replacer picks eviction victims by backward k-distance.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  BufferPoolManager                   │
//! │  page_table: PageId → FrameId   frames: Vec<Frame>   │
//! │  free_list                      LruKReplacer         │
//! └────────────────────────┬─────────────────────────────┘
//!                          ↓
//!                    DiskManager (4KB pages on file)
//! ```
//!
//! # Modules
//! - [`common`] - identifiers, errors, constants
//! - [`buffer`] - pool orchestration, replacer, guards
//! - [`storage`] - disk backend and the page buffer
//!
//! # Quick Start
//! ```no_run
//! use pagepool::{BufferPoolManager, DiskManager};
//!
//! let dm = DiskManager::create("my_database.db").unwrap();
//! let bpm = BufferPoolManager::new(16, dm, 2);
//!
//! let pid = bpm.new_page().unwrap();
//! {
//!     let mut guard = bpm.fetch_page_write(pid).unwrap();
//!     guard.as_mut_slice()[0] = 0xAB;
//! }
//! let guard = bpm.fetch_page_read(pid).unwrap();
//! assert_eq!(guard.as_slice()[0], 0xAB);
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

pub use common::config::{DEFAULT_K_DIST, PAGE_SIZE};
pub use common::{Error, FrameId, PageId, Result};

pub use buffer::replacer::{AccessType, LruKReplacer};
pub use buffer::{BufferPoolManager, BufferPoolStats, PageReadGuard, PageWriteGuard, StatsSnapshot};
pub use storage::page::Page;
pub use storage::DiskManager;
