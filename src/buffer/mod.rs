//! Buffer pool management.
//!
//! The in-memory cache layer between callers and disk: a fixed pool of
//! frames, each holding one page.
//!
//! # Components
//! - [`BufferPoolManager`] - the page cache orchestrator
//! - [`Frame`] - a pool slot: page buffer + pin/dirty metadata
//! - [`PageReadGuard`] / [`PageWriteGuard`] - scoped pin+latch handles
//! - [`replacer`] - the LRU-K eviction policy
//! - [`BufferPoolStats`] - lock-free counters

mod buffer_pool_manager;
mod frame;
mod page_guard;
pub mod replacer;
mod stats;

pub use buffer_pool_manager::BufferPoolManager;
pub use frame::Frame;
pub use page_guard::{PageReadGuard, PageWriteGuard};
pub use stats::{BufferPoolStats, StatsSnapshot};
