//! Crate-wide error type.

use thiserror::Error;

/// Convenient Result type alias, following the `std::io::Result` pattern.
pub type Result<T> = std::result::Result<T, Error>;

/// All recoverable errors surfaced by the buffer pool.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the disk manager.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist on disk.
    #[error("page {0} not found")]
    PageNotFound(u32),

    /// Every frame is pinned or non-evictable; nothing can be freed.
    #[error("no evictable frame available in buffer pool")]
    NoFreeFrames,

    /// A frame id outside the replacer's capacity was passed to
    /// `record_access` or `set_evictable`.
    #[error("frame id {id} out of range for replacer with {capacity} frames")]
    FrameOutOfRange { id: usize, capacity: usize },

    /// `remove` was called on a frame that is tracked but not evictable.
    #[error("frame {0} is not evictable")]
    FrameNotEvictable(usize),
}
