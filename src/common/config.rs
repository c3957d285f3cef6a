//! Configuration constants.

/// Size of a page in bytes (4KB).
///
/// Matches the OS page size on most systems and keeps page buffers
/// eligible for aligned (O_DIRECT-style) I/O.
pub const PAGE_SIZE: usize = 4096;

/// Default `k` for the LRU-K replacer.
///
/// With k = 2 the policy distinguishes pages touched once (scan noise)
/// from pages touched repeatedly (working set).
pub const DEFAULT_K_DIST: usize = 2;
