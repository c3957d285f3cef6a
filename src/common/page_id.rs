//! Page identifier type.

use std::fmt;

/// Identifies a logical page on disk.
///
/// `u32` allows 2^32 pages: with 4KB pages that is a 16TB address space.
/// Allocation and fetch failures surface as `Result`s, so there is no
/// reserved sentinel id; every representable id is a real page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({})", self.0)
    }
}
