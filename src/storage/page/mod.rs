//! The fixed-size page buffer.

mod page;

pub use page::Page;
