//! Disk I/O and the on-disk page format.

mod disk_manager;
pub mod page;

pub use disk_manager::DiskManager;
