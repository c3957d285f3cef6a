//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] is the buffer pool's disk backend: it persists and
//! retrieves fixed-size pages keyed by a monotonically-issued [`PageId`].

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Manages disk I/O for a single database file.
///
/// Pages are laid out sequentially; page `N` lives at file offset
/// `N * PAGE_SIZE`.
///
/// # Thread Safety
/// `DiskManager` is single-threaded. The buffer pool serializes access
/// behind a mutex.
///
/// # Durability
/// Every write is followed by `fsync`. Failures propagate to the caller
/// and are never retried here.
pub struct DiskManager {
    file: File,
    /// Number of pages allocated in the file.
    page_count: u32,
}

impl DiskManager {
    /// Create a new database file. Fails if the file already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_count: 0,
        })
    }

    /// Open an existing database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self { file, page_count })
    }

    /// Open an existing database file, or create it if missing.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Read a page from disk into `buf`.
    ///
    /// # Errors
    /// `Error::PageNotFound` if the page was never allocated.
    pub fn read_page(&mut self, page_id: PageId, buf: &mut Page) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf.as_mut_slice())?;

        Ok(())
    }

    /// Write a page to disk, followed by an `fsync`.
    ///
    /// # Errors
    /// `Error::PageNotFound` if the page was never allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;

        Ok(())
    }

    /// Allocate a new zeroed page at the end of the file and return its id.
    ///
    /// Page ids are issued monotonically starting from 0.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.page_count);

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.sync_all()?;

        self.page_count += 1;
        Ok(page_id)
    }

    /// Number of pages allocated in the file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Total size of the database file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }
}
