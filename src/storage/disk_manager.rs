//! Disk managers - fixed-size block I/O for database pages.
//!
//! The buffer pool talks to storage only through the [`DiskManager`] trait:
//! read or write one page-sized block at a page id, and allocate new ones.
//!
//! - [`FileDiskManager`] - pages laid out sequentially in a single file
//! - [`MemoryDiskManager`] - pages held in memory (tests, scratch indexes)

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::trace;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Block-level storage backing the buffer pool.
///
/// Implementations are single-threaded; the buffer pool serializes access
/// behind a mutex.
pub trait DiskManager: Send {
    /// Read page `page_id` into `page`.
    ///
    /// # Errors
    /// `Error::PageNotFound` if the page was never allocated.
    fn read_page(&mut self, page_id: PageId, page: &mut Page) -> Result<()>;

    /// Write `page` as the contents of `page_id`.
    ///
    /// # Errors
    /// `Error::PageNotFound` if the page was never allocated.
    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()>;

    /// Allocate a zeroed page and return its id. Ids are dense from 0.
    fn allocate_page(&mut self) -> Result<PageId>;

    /// Number of allocated pages.
    fn page_count(&self) -> u32;
}

/// Stores the database as a single file with pages laid out sequentially.
///
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │  ...    │ Page N  │
/// └─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096    ...    N×4096
/// ```
///
/// Every write is followed by `fsync()`.
pub struct FileDiskManager {
    file: File,
    page_count: u32,
}

impl FileDiskManager {
    /// Create a new database file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
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
    ///
    /// A trailing partial page is ignored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let page_count = (file.metadata()?.len() / PAGE_SIZE as u64) as u32;

        Ok(Self { file, page_count })
    }

    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Total size of the allocated pages in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    fn seek_to(&mut self, page_id: PageId) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id));
        }
        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        self.seek_to(page_id)?;
        self.file.read_exact(page.as_mut_slice())?;
        trace!(%page_id, "read page from file");
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.seek_to(page_id)?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;
        trace!(%page_id, "wrote page to file");
        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.page_count);
        self.file
            .set_len((self.page_count as u64 + 1) * PAGE_SIZE as u64)?;
        self.page_count += 1;
        Ok(page_id)
    }

    fn page_count(&self) -> u32 {
        self.page_count
    }
}

/// Keeps every page in memory. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryDiskManager {
    pages: Vec<Box<Page>>,
}

impl MemoryDiskManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        let stored = self
            .pages
            .get(page_id.0 as usize)
            .ok_or(Error::PageNotFound(page_id))?;
        page.as_mut_slice().copy_from_slice(stored.as_slice());
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        let stored = self
            .pages
            .get_mut(page_id.0 as usize)
            .ok_or(Error::PageNotFound(page_id))?;
        stored.as_mut_slice().copy_from_slice(page.as_slice());
        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.pages.len() as u32);
        self.pages.push(Box::default());
        Ok(page_id)
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }
}
