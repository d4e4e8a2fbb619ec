//! Page - the fixed 4KB unit of storage.
//!
//! A [`Page`] is the byte content of one disk block. Identity, pin count,
//! dirty flag and the reader/writer latch live on the [`Frame`] that holds
//! the page in the buffer pool.
//!
//! [`Frame`]: crate::buffer::Frame

use crate::common::config::PAGE_SIZE;
use crate::common::Lsn;

use super::page_header::PageHeader;

/// A page of data (4KB, 4KB-aligned).
///
/// # Memory Layout
/// - Size: 4096 bytes
/// - Alignment: 4096 bytes
/// - Bytes 0..8: [`PageHeader`] (reserved word + LSN)
///
/// `Page` does not implement `Clone` outside tests; copying 4KB should be
/// explicit.
///
/// # Example
/// ```
/// use pagecache::storage::page::Page;
/// use pagecache::Lsn;
///
/// let mut page = Page::new();
/// page.set_lsn(Lsn(7));
/// assert_eq!(page.copy_from(100, b"abc"), 3);
/// assert_eq!(page.lsn(), Lsn(7));
/// assert_eq!(&page.as_slice()[100..103], b"abc");
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }

    /// Copy `bytes` into the page starting at `offset`.
    ///
    /// The write is bounded by the end of the page: bytes that would land
    /// past it are dropped. Returns the number of bytes written.
    pub fn copy_from(&mut self, offset: usize, bytes: &[u8]) -> usize {
        if offset >= PAGE_SIZE {
            return 0;
        }
        let n = bytes.len().min(PAGE_SIZE - offset);
        self.data[offset..offset + n].copy_from_slice(&bytes[..n]);
        n
    }

    pub fn header(&self) -> PageHeader {
        PageHeader::from_bytes(&self.data)
    }

    pub fn set_header(&mut self, header: &PageHeader) {
        header.write_to(&mut self.data);
    }

    /// Log sequence number of the last change recorded for this page.
    #[inline]
    pub fn lsn(&self) -> Lsn {
        self.header().lsn
    }

    #[inline]
    pub fn set_lsn(&mut self, lsn: Lsn) {
        self.set_header(&PageHeader::new(lsn));
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.data.copy_from_slice(&self.data);
        new_page
    }
}
