//! Directory page of the disk-backed skip list index.

use crate::common::config::{PAGE_HEADER_SIZE, PAGE_SIZE};
use crate::common::{Error, Lsn, PageId, Result};

use super::page_header::PageHeader;

/// Maps bucket index to block page, plus the index's declared size.
///
/// One header page exists per index. Block page ids are appended as buckets
/// are provisioned and never removed.
///
/// # Layout
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       8     PageHeader (reserved + lsn)
/// 8       4     page_id
/// 12      4     size (entry capacity)
/// 16      4     number of block pages
/// 20      4*n   block page ids, in bucket order
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipListHeaderPage {
    pub page_id: PageId,
    pub size: u32,
    pub lsn: Lsn,
    block_page_ids: Vec<PageId>,
}

impl SkipListHeaderPage {
    const OFFSET_PAGE_ID: usize = PAGE_HEADER_SIZE;
    const OFFSET_SIZE: usize = PAGE_HEADER_SIZE + 4;
    const OFFSET_NUM_BLOCKS: usize = PAGE_HEADER_SIZE + 8;
    const OFFSET_BLOCK_IDS: usize = PAGE_HEADER_SIZE + 12;

    /// Most block pages a single header page can address (1019).
    pub const MAX_BLOCKS: usize = (PAGE_SIZE - Self::OFFSET_BLOCK_IDS) / 4;

    pub fn new(page_id: PageId) -> Self {
        Self {
            page_id,
            size: 0,
            lsn: Lsn::default(),
            block_page_ids: Vec::new(),
        }
    }

    /// Append a block page. Its bucket index is the previous block count.
    ///
    /// # Errors
    /// `Error::DirectoryFull` once [`Self::MAX_BLOCKS`] ids are stored.
    pub fn add_block_page_id(&mut self, page_id: PageId) -> Result<()> {
        if self.block_page_ids.len() >= Self::MAX_BLOCKS {
            return Err(Error::DirectoryFull(Self::MAX_BLOCKS));
        }
        self.block_page_ids.push(page_id);
        Ok(())
    }

    /// Block page backing `bucket`.
    ///
    /// # Panics
    /// Panics if `bucket >= num_blocks()`.
    #[inline]
    pub fn block_page_id(&self, bucket: usize) -> PageId {
        self.block_page_ids[bucket]
    }

    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.block_page_ids.len()
    }

    pub fn block_page_ids(&self) -> &[PageId] {
        &self.block_page_ids
    }

    /// Decode a header page from raw page bytes.
    ///
    /// A stored block count larger than [`Self::MAX_BLOCKS`] is clamped.
    ///
    /// # Panics
    /// Panics if `data.len() < PAGE_SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= PAGE_SIZE, "buffer too small for header page");

        let lsn = PageHeader::from_bytes(data).lsn;
        let page_id = PageId::new(read_u32(data, Self::OFFSET_PAGE_ID));
        let size = read_u32(data, Self::OFFSET_SIZE);
        let num_blocks = (read_u32(data, Self::OFFSET_NUM_BLOCKS) as usize).min(Self::MAX_BLOCKS);

        let block_page_ids = (0..num_blocks)
            .map(|i| PageId::new(read_u32(data, Self::OFFSET_BLOCK_IDS + i * 4)))
            .collect();

        Self {
            page_id,
            size,
            lsn,
            block_page_ids,
        }
    }

    /// Encode this header page into raw page bytes.
    ///
    /// # Panics
    /// Panics if `data.len() < PAGE_SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= PAGE_SIZE, "buffer too small for header page");

        PageHeader::new(self.lsn).write_to(data);
        write_u32(data, Self::OFFSET_PAGE_ID, self.page_id.0);
        write_u32(data, Self::OFFSET_SIZE, self.size);
        write_u32(data, Self::OFFSET_NUM_BLOCKS, self.block_page_ids.len() as u32);

        for (i, pid) in self.block_page_ids.iter().enumerate() {
            write_u32(data, Self::OFFSET_BLOCK_IDS + i * 4, pid.0);
        }
    }
}

#[inline]
pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub(crate) fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
