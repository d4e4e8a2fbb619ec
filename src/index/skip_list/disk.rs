//! Disk-backed skip list index.
//!
//! Despite the name, entries are laid out as a linear-probing hash table:
//! a header page lists the block pages (buckets), and each block page is a
//! [`SkipListBlockPage`] of `(key hash, value)` slots.

use std::io::Cursor;
use std::ops::Range;
use std::sync::Arc;

use murmur3::murmur3_x64_128;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::buffer::BufferPoolManager;
use crate::common::config::BLOCK_ARRAY_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::{SkipListBlockPage, SkipListHeaderPage};

/// Hash index over buffer-pool pages mapping raw key bytes to `u32` values.
///
/// A key's 32-bit hash picks a starting bucket (`hash % num_blocks`) and a
/// starting slot (`hash % BLOCK_ARRAY_SIZE`). Probing moves forward one slot
/// at a time, onto the next block at a block boundary and back to block 0
/// after the last, and stops after one full lap.
///
/// Slots store the key hash, not the key, so lookups match on hash
/// equality. One key may hold several values; an identical `(key, value)`
/// pair is rejected, even after it has been removed.
///
/// # Thread Safety
/// One index-wide `RwLock`: `get_value` takes it shared, `insert` and
/// `remove` exclusive. Block pages are pinned one at a time.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use pagecache::buffer::BufferPoolManager;
/// use pagecache::index::DiskSkipList;
/// use pagecache::storage::MemoryDiskManager;
///
/// let bpm = Arc::new(BufferPoolManager::new(8, MemoryDiskManager::new()));
/// let index = DiskSkipList::new(bpm, 4).unwrap();
///
/// index.insert(b"alice", 1).unwrap();
/// index.insert(b"alice", 2).unwrap();
/// assert_eq!(index.get_value(b"alice").unwrap(), vec![1, 2]);
/// ```
pub struct DiskSkipList {
    bpm: Arc<BufferPoolManager>,
    header_page_id: PageId,
    latch: RwLock<()>,
}

impl DiskSkipList {
    /// Create an index with `num_blocks` buckets of `BLOCK_ARRAY_SIZE` slots.
    ///
    /// Needs two free frames: the header page stays pinned while block
    /// pages are allocated.
    ///
    /// # Errors
    /// - `Error::DirectoryFull` if `num_blocks` exceeds what one header
    ///   page can address
    /// - Buffer pool errors from page allocation
    ///
    /// # Panics
    /// Panics if `num_blocks` is 0.
    pub fn new(bpm: Arc<BufferPoolManager>, num_blocks: usize) -> Result<Self> {
        assert!(num_blocks > 0, "num_blocks must be > 0");
        if num_blocks > SkipListHeaderPage::MAX_BLOCKS {
            return Err(Error::DirectoryFull(SkipListHeaderPage::MAX_BLOCKS));
        }

        let header_page_id = {
            let mut header_guard = bpm.new_page()?;
            let mut header = SkipListHeaderPage::new(header_guard.page_id());
            header.size = (num_blocks * BLOCK_ARRAY_SIZE) as u32;

            for _ in 0..num_blocks {
                let block = bpm.new_page()?;
                header.add_block_page_id(block.page_id())?;
            }

            header.write_to(header_guard.as_mut_slice());
            header.page_id
        };

        debug!(%header_page_id, num_blocks, "created disk skip list");

        Ok(Self {
            bpm,
            header_page_id,
            latch: RwLock::new(()),
        })
    }

    /// Reattach to an index created earlier with [`new`](Self::new).
    ///
    /// # Errors
    /// `Error::InvalidHeader` if the page lists no block pages or names a
    /// different page id.
    pub fn open(bpm: Arc<BufferPoolManager>, header_page_id: PageId) -> Result<Self> {
        let header = {
            let guard = bpm.fetch_page_read(header_page_id)?;
            SkipListHeaderPage::from_bytes(guard.as_slice())
        };

        if header.page_id != header_page_id || header.num_blocks() == 0 {
            return Err(Error::InvalidHeader(header_page_id));
        }

        Ok(Self {
            bpm,
            header_page_id,
            latch: RwLock::new(()),
        })
    }

    pub fn header_page_id(&self) -> PageId {
        self.header_page_id
    }

    /// Number of buckets.
    pub fn num_blocks(&self) -> Result<usize> {
        let _latch = self.latch.read();
        Ok(self.read_header()?.num_blocks())
    }

    /// Total slot capacity recorded in the header.
    pub fn capacity(&self) -> Result<usize> {
        let _latch = self.latch.read();
        Ok(self.read_header()?.size as usize)
    }

    /// Number of live entries.
    pub fn len(&self) -> Result<usize> {
        let _latch = self.latch.read();
        let header = self.read_header()?;

        let mut total = 0;
        for &page_id in header.block_page_ids() {
            let guard = self.bpm.fetch_page_read(page_id)?;
            total += SkipListBlockPage::new(guard.as_slice()).num_readable();
        }
        Ok(total)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Add `(key, value)` in the first free slot of the key's probe sequence.
    ///
    /// # Errors
    /// - `Error::DuplicateEntry` if a slot before the free one already
    ///   holds this key hash and value, tombstoned or not
    /// - `Error::DirectoryExhausted` if every slot is occupied (tombstones
    ///   included)
    pub fn insert(&self, key: &[u8], value: u32) -> Result<()> {
        let _latch = self.latch.write();
        let header = self.read_header()?;
        let hash = hash_key(key)?;

        for (bucket, slots) in probe(hash, header.num_blocks()) {
            let mut guard = self.bpm.fetch_page_write(header.block_page_id(bucket))?;
            let mut block = SkipListBlockPage::new(guard.as_mut_slice());

            for slot in slots {
                if !block.is_occupied(slot) {
                    block.insert(slot, hash, value);
                    trace!(hash, value, bucket, slot, "inserted index entry");
                    return Ok(());
                }
                if block.key_at(slot) == hash && block.value_at(slot) == value {
                    debug!(hash, value, "rejected duplicate index entry");
                    return Err(Error::DuplicateEntry);
                }
            }
        }

        warn!(
            header_page_id = %self.header_page_id,
            num_blocks = header.num_blocks(),
            "index directory exhausted"
        );
        Err(Error::DirectoryExhausted)
    }

    /// Every live value stored under `key`'s hash, in probe order.
    pub fn get_value(&self, key: &[u8]) -> Result<Vec<u32>> {
        let _latch = self.latch.read();
        let header = self.read_header()?;
        let hash = hash_key(key)?;

        let mut result = Vec::new();
        for (bucket, slots) in probe(hash, header.num_blocks()) {
            let guard = self.bpm.fetch_page_read(header.block_page_id(bucket))?;
            let block = SkipListBlockPage::new(guard.as_slice());

            for slot in slots {
                if !block.is_occupied(slot) {
                    return Ok(result);
                }
                if block.is_readable(slot) && block.key_at(slot) == hash {
                    result.push(block.value_at(slot));
                }
            }
        }
        Ok(result)
    }

    /// Tombstone every live slot holding `key`'s hash and `value`.
    ///
    /// Returns whether anything was removed. Slots are not reclaimed.
    pub fn remove(&self, key: &[u8], value: u32) -> Result<bool> {
        let _latch = self.latch.write();
        let header = self.read_header()?;
        let hash = hash_key(key)?;

        let mut removed = false;
        for (bucket, slots) in probe(hash, header.num_blocks()) {
            let mut guard = self.bpm.fetch_page_write(header.block_page_id(bucket))?;
            let mut block = SkipListBlockPage::new(guard.as_mut_slice());

            for slot in slots {
                if !block.is_occupied(slot) {
                    return Ok(removed);
                }
                if block.is_readable(slot)
                    && block.key_at(slot) == hash
                    && block.value_at(slot) == value
                {
                    block.remove(slot);
                    removed = true;
                }
            }
        }
        Ok(removed)
    }

    /// Decode the header page. The page is unpinned before returning.
    fn read_header(&self) -> Result<SkipListHeaderPage> {
        let guard = self.bpm.fetch_page_read(self.header_page_id)?;
        Ok(SkipListHeaderPage::from_bytes(guard.as_slice()))
    }
}

/// Low 32 bits of the murmur3 x64 128-bit hash of `key`.
fn hash_key(key: &[u8]) -> Result<u32> {
    let h128 = murmur3_x64_128(&mut Cursor::new(key), 0)?;
    Ok(h128 as u32)
}

/// Slots visited for `hash`, grouped by bucket so each block page is
/// pinned once per pass.
///
/// Starts at the hash's bucket and offset, runs to the end of that block,
/// through every other block in order (wrapping to block 0), and finishes
/// with the start of the first block. Every slot is visited exactly once.
fn probe(hash: u32, num_blocks: usize) -> impl Iterator<Item = (usize, Range<usize>)> {
    let bucket = hash as usize % num_blocks;
    let offset = hash as usize % BLOCK_ARRAY_SIZE;

    std::iter::once((bucket, offset..BLOCK_ARRAY_SIZE))
        .chain(
            (1..num_blocks).map(move |i| ((bucket + i) % num_blocks, 0..BLOCK_ARRAY_SIZE)),
        )
        .chain((offset > 0).then_some((bucket, 0..offset)))
}
