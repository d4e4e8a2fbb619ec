//! Hash-bucket block page of the disk-backed skip list index.

use crate::common::config::{BLOCK_ARRAY_SIZE, PAGE_HEADER_SIZE, PAGE_SIZE};

use super::skip_list_header_page::{read_u32, write_u32};

/// Bytes in each of the two slot bitmaps (32).
const BITMAP_BYTES: usize = (BLOCK_ARRAY_SIZE - 1) / 8 + 1;

const OFFSET_OCCUPIED: usize = PAGE_HEADER_SIZE;
const OFFSET_READABLE: usize = OFFSET_OCCUPIED + BITMAP_BYTES;
const OFFSET_ARRAY: usize = OFFSET_READABLE + BITMAP_BYTES;

/// Size of one (key, value) slot.
const SLOT_SIZE: usize = 8;

const _: () = assert!(OFFSET_ARRAY + BLOCK_ARRAY_SIZE * SLOT_SIZE <= PAGE_SIZE);

/// Accessor over the bytes of one bucket page.
///
/// Slots hold `(key, value)` pairs where the key is the 32-bit key hash.
/// Two bitmaps track slot state:
/// - `occupied`: the slot has ever held an entry
/// - `readable`: the slot holds a live entry
///
/// An occupied but unreadable slot is a tombstone. Tombstones are never
/// reused by [`insert`](Self::insert).
///
/// # Layout
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       8     PageHeader (reserved + lsn)
/// 8       32    occupied bitmap
/// 40      32    readable bitmap
/// 72      2016  252 × (key u32, value u32)
/// ```
///
/// Wrap `&[u8]` for reads and `&mut [u8]` for writes.
pub struct SkipListBlockPage<B> {
    data: B,
}

impl<B: AsRef<[u8]>> SkipListBlockPage<B> {
    /// # Panics
    /// Panics if the buffer is smaller than a page.
    pub fn new(data: B) -> Self {
        assert!(
            data.as_ref().len() >= PAGE_SIZE,
            "buffer too small for block page"
        );
        Self { data }
    }

    /// Stored key hash at `index`.
    #[inline]
    pub fn key_at(&self, index: usize) -> u32 {
        read_u32(self.data.as_ref(), slot_offset(index))
    }

    #[inline]
    pub fn value_at(&self, index: usize) -> u32 {
        read_u32(self.data.as_ref(), slot_offset(index) + 4)
    }

    #[inline]
    pub fn is_occupied(&self, index: usize) -> bool {
        test_bit(self.data.as_ref(), OFFSET_OCCUPIED, index)
    }

    #[inline]
    pub fn is_readable(&self, index: usize) -> bool {
        test_bit(self.data.as_ref(), OFFSET_READABLE, index)
    }

    /// Number of live entries.
    pub fn num_readable(&self) -> usize {
        self.data.as_ref()[OFFSET_READABLE..OFFSET_READABLE + BITMAP_BYTES]
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum()
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SkipListBlockPage<B> {
    /// Claim slot `index` for `(key, value)`.
    ///
    /// Returns `false` and leaves the page untouched if the slot is occupied,
    /// including by a tombstone.
    pub fn insert(&mut self, index: usize, key: u32, value: u32) -> bool {
        if self.is_occupied(index) {
            return false;
        }

        let data = self.data.as_mut();
        let offset = slot_offset(index);
        write_u32(data, offset, key);
        write_u32(data, offset + 4, value);
        set_bit(data, OFFSET_OCCUPIED, index);
        set_bit(data, OFFSET_READABLE, index);
        true
    }

    /// Turn a live slot into a tombstone. No-op if the slot is not readable.
    pub fn remove(&mut self, index: usize) {
        if !self.is_readable(index) {
            return;
        }
        clear_bit(self.data.as_mut(), OFFSET_READABLE, index);
    }
}

#[inline]
fn slot_offset(index: usize) -> usize {
    assert!(index < BLOCK_ARRAY_SIZE, "slot index {} out of range", index);
    OFFSET_ARRAY + index * SLOT_SIZE
}

#[inline]
fn test_bit(data: &[u8], base: usize, index: usize) -> bool {
    data[base + index / 8] & (1 << (index % 8)) != 0
}

#[inline]
fn set_bit(data: &mut [u8], base: usize, index: usize) {
    data[base + index / 8] |= 1 << (index % 8);
}

#[inline]
fn clear_bit(data: &mut [u8], base: usize, index: usize) {
    data[base + index / 8] &= !(1 << (index % 8));
}
