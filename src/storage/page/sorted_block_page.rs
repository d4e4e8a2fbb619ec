//! Sorted block page: (key, value) entries kept in key order.

use crate::common::config::{PAGE_HEADER_SIZE, PAGE_SIZE};

use super::skip_list_header_page::{read_u32, write_u32};

const OFFSET_ENTRY_COUNT: usize = PAGE_HEADER_SIZE;
const OFFSET_ENTRIES: usize = PAGE_HEADER_SIZE + 4;
const ENTRY_SIZE: usize = 8;

/// One `(key, value)` pair of a block page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipListPair {
    pub key: u32,
    pub value: u32,
}

/// Result of [`SortedBlockPage::find_entry_by_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMatch {
    /// Whether `entry.key` equals the searched key.
    pub found: bool,
    /// Position of the exact match, or of the nearest smaller entry.
    pub index: usize,
    pub entry: SkipListPair,
}

/// Accessor over a block page whose entries are kept sorted by key.
///
/// Unlike [`SkipListBlockPage`](super::SkipListBlockPage) this form has no
/// bitmaps: the first `len()` entries are all live, so lookups can binary
/// search them in place.
///
/// # Layout
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       8     PageHeader (reserved + lsn)
/// 8       4     entry count
/// 12      8*n   (key u32, value u32), ascending by key
/// ```
pub struct SortedBlockPage<B> {
    data: B,
}

impl<B: AsRef<[u8]>> SortedBlockPage<B> {
    /// Most entries one page can hold (510).
    pub const CAPACITY: usize = (PAGE_SIZE - OFFSET_ENTRIES) / ENTRY_SIZE;

    /// # Panics
    /// Panics if the buffer is smaller than a page.
    pub fn new(data: B) -> Self {
        assert!(
            data.as_ref().len() >= PAGE_SIZE,
            "buffer too small for block page"
        );
        Self { data }
    }

    /// Number of live entries (clamped to [`Self::CAPACITY`]).
    #[inline]
    pub fn len(&self) -> usize {
        (read_u32(self.data.as_ref(), OFFSET_ENTRY_COUNT) as usize).min(Self::CAPACITY)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= Self::CAPACITY
    }

    /// # Panics
    /// Panics if `index >= len()`.
    pub fn entry_at(&self, index: usize) -> SkipListPair {
        assert!(index < self.len(), "entry index {} out of range", index);
        let data = self.data.as_ref();
        let offset = entry_offset(index);
        SkipListPair {
            key: read_u32(data, offset),
            value: read_u32(data, offset + 4),
        }
    }

    #[inline]
    pub fn key_at(&self, index: usize) -> u32 {
        self.entry_at(index).key
    }

    #[inline]
    pub fn value_at(&self, index: usize) -> u32 {
        self.entry_at(index).value
    }

    /// Binary search for `key`.
    ///
    /// Returns the exact match if present, otherwise the nearest entry with
    /// a smaller key. Returns `None` when the page is empty or every entry
    /// is greater than `key`.
    pub fn find_entry_by_key(&self, key: u32) -> Option<EntryMatch> {
        // Count of entries with key <= target
        let mut lo = 0;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key_at(mid) <= key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        if lo == 0 {
            return None;
        }

        let index = lo - 1;
        let entry = self.entry_at(index);
        Some(EntryMatch {
            found: entry.key == key,
            index,
            entry,
        })
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SortedBlockPage<B> {
    /// Insert `(key, value)` in key order.
    ///
    /// An existing entry with the same key gets its value overwritten.
    /// Returns `false` if the key is new and the page is full.
    pub fn insert(&mut self, key: u32, value: u32) -> bool {
        let position = match self.find_entry_by_key(key) {
            Some(m) if m.found => {
                write_u32(self.data.as_mut(), entry_offset(m.index) + 4, value);
                return true;
            }
            Some(m) => m.index + 1,
            None => 0,
        };

        let len = self.len();
        if len >= Self::CAPACITY {
            return false;
        }

        let data = self.data.as_mut();
        let start = entry_offset(position);
        let end = entry_offset(len);
        data.copy_within(start..end, start + ENTRY_SIZE);
        write_u32(data, start, key);
        write_u32(data, start + 4, value);
        write_u32(data, OFFSET_ENTRY_COUNT, (len + 1) as u32);
        true
    }

    /// Remove the entry at `index`, shifting later entries down.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> SkipListPair {
        let removed = self.entry_at(index);
        let len = self.len();

        let data = self.data.as_mut();
        data.copy_within(entry_offset(index + 1)..entry_offset(len), entry_offset(index));
        write_u32(data, OFFSET_ENTRY_COUNT, (len - 1) as u32);
        removed
    }

    /// Remove the entry with `key`. Returns `false` if absent.
    pub fn remove(&mut self, key: u32) -> bool {
        match self.find_entry_by_key(key) {
            Some(m) if m.found => {
                self.remove_at(m.index);
                true
            }
            _ => false,
        }
    }
}

#[inline]
fn entry_offset(index: usize) -> usize {
    OFFSET_ENTRIES + index * ENTRY_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::page::Page;

    fn filled(page: &mut Page, keys: impl Iterator<Item = u32>) {
        let mut block = SortedBlockPage::new(page.as_mut_slice());
        for k in keys {
            assert!(block.insert(k, k));
        }
    }

    #[test]
    fn test_binary_search_even_and_odd_counts() {
        for count in [50u32, 51] {
            let mut page = Page::new();
            filled(&mut page, (0..count).map(|i| i * 10));
            let block = SortedBlockPage::new(page.as_slice());
            assert_eq!(block.len(), count as usize);

            for i in 0..(count * 2) {
                let key = i * 5;
                let m = block.find_entry_by_key(key).unwrap();
                if i % 2 == 0 {
                    assert!(m.found);
                    assert_eq!(m.entry.value, key);
                } else {
                    assert!(!m.found);
                    assert_eq!(key - block.value_at(m.index), 5);
                }
            }
        }
    }

    #[test]
    fn test_search_below_first_and_empty() {
        let mut page = Page::new();
        assert!(SortedBlockPage::new(page.as_slice()).find_entry_by_key(5).is_none());

        filled(&mut page, [10, 20].into_iter());
        let block = SortedBlockPage::new(page.as_slice());
        assert!(block.find_entry_by_key(9).is_none());

        let m = block.find_entry_by_key(u32::MAX).unwrap();
        assert_eq!((m.found, m.index, m.entry.key), (false, 1, 20));
    }

    #[test]
    fn test_insert_keeps_order_and_overwrites() {
        let mut page = Page::new();
        let mut block = SortedBlockPage::new(page.as_mut_slice());

        for k in [30, 10, 20, 40, 0] {
            assert!(block.insert(k, k + 1));
        }
        assert!(block.insert(20, 99));

        let keys: Vec<u32> = (0..block.len()).map(|i| block.key_at(i)).collect();
        assert_eq!(keys, vec![0, 10, 20, 30, 40]);
        assert_eq!(block.value_at(2), 99);
    }

    #[test]
    fn test_remove() {
        let mut page = Page::new();
        filled(&mut page, (0..5).map(|i| i * 10));
        let mut block = SortedBlockPage::new(page.as_mut_slice());

        assert!(block.remove(20));
        assert!(!block.remove(20));
        assert_eq!(block.remove_at(0), SkipListPair { key: 0, value: 0 });

        let keys: Vec<u32> = (0..block.len()).map(|i| block.key_at(i)).collect();
        assert_eq!(keys, vec![10, 30, 40]);
    }

    #[test]
    fn test_capacity() {
        let mut page = Page::new();
        let mut block = SortedBlockPage::new(page.as_mut_slice());
        assert_eq!(SortedBlockPage::<&[u8]>::CAPACITY, 510);

        for k in 0..SortedBlockPage::<&[u8]>::CAPACITY as u32 {
            assert!(block.insert(k, k));
        }
        assert!(block.is_full());
        assert!(!block.insert(100_000, 1));
        // Overwrite still allowed when full
        assert!(block.insert(7, 70));
        assert_eq!(block.value_at(7), 70);
    }
}
