//! Forward iterator over an in-memory skip list.

use std::iter::FusedIterator;

use super::memory::{SkipList, SENTINEL};

/// Walks level 0 of a [`SkipList`] from a starting node.
///
/// Yields `(key, value)` pairs until it reaches the sentinel or a key above
/// the inclusive upper bound. Once finished it stays finished.
pub struct SkipListIter<'a, K> {
    list: &'a SkipList<K>,
    cur: usize,
    end: Option<&'a K>,
    done: bool,
}

impl<'a, K: Ord> SkipListIter<'a, K> {
    /// Iterate the nodes after `from`.
    pub(super) fn new(list: &'a SkipList<K>, from: usize, end: Option<&'a K>) -> Self {
        Self {
            list,
            cur: from,
            end,
            done: false,
        }
    }
}

impl<'a, K: Ord> Iterator for SkipListIter<'a, K> {
    type Item = (&'a K, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.cur = self.list.next_of(self.cur);
        if self.cur == SENTINEL {
            self.done = true;
            return None;
        }

        let (key, value) = self.list.entry(self.cur)?;
        if self.end.is_some_and(|end| key > end) {
            self.done = true;
            return None;
        }
        Some((key, value))
    }
}

impl<K: Ord> FusedIterator for SkipListIter<'_, K> {}
