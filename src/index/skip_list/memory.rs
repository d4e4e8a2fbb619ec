//! Arena-backed in-memory skip list.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::common::config::{SKIP_LIST_MAX_LEVEL, SKIP_LIST_PROB};

use super::iterator::SkipListIter;

/// Arena slot of the sentinel that ends every level.
pub(super) const SENTINEL: usize = 0;
/// Arena slot of the header node.
pub(super) const HEADER: usize = 1;

#[derive(Debug)]
enum NodeKey<K> {
    /// Header node, or a freed slot.
    Unused,
    Finite(K),
    /// The sentinel; compares above every finite key.
    Infinite,
}

#[derive(Debug)]
struct Node<K> {
    key: NodeKey<K>,
    value: u32,
    /// `forward[i]` is the next node at level `i`.
    forward: Vec<usize>,
}

/// An ordered map from keys to 32-bit payloads with expected O(log n)
/// lookup, insert and remove.
///
/// Nodes live in a `Vec` and link to each other by index. Slot 0 is the
/// sentinel, slot 1 the header; slots freed by [`remove`](Self::remove)
/// are reused by later inserts.
///
/// Keys are unique: inserting an existing key overwrites its value.
///
/// The list does no locking of its own. Share it across threads behind a
/// `Mutex` or `RwLock`.
///
/// # Example
/// ```
/// use pagecache::index::SkipList;
///
/// let mut list = SkipList::with_seed(7);
/// list.insert(20, 2);
/// list.insert(10, 1);
/// list.insert(30, 3);
///
/// assert_eq!(list.get(&20), Some(2));
/// let keys: Vec<i32> = list.range(Some(&15), None).map(|(k, _)| *k).collect();
/// assert_eq!(keys, vec![20, 30]);
/// ```
pub struct SkipList<K> {
    nodes: Vec<Node<K>>,
    free: Vec<usize>,
    cur_max_level: usize,
    len: usize,
    rng: StdRng,
}

impl<K: Ord> SkipList<K> {
    /// Create an empty list seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Create an empty list whose level draws are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let sentinel = Node {
            key: NodeKey::Infinite,
            value: u32::MAX,
            forward: Vec::new(),
        };
        let header = Node {
            key: NodeKey::Unused,
            value: u32::MAX,
            forward: vec![SENTINEL; SKIP_LIST_MAX_LEVEL],
        };

        Self {
            nodes: vec![sentinel, header],
            free: Vec::new(),
            cur_max_level: 1,
            len: 0,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels currently in use.
    pub fn level(&self) -> usize {
        self.cur_max_level
    }

    /// Draw a level for a new node: one plus the number of successful coin
    /// flips, capped at the current level.
    pub fn node_level(&mut self) -> usize {
        draw_level(&mut self.rng, self.cur_max_level)
    }

    /// Insert `key`, or overwrite its value if present.
    pub fn insert(&mut self, key: K, value: u32) {
        let mut update = [HEADER; SKIP_LIST_MAX_LEVEL];
        let pred = self.descend(&key, &mut update);

        let next = self.nodes[pred].forward[0];
        if self.key_eq(next, &key) {
            self.nodes[next].value = value;
            return;
        }

        let mut level = draw_level(&mut self.rng, self.cur_max_level);
        // Grow by at most one level per insert
        if level >= self.cur_max_level && self.cur_max_level < SKIP_LIST_MAX_LEVEL {
            self.cur_max_level += 1;
            level = self.cur_max_level;
            update[level - 1] = HEADER;
            trace!(level, "skip list grew a level");
        }

        let forward: Vec<usize> = (0..level)
            .map(|i| self.nodes[update[i]].forward[i])
            .collect();
        let idx = self.alloc(Node {
            key: NodeKey::Finite(key),
            value,
            forward,
        });

        for (i, &p) in update.iter().enumerate().take(level) {
            self.nodes[p].forward[i] = idx;
        }
        self.len += 1;
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &K) -> Option<u32> {
        let mut update = [HEADER; SKIP_LIST_MAX_LEVEL];
        let pred = self.descend(key, &mut update);

        let next = self.nodes[pred].forward[0];
        self.key_eq(next, key).then(|| self.nodes[next].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`, returning the value it held.
    pub fn remove(&mut self, key: &K) -> Option<u32> {
        let mut update = [HEADER; SKIP_LIST_MAX_LEVEL];
        let pred = self.descend(key, &mut update);

        let target = self.nodes[pred].forward[0];
        if !self.key_eq(target, key) {
            return None;
        }
        let value = self.nodes[target].value;

        for (i, &p) in update.iter().enumerate().take(self.cur_max_level) {
            if self.nodes[p].forward[i] != target {
                break;
            }
            self.nodes[p].forward[i] = self.nodes[target].forward[i];
        }

        while self.cur_max_level > 1
            && self.nodes[HEADER].forward[self.cur_max_level - 1] == SENTINEL
        {
            self.cur_max_level -= 1;
        }

        self.release(target);
        self.len -= 1;
        Some(value)
    }

    /// Entry with the greatest key strictly less than `key`.
    pub fn last_before(&self, key: &K) -> Option<(&K, u32)> {
        let mut update = [HEADER; SKIP_LIST_MAX_LEVEL];
        let pred = self.descend(key, &mut update);
        self.entry(pred)
    }

    /// Entries in key order.
    pub fn iter(&self) -> SkipListIter<'_, K> {
        SkipListIter::new(self, HEADER, None)
    }

    /// Entries with `start <= key <= end`, in key order. A missing bound is
    /// unbounded on that side.
    pub fn range<'a>(&'a self, start: Option<&K>, end: Option<&'a K>) -> SkipListIter<'a, K> {
        let from = match start {
            Some(start) => {
                let mut update = [HEADER; SKIP_LIST_MAX_LEVEL];
                self.descend(start, &mut update)
            }
            None => HEADER,
        };
        SkipListIter::new(self, from, end)
    }

    // ========================================================================
    // Internal: navigation used by the iterator
    // ========================================================================

    #[inline]
    pub(super) fn next_of(&self, idx: usize) -> usize {
        self.nodes[idx].forward[0]
    }

    /// Key and value of a data node; `None` for the header and sentinel.
    #[inline]
    pub(super) fn entry(&self, idx: usize) -> Option<(&K, u32)> {
        match &self.nodes[idx].key {
            NodeKey::Finite(k) => Some((k, self.nodes[idx].value)),
            _ => None,
        }
    }

    // ========================================================================
    // Internal: search and arena
    // ========================================================================

    /// Walk down from the top level, recording the last node before `key` at
    /// each level. Returns the level-0 predecessor.
    fn descend(&self, key: &K, update: &mut [usize; SKIP_LIST_MAX_LEVEL]) -> usize {
        let mut x = HEADER;
        for level in (0..self.cur_max_level).rev() {
            loop {
                let next = self.nodes[x].forward[level];
                if !self.key_lt(next, key) {
                    break;
                }
                x = next;
            }
            update[level] = x;
        }
        x
    }

    #[inline]
    fn key_lt(&self, idx: usize, key: &K) -> bool {
        match &self.nodes[idx].key {
            NodeKey::Finite(k) => k < key,
            NodeKey::Infinite => false,
            NodeKey::Unused => unreachable!("freed node {} still linked", idx),
        }
    }

    #[inline]
    fn key_eq(&self, idx: usize, key: &K) -> bool {
        matches!(&self.nodes[idx].key, NodeKey::Finite(k) if k == key)
    }

    fn alloc(&mut self, node: Node<K>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) {
        self.nodes[idx] = Node {
            key: NodeKey::Unused,
            value: 0,
            forward: Vec::new(),
        };
        self.free.push(idx);
    }
}

fn draw_level<R: Rng + ?Sized>(rng: &mut R, cap: usize) -> usize {
    let mut level = 1;
    while rng.random::<f64>() < SKIP_LIST_PROB {
        level += 1;
    }
    level.min(cap)
}

impl<K: Ord> Default for SkipList<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug> fmt::Debug for SkipList<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
