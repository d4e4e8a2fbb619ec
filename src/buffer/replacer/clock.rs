//! CLOCK (second chance) replacement policy.
//!
//! Approximates LRU: every evictable frame sits on a circular list with a
//! reference bit. The clock hand sweeps the ring, clearing set bits and
//! evicting the first frame whose bit is already clear.

use parking_lot::Mutex;
use tracing::trace;

use crate::common::FrameId;

use super::Replacer;

/// One entry of the ring, indexed by frame id.
#[derive(Debug, Clone, Copy)]
struct ClockNode {
    prev: usize,
    next: usize,
    referenced: bool,
}

#[derive(Debug)]
struct ClockState {
    /// `nodes[f]` is `Some` iff frame `f` is evictable.
    nodes: Vec<Option<ClockNode>>,
    hand: Option<usize>,
    size: usize,
}

impl ClockState {
    fn node_mut(&mut self, frame: usize) -> &mut ClockNode {
        match self.nodes[frame].as_mut() {
            Some(node) => node,
            None => unreachable!("frame {} is linked but not tracked", frame),
        }
    }

    /// Link `frame` just behind the hand, so it is the last one visited.
    fn insert(&mut self, frame: usize) {
        match self.hand {
            None => {
                self.nodes[frame] = Some(ClockNode {
                    prev: frame,
                    next: frame,
                    referenced: true,
                });
                self.hand = Some(frame);
            }
            Some(hand) => {
                let prev = self.node_mut(hand).prev;
                self.nodes[frame] = Some(ClockNode {
                    prev,
                    next: hand,
                    referenced: true,
                });
                self.node_mut(prev).next = frame;
                self.node_mut(hand).prev = frame;
            }
        }
        self.size += 1;
    }

    /// Unlink `frame`. A hand pointing at it moves to its successor.
    fn remove(&mut self, frame: usize) -> bool {
        let Some(node) = self.nodes[frame].take() else {
            return false;
        };

        self.size -= 1;
        if self.size == 0 {
            self.hand = None;
            return true;
        }

        self.node_mut(node.prev).next = node.next;
        self.node_mut(node.next).prev = node.prev;
        if self.hand == Some(frame) {
            self.hand = Some(node.next);
        }
        true
    }
}

/// CLOCK replacer over a fixed number of frames.
///
/// # Thread Safety
/// All state sits behind one `Mutex`; every operation takes it once.
///
/// # Complexity
/// `pin`, `unpin` and `size` are O(1). `victim` is O(k) in the number of
/// referenced frames it passes over, at most one full lap.
///
/// # Example
/// ```
/// use pagecache::buffer::replacer::{ClockReplacer, Replacer};
/// use pagecache::FrameId;
///
/// let replacer = ClockReplacer::new(3);
/// replacer.unpin(FrameId::new(0));
/// replacer.unpin(FrameId::new(1));
/// replacer.pin(FrameId::new(0));
///
/// assert_eq!(replacer.victim(), Some(FrameId::new(1)));
/// assert_eq!(replacer.victim(), None);
/// ```
#[derive(Debug)]
pub struct ClockReplacer {
    state: Mutex<ClockState>,
    capacity: usize,
}

impl ClockReplacer {
    /// Create a replacer for frames `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(ClockState {
                nodes: vec![None; capacity],
                hand: None,
                size: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn check(&self, frame_id: FrameId) {
        assert!(
            frame_id.0 < self.capacity,
            "{} out of range for replacer of capacity {}",
            frame_id,
            self.capacity
        );
    }
}

impl Replacer for ClockReplacer {
    fn victim(&self) -> Option<FrameId> {
        let mut state = self.state.lock();

        loop {
            let hand = state.hand?;
            let node = state.node_mut(hand);
            if node.referenced {
                node.referenced = false;
                let next = node.next;
                state.hand = Some(next);
            } else {
                state.remove(hand);
                trace!(frame = hand, "clock victim");
                return Some(FrameId::new(hand));
            }
        }
    }

    fn pin(&self, frame_id: FrameId) {
        self.check(frame_id);
        self.state.lock().remove(frame_id.0);
    }

    fn unpin(&self, frame_id: FrameId) {
        self.check(frame_id);
        let mut state = self.state.lock();
        if state.nodes[frame_id.0].is_none() {
            state.insert(frame_id.0);
        }
    }

    fn size(&self) -> usize {
        self.state.lock().size
    }
}
