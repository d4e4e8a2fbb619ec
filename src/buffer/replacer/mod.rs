//! Eviction policy implementations (replacers).
//!
//! - [`ClockReplacer`] - CLOCK / second chance, the buffer pool default

mod clock;

pub use clock::ClockReplacer;

use crate::common::FrameId;

/// Tracks which frames may be evicted and picks victims among them.
///
/// A frame enters the candidate set on [`unpin`](Replacer::unpin) and
/// leaves it on [`pin`](Replacer::pin) or when returned by
/// [`victim`](Replacer::victim). Implementations synchronize internally.
pub trait Replacer: Send + Sync {
    /// Remove and return the frame to reuse next, or `None` when no frame
    /// is evictable.
    fn victim(&self) -> Option<FrameId>;

    /// The frame is in use and must not be evicted. No-op if untracked.
    fn pin(&self, frame_id: FrameId);

    /// The frame's pin count dropped to zero. No-op if already tracked.
    fn unpin(&self, frame_id: FrameId);

    /// Number of evictable frames.
    fn size(&self) -> usize;
}
