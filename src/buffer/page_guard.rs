//! RAII guards for pinned, latched pages.
//!
//! Every fetch is paired with exactly one `UnpinPage(id, is_dirty)`, issued
//! when the guard drops. The unpin runs before the latch is released, so a
//! page modified under a write guard is already flagged dirty by the time
//! any flusher can latch it again.
//!
//! - [`PageReadGuard`]: pin + shared latch, always unpins clean
//! - [`PageWriteGuard`]: pin + exclusive latch, unpins dirty only if the
//!   page was mutably borrowed

use std::ops::{Deref, DerefMut};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId};
use crate::storage::page::Page;

use super::buffer_pool_manager::BufferPoolManager;

/// One pin on a frame, released on drop.
struct Pin<'a> {
    bpm: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    dirty: bool,
}

impl Drop for Pin<'_> {
    fn drop(&mut self) {
        self.bpm.unpin_page_internal(self.frame_id, self.dirty);
    }
}

/// Shared access to a pinned page.
///
/// ```ignore
/// let guard = bpm.fetch_page_read(page_id)?;
/// let lsn = guard.lsn();
/// ```
pub struct PageReadGuard<'a> {
    // Declared before `lock`: unpin happens while the latch is still held
    pin: Pin<'a>,
    lock: RwLockReadGuard<'a, Page>,
}

impl<'a> PageReadGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        lock: RwLockReadGuard<'a, Page>,
    ) -> Self {
        let pin = Pin {
            bpm,
            frame_id,
            page_id,
            dirty: false,
        };
        Self { pin, lock }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.pin.frame_id
    }
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

/// Exclusive access to a pinned page.
///
/// The first mutable borrow (`DerefMut`) marks the guard dirty. A guard
/// that was only read through drops clean and causes no write-back.
///
/// ```ignore
/// let mut guard = bpm.fetch_page_write(page_id)?;
/// guard.copy_from(64, b"row");
/// ```
pub struct PageWriteGuard<'a> {
    pin: Pin<'a>,
    lock: RwLockWriteGuard<'a, Page>,
}

impl<'a> PageWriteGuard<'a> {
    /// `dirty` seeds the flag; freshly allocated pages start dirty so they
    /// reach storage even if nobody writes to them.
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        lock: RwLockWriteGuard<'a, Page>,
        dirty: bool,
    ) -> Self {
        let pin = Pin {
            bpm,
            frame_id,
            page_id,
            dirty,
        };
        Self { pin, lock }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.pin.frame_id
    }

    /// Whether dropping this guard will mark the page dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.pin.dirty
    }
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        self.pin.dirty = true;
        &mut self.lock
    }
}
