//! Buffer pool management.
//!
//! The buffer pool caches disk pages in a fixed set of frames. Callers pin
//! pages through RAII guards; unpinned frames are handed to an eviction
//! policy that picks which one to reuse when the pool is full.
//!
//! # Components
//! - [`BufferPoolManager`] - The page cache
//! - [`Frame`] - A slot holding one page plus pin count, dirty flag and latch
//! - [`PageReadGuard`] / [`PageWriteGuard`] - Pinned, latched page access
//! - [`BufferPoolStats`] - Hit/miss/eviction counters
//! - [`replacer`] - Eviction policies

mod buffer_pool_manager;
mod frame;
mod page_guard;
pub mod replacer;
mod stats;

pub use buffer_pool_manager::BufferPoolManager;
pub use frame::Frame;
pub use page_guard::{PageReadGuard, PageWriteGuard};
pub use stats::{BufferPoolStats, StatsSnapshot};
