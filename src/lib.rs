//! pagecache - a paged buffer cache with CLOCK eviction and skip-list
//! indexes built on top of it.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                  Index Layer (index/)                    │   │
//! │  │     SkipList (in memory)      DiskSkipList (on pages)    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Buffer Pool (buffer/)                    │   │
//! │  │   BufferPoolManager + Frame + page guards + stats        │   │
//! │  │   ClockReplacer (any Replacer can be plugged in)         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                  Storage Layer (storage/)                │   │
//! │  │   DiskManager (file / memory) + page layouts             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Lsn, Rid, Error, config)
//! - [`buffer`] - Buffer pool management and eviction
//! - [`storage`] - Block I/O and page formats
//! - [`index`] - Skip list indexes
//!
//! # Quick Start
//! ```
//! use std::sync::Arc;
//! use pagecache::buffer::BufferPoolManager;
//! use pagecache::index::{DiskSkipList, SkipList};
//! use pagecache::storage::MemoryDiskManager;
//!
//! let bpm = Arc::new(BufferPoolManager::new(16, MemoryDiskManager::new()));
//! let disk_index = DiskSkipList::new(Arc::clone(&bpm), 4).unwrap();
//! disk_index.insert(b"key", 42).unwrap();
//! assert_eq!(disk_index.get_value(b"key").unwrap(), vec![42]);
//!
//! let mut mem_index = SkipList::with_seed(1);
//! mem_index.insert(3, 30);
//! assert_eq!(mem_index.get(&3), Some(30));
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

pub use common::config::PAGE_SIZE;
pub use common::{Error, FrameId, Lsn, PageId, Result, Rid};

pub use buffer::{BufferPoolManager, BufferPoolStats, Frame, StatsSnapshot};
pub use index::{DiskSkipList, Index, SkipList, Value};
pub use storage::page::{Page, PageHeader};
pub use storage::{DiskManager, FileDiskManager, MemoryDiskManager};
