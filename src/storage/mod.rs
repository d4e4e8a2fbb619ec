//! Storage layer - block I/O and page formats.
//!
//! - [`DiskManager`] - Block I/O interface, with file and in-memory backends
//! - [`page`] - Page types and layouts

mod disk_manager;
pub mod page;

pub use disk_manager::{DiskManager, FileDiskManager, MemoryDiskManager};
