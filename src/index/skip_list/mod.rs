//! Skip list indexes.
//!
//! - [`SkipList`] - ordered in-memory skip list with range iteration
//! - [`DiskSkipList`] - hashed bucket index stored in buffer-pool pages
//!
//! The two share no code; both implement [`Index`](super::Index).

mod disk;
mod iterator;
mod memory;

pub use disk::DiskSkipList;
pub use iterator::SkipListIter;
pub use memory::SkipList;
