//! Page types and on-page layouts.
//!
//! - [`Page`] - The raw 4KB data container with its LSN field
//! - [`PageHeader`] - The 8-byte header at the start of every page
//! - [`SkipListHeaderPage`] - Bucket directory of the disk-backed index
//! - [`SkipListBlockPage`] - Hash-bucket slots with occupancy bitmaps
//! - [`SortedBlockPage`] - Key-ordered entries searchable by binary search

#[allow(clippy::module_inception)]
mod page;
mod page_header;
mod skip_list_block_page;
mod skip_list_header_page;
mod sorted_block_page;

pub use page::Page;
pub use page_header::PageHeader;
pub use skip_list_block_page::SkipListBlockPage;
pub use skip_list_header_page::SkipListHeaderPage;
pub use sorted_block_page::{EntryMatch, SkipListPair, SortedBlockPage};
