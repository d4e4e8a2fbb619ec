//! Configuration constants for the storage core.

/// Size of a page in bytes (4KB).
///
/// Every frame in the buffer pool holds exactly one page of this size, and
/// the disk manager reads and writes in units of it.
pub const PAGE_SIZE: usize = 4096;

/// Bytes reserved at the start of every page before any format-specific data.
///
/// # Layout
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     reserved
/// 4       4     lsn (little-endian)
/// ```
pub const PAGE_HEADER_SIZE: usize = 8;

/// Offset of the log sequence number within a page.
pub const OFFSET_LSN: usize = 4;

/// Per-pair size used by the block capacity formula. Stored pairs are 8 bytes.
const SIZE_OF_BLOCK_PAIR_ESTIMATE: usize = 16;

/// Number of slots in one hash-bucket block page (252).
pub const BLOCK_ARRAY_SIZE: usize = 4 * PAGE_SIZE / (4 * SIZE_OF_BLOCK_PAIR_ESTIMATE + 1);

/// Highest level a skip-list node can reach.
pub const SKIP_LIST_MAX_LEVEL: usize = 20;

/// Probability that a skip-list node is promoted one more level.
pub const SKIP_LIST_PROB: f64 = 0.5;
