//! Common types shared across the storage core.
//!
//! - Configuration constants
//! - Error types
//! - Identifiers (PageId, FrameId, Lsn, Rid)

pub mod config;
pub mod error;
mod frame_id;
mod page_id;
mod rid;

pub use error::{Error, Result};
pub use frame_id::FrameId;
pub use page_id::{Lsn, PageId};
pub use rid::Rid;
