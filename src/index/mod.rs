//! Index structures mapping keys to row identifiers.
//!
//! # Components
//! - [`Index`] - The operations the table layer needs from any index
//! - [`SkipList`] - In-memory ordered index (point lookup + range scans)
//! - [`DiskSkipList`] - Page-backed hash index (point lookup only)
//! - [`Value`] - Typed scalar key

pub mod skip_list;
mod value;

pub use skip_list::{DiskSkipList, SkipList, SkipListIter};
pub use value::Value;

use crate::common::{Result, Rid};

/// Key-to-[`Rid`] index used by the table layer.
///
/// Not finding a key is never an error: `scan_key` returns an empty `Vec`
/// and `delete_entry` returns `false`.
pub trait Index {
    type Key: ?Sized;

    fn insert_entry(&mut self, key: &Self::Key, rid: Rid) -> Result<()>;

    /// All row ids stored under `key`.
    fn scan_key(&self, key: &Self::Key) -> Result<Vec<Rid>>;

    /// Remove the `(key, rid)` pair. Returns whether it was present.
    fn delete_entry(&mut self, key: &Self::Key, rid: Rid) -> Result<bool>;
}

impl Index for SkipList<Value> {
    type Key = Value;

    /// Overwrites the row id of an existing key.
    fn insert_entry(&mut self, key: &Value, rid: Rid) -> Result<()> {
        self.insert(key.clone(), rid.pack());
        Ok(())
    }

    fn scan_key(&self, key: &Value) -> Result<Vec<Rid>> {
        Ok(self.get(key).map(Rid::unpack).into_iter().collect())
    }

    /// Leaves the key in place when it maps to a different row id.
    fn delete_entry(&mut self, key: &Value, rid: Rid) -> Result<bool> {
        if self.get(key) != Some(rid.pack()) {
            return Ok(false);
        }
        Ok(self.remove(key).is_some())
    }
}

impl Index for DiskSkipList {
    type Key = [u8];

    fn insert_entry(&mut self, key: &[u8], rid: Rid) -> Result<()> {
        self.insert(key, rid.pack())
    }

    fn scan_key(&self, key: &[u8]) -> Result<Vec<Rid>> {
        Ok(self.get_value(key)?.into_iter().map(Rid::unpack).collect())
    }

    fn delete_entry(&mut self, key: &[u8], rid: Rid) -> Result<bool> {
        self.remove(key, rid.pack())
    }
}
