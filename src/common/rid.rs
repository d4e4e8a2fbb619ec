//! Row identifiers and their packed 32-bit index payload.

use std::fmt;

use super::PageId;

/// Location of a tuple: the table page holding it and its slot number.
///
/// Indexes store a `Rid` as an opaque `u32` payload. Packing keeps the low
/// 16 bits of the page id and the low 16 bits of the slot number, so it is
/// lossless only for page ids and slots below 65536.
///
/// # Example
/// ```
/// use pagecache::{PageId, Rid};
///
/// let rid = Rid::new(PageId::new(7), 3);
/// assert_eq!(Rid::unpack(rid.pack()), rid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    pub page_id: PageId,
    pub slot: u32,
}

impl Rid {
    pub fn new(page_id: PageId, slot: u32) -> Self {
        Self { page_id, slot }
    }

    /// Pack into the index payload: page id in bytes 0-1, slot in bytes 2-3
    /// (little-endian).
    pub fn pack(&self) -> u32 {
        let page = self.page_id.0 & 0xFFFF;
        let slot = self.slot & 0xFFFF;
        page | (slot << 16)
    }

    pub fn unpack(value: u32) -> Self {
        Self {
            page_id: PageId::new(value & 0xFFFF),
            slot: value >> 16,
        }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rid({}, slot {})", self.page_id.0, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout() {
        let rid = Rid::new(PageId::new(0x0102), 0x0304);
        assert_eq!(rid.pack().to_le_bytes(), [0x02, 0x01, 0x04, 0x03]);
    }

    #[test]
    fn test_pack_truncates_high_bits() {
        let rid = Rid::new(PageId::new(0x1_0005), 0x2_0009);
        assert_eq!(Rid::unpack(rid.pack()), Rid::new(PageId::new(5), 9));
    }
}
