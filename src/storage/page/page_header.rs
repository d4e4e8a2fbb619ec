//! Common page header.
//!
//! Every page starts with an 8-byte [`PageHeader`]. Format-specific data
//! (header page directory, bucket slots, sorted entries) begins at
//! [`PAGE_HEADER_SIZE`].

use crate::common::config::{OFFSET_LSN, PAGE_HEADER_SIZE};
use crate::common::Lsn;

/// Metadata stored at the beginning of every page.
///
/// # Layout (8 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     reserved (zero)
/// 4       4     lsn (Log Sequence Number, little-endian)
/// ```
///
/// The recovery layer owns the meaning of the LSN; this core only carries it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Log Sequence Number of last modification.
    pub lsn: Lsn,
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = PAGE_HEADER_SIZE;

    pub const OFFSET_LSN: usize = OFFSET_LSN;

    pub fn new(lsn: Lsn) -> Self {
        Self { lsn }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        let lsn = Lsn::from_le_bytes([
            data[Self::OFFSET_LSN],
            data[Self::OFFSET_LSN + 1],
            data[Self::OFFSET_LSN + 2],
            data[Self::OFFSET_LSN + 3],
        ]);

        Self { lsn }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// The reserved bytes are left untouched.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        data[Self::OFFSET_LSN..Self::OFFSET_LSN + Lsn::SIZE]
            .copy_from_slice(&self.lsn.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_header_default() {
        assert_eq!(PageHeader::default().lsn, Lsn(0));
    }

    #[test]
    fn test_page_header_byte_layout() {
        let header = PageHeader::new(Lsn(0x04030201));

        let mut buffer = [0xEEu8; PageHeader::SIZE];
        header.write_to(&mut buffer);

        // Reserved bytes untouched
        assert_eq!(&buffer[0..4], &[0xEE; 4]);
        // LSN little-endian at offset 4
        assert_eq!(&buffer[4..8], &[0x01, 0x02, 0x03, 0x04]);

        assert_eq!(PageHeader::from_bytes(&buffer), header);
    }

    #[test]
    #[should_panic(expected = "buffer too small")]
    fn test_page_header_short_buffer() {
        PageHeader::from_bytes(&[0u8; 4]);
    }
}
