//! Error types for the storage core.

use thiserror::Error as ThisError;

use super::PageId;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors surfaced by the buffer pool and the indexes.
///
/// Lookups and deletes that find nothing are not errors: they return an
/// empty result (`None`, an empty `Vec`, or `false`).
#[derive(Debug, ThisError)]
pub enum Error {
    /// I/O error from the disk manager.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist in backing storage.
    #[error("{0} not found")]
    PageNotFound(PageId),

    /// Every frame is pinned, so no victim can be chosen.
    ///
    /// Recoverable: the caller can release pins and retry.
    #[error("No free frames available in buffer pool")]
    PoolExhausted,

    /// Attempted to delete a page that is still pinned.
    #[error("{0} is still pinned")]
    PagePinned(PageId),

    /// The identical key and value are already present in the index.
    #[error("Duplicate entry: key and value already present")]
    DuplicateEntry,

    /// Bucket probing wrapped around the whole directory without a free slot.
    #[error("Index directory exhausted: no free slot in any bucket")]
    DirectoryExhausted,

    /// The header page cannot address any more block pages.
    #[error("Header page is full ({0} block pages)")]
    DirectoryFull(usize),

    /// The page does not hold a usable index header.
    #[error("{0} is not a valid index header page")]
    InvalidHeader(PageId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(PageId::new(42));
        assert_eq!(format!("{}", err), "Page(42) not found");

        let err = Error::PoolExhausted;
        assert_eq!(format!("{}", err), "No free frames available in buffer pool");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_result_type_alias() {
        fn might_fail(fail: bool) -> Result<u32> {
            if fail {
                Err(Error::DuplicateEntry)
            } else {
                Ok(42)
            }
        }

        assert_eq!(might_fail(false).unwrap(), 42);
        assert!(matches!(might_fail(true), Err(Error::DuplicateEntry)));
    }
}
