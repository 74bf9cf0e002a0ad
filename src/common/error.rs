//! Error types for minirel.

use thiserror::Error;

use super::{FileId, PageId, Rid};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All recoverable errors in minirel.
///
/// Index-consistency violations inside the buffer pool are not listed here:
/// they are bugs and abort with a panic instead of producing a status a
/// caller could ignore.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Page number is outside the allocated range of the file.
    #[error("{page} does not exist in file {file}")]
    PageNotFound { file: String, page: PageId },

    /// A file's metadata page failed its magic or checksum test.
    #[error("file {0} is corrupt or not a paged file")]
    CorruptFile(String),

    /// Every frame is pinned; nothing can be evicted.
    #[error("buffer pool exhausted: all frames are pinned")]
    BufferExceeded,

    /// Unpin of a page whose pin count is already zero.
    #[error("{page} of {file} is not pinned")]
    PageNotPinned { file: FileId, page: PageId },

    /// Flush of a file that still has pinned pages.
    #[error("{page} of {file} is still pinned")]
    PagePinned { file: FileId, page: PageId },

    /// Write-back of a dirty page whose file is no longer open.
    #[error("{page} of {file} is dirty but its file is closed")]
    FileClosed { file: FileId, page: PageId },

    /// Unpin of a page that is not in the buffer pool.
    #[error("{page} of {file} is not in the buffer pool")]
    PageNotResident { file: FileId, page: PageId },

    /// Record does not fit in the free space of a page.
    #[error("not enough space on page")]
    NoSpace,

    /// Slot is out of range or empty.
    #[error("invalid record id {0}")]
    InvalidSlot(Rid),

    /// Record is larger than any page can hold.
    #[error("record length {len} exceeds maximum of {max}")]
    InvalidRecordLength { len: usize, max: usize },

    /// Scan predicate parameters are inconsistent.
    #[error("bad scan parameter: {0}")]
    BadScanParam(&'static str),

    /// Cursor operation with no record under the cursor.
    #[error("scan has no current record")]
    NoCurrentRecord,

    #[error("invalid file name {0:?}")]
    BadFileName(String),

    #[error("file {0} already exists")]
    FileExists(String),

    #[error("file {0} does not exist")]
    FileNotFound(String),

    /// Destroy of a file that still has open handles.
    #[error("file {0} is open")]
    FileOpen(String),

    #[error("attribute {0} not found")]
    AttrNotFound(String),

    #[error("attribute {0} supplied with the wrong type")]
    AttrTypeMismatch(String),

    #[error("cannot parse {value:?} for attribute {attr}")]
    BadAttrValue { attr: String, value: String },
}
