//! Page and file identifier types.

use std::fmt;

/// Identifies a page within one file.
///
/// On disk page numbers are stored as little-endian `i32` with `-1`
/// meaning "no page". `PageId::INVALID` is `u32::MAX`, whose bit pattern
/// is exactly `-1i32`, so the conversion is a plain reinterpretation.
///
/// # Example
/// ```
/// use minirel::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(PageId::from_raw(-1), PageId::INVALID);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Sentinel for "no page" (the `-1` of the on-disk format).
    pub const INVALID: PageId = PageId(u32::MAX);

    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Decode the on-disk representation.
    #[inline]
    pub fn from_raw(raw: i32) -> Self {
        PageId(raw as u32)
    }

    /// Encode to the on-disk representation.
    #[inline]
    pub fn to_raw(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}

/// Identity of an open file.
///
/// Assigned by the file manager when a file is opened and never reused
/// while the process runs, so a stale identity can never alias a newer
/// file in the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    #[inline]
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}
