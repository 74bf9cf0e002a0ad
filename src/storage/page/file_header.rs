//! Heap file header page.
//!
//! The first page of every heap file holds a [`FileHeader`]: the file's
//! name and the bounds and counts of its data page chain.

use crate::common::config::MAX_NAME_SIZE;
use crate::common::PageId;

use super::Page;

/// Metadata stored on a heap file's header page.
///
/// # Layout (68 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       50    file_name (NUL padded, not necessarily NUL terminated)
/// 50      2     padding
/// 52      4     first_page (i32, -1 = none)
/// 56      4     last_page  (i32, -1 = none)
/// 60      4     page_cnt   (i32)
/// 64      4     rec_cnt    (i32)
/// ```
///
/// The layout matches existing heap files byte for byte, so it must not be
/// reordered or widened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub file_name: String,
    pub first_page: PageId,
    pub last_page: PageId,
    pub page_cnt: u32,
    pub rec_cnt: u32,
}

impl FileHeader {
    pub const SIZE: usize = 68;

    pub const OFFSET_FILE_NAME: usize = 0;
    pub const OFFSET_FIRST_PAGE: usize = 52;
    pub const OFFSET_LAST_PAGE: usize = 56;
    pub const OFFSET_PAGE_CNT: usize = 60;
    pub const OFFSET_REC_CNT: usize = 64;

    /// Header of a file with no data pages yet.
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            first_page: PageId::INVALID,
            last_page: PageId::INVALID,
            page_cnt: 0,
            rec_cnt: 0,
        }
    }

    pub fn read_from(page: &Page) -> Self {
        let raw_name = &page.as_slice()[Self::OFFSET_FILE_NAME..Self::OFFSET_FILE_NAME + MAX_NAME_SIZE];
        let end = raw_name.iter().position(|&b| b == 0).unwrap_or(MAX_NAME_SIZE);
        let file_name = String::from_utf8_lossy(&raw_name[..end]).into_owned();

        Self {
            file_name,
            first_page: PageId::from_raw(page.read_i32(Self::OFFSET_FIRST_PAGE)),
            last_page: PageId::from_raw(page.read_i32(Self::OFFSET_LAST_PAGE)),
            page_cnt: page.read_i32(Self::OFFSET_PAGE_CNT) as u32,
            rec_cnt: page.read_i32(Self::OFFSET_REC_CNT) as u32,
        }
    }

    /// Write this header to the start of `page`.
    ///
    /// The name is truncated to `MAX_NAME_SIZE` bytes.
    pub fn write_to(&self, page: &mut Page) {
        let name = self.file_name.as_bytes();
        let len = name.len().min(MAX_NAME_SIZE);
        let field = &mut page.as_mut_slice()[Self::OFFSET_FILE_NAME..Self::OFFSET_FIRST_PAGE];
        field.fill(0);
        field[..len].copy_from_slice(&name[..len]);

        page.write_i32(Self::OFFSET_FIRST_PAGE, self.first_page.to_raw());
        page.write_i32(Self::OFFSET_LAST_PAGE, self.last_page.to_raw());
        page.write_i32(Self::OFFSET_PAGE_CNT, self.page_cnt as i32);
        page.write_i32(Self::OFFSET_REC_CNT, self.rec_cnt as i32);
    }
}
