//! Disk Manager - low-level file I/O for one paged file.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Allocating and disposing pages (with an on-disk free list)
//! - Persisting the file's own metadata page

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

const MAGIC: &[u8; 4] = b"MRPF";
const OFFSET_PAGE_COUNT: usize = 4;
const OFFSET_FREE_HEAD: usize = 8;
const OFFSET_FIRST_PAGE: usize = 12;
const OFFSET_CHECKSUM: usize = 16;

/// Manages disk I/O for a single paged file.
///
/// # File Layout
/// ```text
/// ┌──────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0   │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ metadata │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └──────────┴─────────┴─────────┴─────────┴─────────┘
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`. Page 0 is private to
/// the disk manager and holds, little-endian:
///
/// ```text
/// Offset  Size  Field
/// 0       4     magic "MRPF"
/// 4       4     page_count (including page 0)
/// 8       4     free_head  (i32, -1 = empty free list)
/// 12      4     first_page (i32, first page ever handed out)
/// 16      4     CRC32 of bytes 0..16
/// ```
///
/// A disposed page stores the next free page number in its first 4 bytes.
///
/// # Durability
/// Writes go to the OS page cache; [`DiskManager::sync`] forces them to
/// disk and is called when the last handle on a file is closed.
pub struct DiskManager {
    file: File,
    name: String,
    page_count: u32,
    free_head: PageId,
    first_page: PageId,
}

impl DiskManager {
    /// Create a new paged file containing only its metadata page.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        let mut dm = Self {
            file,
            name: display_name(path.as_ref()),
            page_count: 1,
            free_head: PageId::INVALID,
            first_page: PageId::INVALID,
        };
        dm.write_meta()?;
        Ok(dm)
    }

    /// Open an existing paged file.
    ///
    /// # Errors
    /// Returns `Error::CorruptFile` if the metadata page is missing or fails
    /// its magic or checksum test.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let name = display_name(path.as_ref());

        if file.metadata()?.len() < PAGE_SIZE as u64 {
            return Err(Error::CorruptFile(name));
        }
        let mut meta = Page::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(meta.as_mut_slice())?;

        let bytes = meta.as_slice();
        let stored = u32::from_le_bytes([
            bytes[OFFSET_CHECKSUM],
            bytes[OFFSET_CHECKSUM + 1],
            bytes[OFFSET_CHECKSUM + 2],
            bytes[OFFSET_CHECKSUM + 3],
        ]);
        if &bytes[..4] != MAGIC || stored != crc32fast::hash(&bytes[..OFFSET_CHECKSUM]) {
            return Err(Error::CorruptFile(name));
        }

        Ok(Self {
            file,
            name,
            page_count: meta.read_i32(OFFSET_PAGE_COUNT) as u32,
            free_head: PageId::from_raw(meta.read_i32(OFFSET_FREE_HEAD)),
            first_page: PageId::from_raw(meta.read_i32(OFFSET_FIRST_PAGE)),
        })
    }

    /// Read a page from disk into `page`.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page doesn't exist.
    pub fn read_page(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        self.check_page(page_id)?;
        self.file.seek(SeekFrom::Start(offset_of(page_id)))?;
        self.file.read_exact(page.as_mut_slice())?;
        Ok(())
    }

    /// Write a page to disk.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.check_page(page_id)?;
        self.file.seek(SeekFrom::Start(offset_of(page_id)))?;
        self.file.write_all(page.as_slice())?;
        Ok(())
    }

    /// Allocate a page, reusing a disposed one when possible.
    ///
    /// A page taken from the free list keeps its old bytes; callers
    /// initialize the content themselves.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = if self.free_head.is_valid() {
            let page_id = self.free_head;
            let mut page = Page::new();
            self.read_page(page_id, &mut page)?;
            self.free_head = PageId::from_raw(page.read_i32(0));
            page_id
        } else {
            let page_id = PageId::new(self.page_count);
            self.file.seek(SeekFrom::Start(offset_of(page_id)))?;
            self.file.write_all(&[0u8; PAGE_SIZE])?;
            self.page_count += 1;
            page_id
        };

        if !self.first_page.is_valid() {
            self.first_page = page_id;
        }
        self.write_meta()?;

        debug!("{}: allocated {}", self.name, page_id);
        Ok(page_id)
    }

    /// Return a page to the free list.
    pub fn dispose_page(&mut self, page_id: PageId) -> Result<()> {
        self.check_page(page_id)?;

        let mut page = Page::new();
        page.write_i32(0, self.free_head.to_raw());
        self.write_page(page_id, &page)?;
        self.free_head = page_id;
        if self.first_page == page_id {
            self.first_page = PageId::INVALID;
        }
        self.write_meta()?;

        debug!("{}: disposed {}", self.name, page_id);
        Ok(())
    }

    /// The first page ever allocated in this file.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if no page has been allocated.
    pub fn first_page(&self) -> Result<PageId> {
        if self.first_page.is_valid() {
            Ok(self.first_page)
        } else {
            Err(Error::PageNotFound {
                file: self.name.clone(),
                page: PageId::INVALID,
            })
        }
    }

    /// Number of pages in the file, including the metadata page.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Force all written pages to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn check_page(&self, page_id: PageId) -> Result<()> {
        if page_id.0 == 0 || page_id.0 >= self.page_count {
            return Err(Error::PageNotFound {
                file: self.name.clone(),
                page: page_id,
            });
        }
        Ok(())
    }

    fn write_meta(&mut self) -> Result<()> {
        let mut meta = Page::new();
        meta.as_mut_slice()[..4].copy_from_slice(MAGIC);
        meta.write_i32(OFFSET_PAGE_COUNT, self.page_count as i32);
        meta.write_i32(OFFSET_FREE_HEAD, self.free_head.to_raw());
        meta.write_i32(OFFSET_FIRST_PAGE, self.first_page.to_raw());
        let checksum = crc32fast::hash(&meta.as_slice()[..OFFSET_CHECKSUM]);
        meta.as_mut_slice()[OFFSET_CHECKSUM..OFFSET_CHECKSUM + 4]
            .copy_from_slice(&checksum.to_le_bytes());

        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(meta.as_slice())?;
        Ok(())
    }
}

fn offset_of(page_id: PageId) -> u64 {
    (page_id.0 as u64) * (PAGE_SIZE as u64)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
