//! Heap file - an unordered record file over a chain of data pages.
//!
//! The first page of the file is its header page ([`FileHeader`]). Data
//! pages form a singly linked list through their `next_page` field, from
//! `first_page` to `last_page`.

use log::{info, warn};

use crate::buffer::PinnedPage;
use crate::common::{Error, PageId, Result, Rid};
use crate::database::Database;
use crate::storage::page::FileHeader;
use crate::storage::FileHandle;

/// Create an empty heap file: a header page and one empty data page.
///
/// # Errors
/// `Error::FileExists` if a file named `name` already exists.
pub fn create_heap_file(db: &Database, name: &str) -> Result<()> {
    db.create_file(name)?;
    let file = db.open_file(name)?;

    let formatted = format_heap_file(db, &file, name);
    let closed = db.close_file(&file);
    formatted?;
    closed?;

    info!("created heap file {}", name);
    Ok(())
}

fn format_heap_file(db: &Database, file: &FileHandle, name: &str) -> Result<()> {
    let mut header_page = db.pool().new_page(file)?;
    let mut data_page = db.pool().new_page(file)?;
    let data_id = data_page.page_id();
    data_page.write().init(data_id);

    let mut header = FileHeader::new(name);
    header.first_page = data_id;
    header.last_page = data_id;
    header.page_cnt = 1;
    header.write_to(&mut header_page.write());

    data_page.unpin()?;
    header_page.unpin()
}

/// Delete a heap file from disk.
///
/// # Errors
/// `Error::FileOpen` while any heap file or scan has it open.
pub fn destroy_heap_file(db: &Database, name: &str) -> Result<()> {
    db.destroy_file(name)
}

/// An open heap file.
///
/// Holds a pin on the header page for its whole life and at most one pin
/// on a data page (the cursor page). Dropping it releases both pins and
/// closes the file.
pub struct HeapFile<'a> {
    pub(super) db: &'a Database,
    pub(super) file: FileHandle,
    pub(super) header: PinnedPage<'a>,
    /// Cursor page, if any.
    pub(super) current: Option<PinnedPage<'a>>,
    /// Cursor record, if any. Always on `current` when set.
    pub(super) cur_rec: Option<Rid>,
}

impl<'a> HeapFile<'a> {
    /// Open heap file `name`, pinning its header and first data page.
    ///
    /// On failure every pin taken so far is released and the file is
    /// closed again.
    pub fn open(db: &'a Database, name: &str) -> Result<Self> {
        let file = db.open_file(name)?;

        match Self::pin_initial(db, &file) {
            Ok((header, current)) => Ok(Self {
                db,
                file,
                header,
                current,
                cur_rec: None,
            }),
            Err(e) => {
                if let Err(close_err) = db.close_file(&file) {
                    warn!("failed to close {} after open error: {}", name, close_err);
                }
                Err(e)
            }
        }
    }

    fn pin_initial(
        db: &'a Database,
        file: &FileHandle,
    ) -> Result<(PinnedPage<'a>, Option<PinnedPage<'a>>)> {
        let header = db.pool().fetch_page(file, file.first_page()?)?;
        let first = FileHeader::read_from(&header.read()).first_page;
        let current = if first.is_valid() {
            Some(db.pool().fetch_page(file, first)?)
        } else {
            None
        };
        Ok((header, current))
    }

    /// Name of the underlying file.
    pub fn name(&self) -> &str {
        self.file.name()
    }

    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    /// Current content of the header page.
    pub fn header(&self) -> FileHeader {
        FileHeader::read_from(&self.header.read())
    }

    /// Number of records in the file.
    pub fn record_count(&self) -> u32 {
        self.header().rec_cnt
    }

    /// Page the cursor is on, if any.
    pub fn current_page(&self) -> Option<PageId> {
        self.current.as_ref().map(PinnedPage::page_id)
    }

    /// Copy out the record at `rid`, moving the cursor there.
    ///
    /// The cursor page is swapped for `rid`'s page if they differ, so at
    /// most one data page stays pinned.
    ///
    /// # Errors
    /// `Error::InvalidSlot` if no record lives at `rid`.
    pub fn get_record(&mut self, rid: Rid) -> Result<Vec<u8>> {
        if self.current_page() != Some(rid.page_id) {
            self.pin_current(rid.page_id)?;
        }
        let page = self.current.as_ref().ok_or(Error::NoCurrentRecord)?;
        let record = page.read().get_record(rid)?.to_vec();
        self.cur_rec = Some(rid);
        Ok(record)
    }

    /// Apply `update` to the header and mark the header page dirty.
    pub(super) fn update_header(&mut self, update: impl FnOnce(&mut FileHeader)) {
        let mut page = self.header.write();
        let mut header = FileHeader::read_from(&page);
        update(&mut header);
        header.write_to(&mut page);
    }

    /// Unpin the cursor page, if any, and clear the cursor.
    pub(super) fn release_current(&mut self) -> Result<()> {
        self.cur_rec = None;
        match self.current.take() {
            Some(mut page) => page.unpin(),
            None => Ok(()),
        }
    }

    /// Move the cursor onto `page_id` with no current record.
    pub(super) fn pin_current(&mut self, page_id: PageId) -> Result<()> {
        self.release_current()?;
        self.current = Some(self.db.pool().fetch_page(&self.file, page_id)?);
        Ok(())
    }
}

impl Drop for HeapFile<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release_current() {
            warn!("{}: failed to unpin data page: {}", self.name(), e);
        }
        if let Err(e) = self.header.unpin() {
            warn!("{}: failed to unpin header page: {}", self.name(), e);
        }
        if let Err(e) = self.db.close_file(&self.file) {
            warn!("{}: failed to close: {}", self.name(), e);
        }
    }
}

impl std::fmt::Debug for HeapFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapFile")
            .field("file", &self.file)
            .field("current", &self.current_page())
            .field("cur_rec", &self.cur_rec)
            .finish()
    }
}
