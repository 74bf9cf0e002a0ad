//! Append-only cursor over a heap file.

use log::debug;

use crate::common::{Error, Result, Rid};
use crate::database::Database;
use crate::storage::page::MAX_RECORD_SIZE;

use super::HeapFile;

/// Appends records at the end of a heap file's page chain.
///
/// The cursor always sits on the last data page. When that page is full a
/// new page is linked in after it and becomes the cursor page. The final
/// cursor page is unpinned dirty when the scan is dropped.
#[derive(Debug)]
pub struct InsertFileScan<'a> {
    heap: HeapFile<'a>,
}

impl<'a> InsertFileScan<'a> {
    /// Open heap file `name` positioned on its last data page.
    pub fn open(db: &'a Database, name: &str) -> Result<Self> {
        let mut heap = HeapFile::open(db, name)?;

        let last = heap.header().last_page;
        if last.is_valid() && heap.current_page() != Some(last) {
            heap.pin_current(last)?;
        }
        Ok(Self { heap })
    }

    pub fn heap(&self) -> &HeapFile<'a> {
        &self.heap
    }

    pub fn record_count(&self) -> u32 {
        self.heap.record_count()
    }

    /// Append `record`, growing the page chain if the last page is full.
    ///
    /// # Errors
    /// `Error::InvalidRecordLength` if the record could not fit even on an
    /// empty page; the pool is not touched in that case.
    pub fn insert_record(&mut self, record: &[u8]) -> Result<Rid> {
        if record.len() > MAX_RECORD_SIZE {
            return Err(Error::InvalidRecordLength {
                len: record.len(),
                max: MAX_RECORD_SIZE,
            });
        }

        if self.heap.current.is_none() {
            let last = self.heap.header().last_page;
            if last.is_valid() {
                self.heap.pin_current(last)?;
            } else {
                self.append_page()?;
            }
        }

        let rid = match self.try_insert(record) {
            Err(Error::NoSpace) => {
                self.append_page()?;
                self.try_insert(record)?
            }
            result => result?,
        };

        self.heap.update_header(|header| header.rec_cnt += 1);
        Ok(rid)
    }

    fn try_insert(&mut self, record: &[u8]) -> Result<Rid> {
        let page = self.heap.current.as_mut().ok_or(Error::NoCurrentRecord)?;
        let rid = page.write().insert_record(record)?;
        Ok(rid)
    }

    /// Link a fresh data page after the cursor page and move onto it.
    fn append_page(&mut self) -> Result<()> {
        let db = self.heap.db;
        let mut new_page = db.pool().new_page(&self.heap.file)?;
        let new_id = new_page.page_id();
        new_page.write().init(new_id);

        match self.heap.current.as_mut() {
            Some(current) => {
                let old_next = {
                    let mut page = current.write();
                    let old_next = page.next_page();
                    page.set_next_page(new_id);
                    old_next
                };
                new_page.write().set_next_page(old_next);
                self.heap.update_header(|header| {
                    if !old_next.is_valid() {
                        header.last_page = new_id;
                    }
                    header.page_cnt += 1;
                });
            }
            None => self.heap.update_header(|header| {
                header.first_page = new_id;
                header.last_page = new_id;
                header.page_cnt += 1;
            }),
        }
        debug!("{}: appended data {}", self.heap.name(), new_id);

        self.heap.release_current()?;
        self.heap.current = Some(new_page);
        Ok(())
    }
}

impl Drop for InsertFileScan<'_> {
    fn drop(&mut self) {
        if let Some(page) = self.heap.current.as_mut() {
            page.mark_dirty();
        }
    }
}
