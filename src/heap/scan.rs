//! Filtered sequential scan over a heap file.

use crate::buffer::PinnedPage;
use crate::common::{Error, PageId, Result, Rid};
use crate::database::Database;

use super::{Datatype, HeapFile, Operator, ScanFilter};

/// Saved scan position for [`HeapFileScan::reset_scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mark {
    page: Option<PageId>,
    rec: Option<Rid>,
    at_eof: bool,
}

/// Cursor over the records of a heap file, in page chain order.
///
/// After [`scan_next`](Self::scan_next) returns a record, the page holding
/// it stays pinned until the scan moves past it, ends, or is dropped.
///
/// # Example
/// ```no_run
/// # use minirel::database::Database;
/// use minirel::heap::{Datatype, HeapFileScan, Operator};
///
/// # let db = Database::open("data", 100).unwrap();
/// let mut scan = HeapFileScan::open(&db, "emp").unwrap();
/// scan.start_scan(0, 4, Datatype::Integer, Some(&42i32.to_le_bytes()), Operator::Gt)
///     .unwrap();
/// while let Some(rid) = scan.scan_next().unwrap() {
///     let record = scan.get_record().unwrap();
///     println!("{} -> {} bytes", rid, record.len());
/// }
/// scan.end_scan().unwrap();
/// ```
#[derive(Debug)]
pub struct HeapFileScan<'a> {
    heap: HeapFile<'a>,
    filter: Option<ScanFilter>,
    mark: Option<Mark>,
    /// Set once a scan from the start found the file empty.
    at_eof: bool,
}

impl<'a> HeapFileScan<'a> {
    pub fn open(db: &'a Database, name: &str) -> Result<Self> {
        Ok(Self {
            heap: HeapFile::open(db, name)?,
            filter: None,
            mark: None,
            at_eof: false,
        })
    }

    pub fn heap(&self) -> &HeapFile<'a> {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut HeapFile<'a> {
        &mut self.heap
    }

    pub fn record_count(&self) -> u32 {
        self.heap.record_count()
    }

    /// Set the predicate for the following `scan_next` calls.
    ///
    /// `filter == None` makes the scan unconditional; the other arguments
    /// are then ignored.
    ///
    /// # Errors
    /// `Error::BadScanParam` as for [`ScanFilter::new`]; the current
    /// predicate is kept in that case.
    pub fn start_scan(
        &mut self,
        offset: usize,
        length: usize,
        datatype: Datatype,
        filter: Option<&[u8]>,
        op: Operator,
    ) -> Result<()> {
        self.filter = match filter {
            None => None,
            Some(value) => Some(ScanFilter::new(offset, length, datatype, value, op)?),
        };
        Ok(())
    }

    /// Advance to the next matching record.
    ///
    /// Returns `Ok(None)` at end of file. Pages without records are skipped,
    /// including an empty first page: the scan follows the chain and only
    /// reports end of file once no later page holds a record. If the whole
    /// chain is empty the page is released and the scan stays at end of
    /// file until [`end_scan`](Self::end_scan) or a reset.
    pub fn scan_next(&mut self) -> Result<Option<Rid>> {
        if self.at_eof {
            return Ok(None);
        }

        let first = self.heap.header().first_page;
        if self.heap.current.is_none() {
            if !first.is_valid() {
                return Ok(None);
            }
            self.heap.pin_current(first)?;
        }
        // No record seen yet since the start of the chain.
        let mut from_start =
            self.heap.cur_rec.is_none() && self.heap.current_page() == Some(first);

        loop {
            let Some(page) = self.heap.current.as_ref() else {
                return Ok(None);
            };
            let candidate = {
                let data = page.read();
                match self.heap.cur_rec {
                    Some(rid) => data.next_record(rid),
                    None => data.first_record(),
                }
            };

            match candidate {
                Some(rid) => {
                    from_start = false;
                    self.heap.cur_rec = Some(rid);
                    if self.current_matches(rid)? {
                        return Ok(Some(rid));
                    }
                }
                None => {
                    let next = page.read().next_page();
                    if next.is_valid() {
                        self.heap.pin_current(next)?;
                    } else {
                        if from_start {
                            self.heap.release_current()?;
                            self.at_eof = true;
                        }
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn current_matches(&self, rid: Rid) -> Result<bool> {
        let Some(filter) = &self.filter else {
            return Ok(true);
        };
        let page = self.heap.current.as_ref().ok_or(Error::NoCurrentRecord)?;
        let data = page.read();
        Ok(filter.matches(data.get_record(rid)?))
    }

    /// RID under the cursor.
    pub fn current_rid(&self) -> Option<Rid> {
        self.heap.cur_rec
    }

    /// Copy out the record under the cursor.
    ///
    /// # Errors
    /// `Error::NoCurrentRecord` before the first `scan_next`.
    pub fn get_record(&self) -> Result<Vec<u8>> {
        let (page, rid) = self.cursor()?;
        let record = page.read().get_record(rid)?.to_vec();
        Ok(record)
    }

    /// Remove the record under the cursor.
    ///
    /// The cursor stays where it is; the next `scan_next` continues with the
    /// record after it.
    pub fn delete_record(&mut self) -> Result<()> {
        let rid = self.heap.cur_rec.ok_or(Error::NoCurrentRecord)?;
        let page = self.heap.current.as_mut().ok_or(Error::NoCurrentRecord)?;
        page.write().delete_record(rid)?;
        self.heap
            .update_header(|header| header.rec_cnt = header.rec_cnt.saturating_sub(1));
        Ok(())
    }

    /// Report the cursor page as modified, for in-place record updates.
    pub fn mark_dirty(&mut self) {
        if let Some(page) = self.heap.current.as_mut() {
            page.mark_dirty();
        }
    }

    /// Remember the current position.
    pub fn mark_scan(&mut self) {
        self.mark = Some(Mark {
            page: self.heap.current_page(),
            rec: self.heap.cur_rec,
            at_eof: self.at_eof,
        });
    }

    /// Return to the position saved by [`mark_scan`](Self::mark_scan), or
    /// to the start of the file if nothing was marked.
    ///
    /// Staying on the same page costs no pin traffic; otherwise the current
    /// page is unpinned and the marked one pinned clean.
    pub fn reset_scan(&mut self) -> Result<()> {
        let mark = self.mark.unwrap_or(Mark {
            page: None,
            rec: None,
            at_eof: false,
        });

        if mark.page != self.heap.current_page() {
            match mark.page {
                Some(page_id) => self.heap.pin_current(page_id)?,
                None => self.heap.release_current()?,
            }
        }
        self.heap.cur_rec = mark.rec;
        self.at_eof = mark.at_eof;
        Ok(())
    }

    /// Release the cursor page. The scan can be started again afterwards.
    pub fn end_scan(&mut self) -> Result<()> {
        self.at_eof = false;
        self.heap.release_current()
    }

    fn cursor(&self) -> Result<(&PinnedPage<'a>, Rid)> {
        match (self.heap.current.as_ref(), self.heap.cur_rec) {
            (Some(page), Some(rid)) => Ok((page, rid)),
            _ => Err(Error::NoCurrentRecord),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{create_heap_file, InsertFileScan};
    use tempfile::{tempdir, TempDir};

    fn setup(pool_size: usize) -> (Database, TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path(), pool_size).unwrap();
        create_heap_file(&db, "rel").unwrap();
        (db, dir)
    }

    fn insert_ints(db: &Database, values: impl IntoIterator<Item = i32>) -> Vec<Rid> {
        let mut inserter = InsertFileScan::open(db, "rel").unwrap();
        values
            .into_iter()
            .map(|v| inserter.insert_record(&v.to_le_bytes()).unwrap())
            .collect()
    }

    fn drain(scan: &mut HeapFileScan<'_>) -> Vec<Rid> {
        std::iter::from_fn(|| scan.scan_next().unwrap()).collect()
    }

    #[test]
    fn test_unconditional_scan_in_order() {
        let (db, _dir) = setup(8);
        let rids = insert_ints(&db, 0..10);

        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        scan.start_scan(0, 0, Datatype::String, None, Operator::Eq).unwrap();
        assert_eq!(drain(&mut scan), rids);
        assert_eq!(scan.scan_next().unwrap(), None);
        scan.end_scan().unwrap();
    }

    #[test]
    fn test_empty_file() {
        let (db, _dir) = setup(8);
        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        assert_eq!(scan.scan_next().unwrap(), None);
        // The empty page was given back.
        assert_eq!(scan.heap().current_page(), None);
        assert_eq!(db.pool().pinned_frame_count(), 1);
        assert_eq!(scan.scan_next().unwrap(), None);
    }

    #[test]
    fn test_filtered_scan() {
        let (db, _dir) = setup(8);
        let rids = insert_ints(&db, 0..20);

        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        scan.start_scan(0, 4, Datatype::Integer, Some(&15i32.to_le_bytes()), Operator::Gte)
            .unwrap();
        assert_eq!(drain(&mut scan), rids[15..].to_vec());
        assert_eq!(scan.get_record().unwrap(), 19i32.to_le_bytes());
    }

    #[test]
    fn test_bad_scan_param_keeps_filter() {
        let (db, _dir) = setup(8);
        insert_ints(&db, 0..4);

        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        scan.start_scan(0, 4, Datatype::Integer, Some(&2i32.to_le_bytes()), Operator::Eq)
            .unwrap();
        let err = scan
            .start_scan(0, 3, Datatype::Integer, Some(&[0, 0, 0]), Operator::Eq)
            .unwrap_err();
        assert!(matches!(err, Error::BadScanParam(_)));
        assert_eq!(drain(&mut scan).len(), 1);
    }

    #[test]
    fn test_scan_crosses_pages() {
        let (db, _dir) = setup(8);
        let big = vec![1u8; 2000];
        let rids: Vec<Rid> = {
            let mut inserter = InsertFileScan::open(&db, "rel").unwrap();
            (0..5).map(|_| inserter.insert_record(&big).unwrap()).collect()
        };

        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        assert_eq!(drain(&mut scan), rids);
        // Header plus the last page.
        assert_eq!(db.pool().pinned_frame_count(), 2);
        scan.end_scan().unwrap();
        assert_eq!(db.pool().pinned_frame_count(), 1);
    }

    #[test]
    fn test_get_record_before_scan_fails() {
        let (db, _dir) = setup(8);
        let scan = HeapFileScan::open(&db, "rel").unwrap();
        assert!(matches!(scan.get_record(), Err(Error::NoCurrentRecord)));
    }

    #[test]
    fn test_mark_and_reset_same_page() {
        let (db, _dir) = setup(8);
        let rids = insert_ints(&db, 1..=6);

        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        for _ in 0..3 {
            scan.scan_next().unwrap();
        }
        assert_eq!(scan.current_rid(), Some(rids[2]));
        scan.mark_scan();

        scan.scan_next().unwrap();
        scan.scan_next().unwrap();
        assert_eq!(scan.current_rid(), Some(rids[4]));

        let misses = db.pool().stats().snapshot().misses;
        scan.reset_scan().unwrap();
        assert_eq!(scan.scan_next().unwrap(), Some(rids[3]));
        assert_eq!(db.pool().stats().snapshot().misses, misses);
    }

    #[test]
    fn test_mark_and_reset_across_pages() {
        let (db, _dir) = setup(8);
        let big = vec![3u8; 1500];
        let rids: Vec<Rid> = {
            let mut inserter = InsertFileScan::open(&db, "rel").unwrap();
            (0..6).map(|_| inserter.insert_record(&big).unwrap()).collect()
        };

        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        scan.scan_next().unwrap();
        scan.mark_scan();
        drain(&mut scan);
        assert_ne!(scan.heap().current_page(), Some(rids[0].page_id));

        scan.reset_scan().unwrap();
        assert_eq!(scan.heap().current_page(), Some(rids[0].page_id));
        assert_eq!(drain(&mut scan), rids[1..].to_vec());
        assert_eq!(db.pool().pinned_frame_count(), 2);
    }

    #[test]
    fn test_reset_without_mark_restarts() {
        let (db, _dir) = setup(8);
        let rids = insert_ints(&db, 0..3);

        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        assert_eq!(drain(&mut scan), rids);
        scan.reset_scan().unwrap();
        assert_eq!(drain(&mut scan), rids);
    }

    #[test]
    fn test_delete_during_scan() {
        let (db, _dir) = setup(8);
        let rids = insert_ints(&db, 0..10);

        {
            let mut scan = HeapFileScan::open(&db, "rel").unwrap();
            scan.start_scan(0, 4, Datatype::Integer, Some(&5i32.to_le_bytes()), Operator::Lt)
                .unwrap();
            let mut deleted = 0;
            while scan.scan_next().unwrap().is_some() {
                scan.delete_record().unwrap();
                deleted += 1;
            }
            assert_eq!(deleted, 5);
            assert_eq!(scan.record_count(), 5);
        }

        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        assert_eq!(scan.record_count(), 5);
        let remaining = drain(&mut scan);
        assert_eq!(remaining, rids[5..].to_vec());
        for rid in &rids[..5] {
            assert!(!remaining.contains(rid));
        }
    }

    #[test]
    fn test_delete_without_cursor_fails() {
        let (db, _dir) = setup(8);
        insert_ints(&db, 0..1);
        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        assert!(matches!(scan.delete_record(), Err(Error::NoCurrentRecord)));
    }

    #[test]
    fn test_end_scan_is_idempotent() {
        let (db, _dir) = setup(8);
        let rids = insert_ints(&db, 0..2);

        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        scan.scan_next().unwrap();
        scan.end_scan().unwrap();
        scan.end_scan().unwrap();
        assert_eq!(db.pool().pinned_frame_count(), 1);

        // Starts over from the first page.
        assert_eq!(drain(&mut scan), rids);
    }

    #[test]
    fn test_skips_emptied_first_page() {
        let (db, _dir) = setup(8);
        let big = vec![9u8; 2000];
        let rids: Vec<Rid> = {
            let mut inserter = InsertFileScan::open(&db, "rel").unwrap();
            (0..4).map(|_| inserter.insert_record(&big).unwrap()).collect()
        };

        {
            let mut heap_scan = HeapFileScan::open(&db, "rel").unwrap();
            // Delete everything on the first page.
            while let Some(rid) = heap_scan.scan_next().unwrap() {
                if rid.page_id == rids[0].page_id {
                    heap_scan.delete_record().unwrap();
                }
            }
        }

        let mut scan = HeapFileScan::open(&db, "rel").unwrap();
        scan.end_scan().unwrap();
        assert_eq!(drain(&mut scan), rids[2..].to_vec());
    }
}
