//! Slotted record layout for heap data pages.
//!
//! # Layout
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       2     slot_cnt   (slot directory entries, live or empty)
//! 2       2     free_ptr   (lowest byte used by record data)
//! 4       4     reserved
//! 8       4     next_page  (i32, -1 = end of chain)
//! 12      4     cur_page   (i32, this page's own number)
//! 16      4×n   slot directory: offset u16, length u16
//! ...           free space
//! free_ptr..    record data, growing down from the end of the page
//! ```
//!
//! An empty slot has offset `0xFFFF`. Empty slots are reused before the
//! directory grows. Deleting a record compacts the data area and trims
//! trailing empty slots, so a live record's slot number never changes.

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result, Rid};

use super::Page;

const OFFSET_SLOT_CNT: usize = 0;
const OFFSET_FREE_PTR: usize = 2;
const OFFSET_NEXT_PAGE: usize = 8;
const OFFSET_CUR_PAGE: usize = 12;
const SLOT_DIR: usize = 16;
const SLOT_SIZE: usize = 4;
const EMPTY_SLOT: u16 = u16::MAX;

/// Fixed per-page overhead: the page header plus one slot entry.
pub const DPFIXED: usize = SLOT_DIR + SLOT_SIZE;

/// Largest record that fits on an empty data page.
pub const MAX_RECORD_SIZE: usize = PAGE_SIZE - DPFIXED;

impl Page {
    /// Format this page as an empty data page numbered `page_id`.
    pub fn init(&mut self, page_id: PageId) {
        self.reset();
        self.write_u16(OFFSET_SLOT_CNT, 0);
        self.write_u16(OFFSET_FREE_PTR, PAGE_SIZE as u16);
        self.write_i32(OFFSET_NEXT_PAGE, PageId::INVALID.to_raw());
        self.write_i32(OFFSET_CUR_PAGE, page_id.to_raw());
    }

    /// The page number recorded by [`Page::init`].
    pub fn page_no(&self) -> PageId {
        PageId::from_raw(self.read_i32(OFFSET_CUR_PAGE))
    }

    pub fn next_page(&self) -> PageId {
        PageId::from_raw(self.read_i32(OFFSET_NEXT_PAGE))
    }

    pub fn set_next_page(&mut self, next: PageId) {
        self.write_i32(OFFSET_NEXT_PAGE, next.to_raw());
    }

    /// Bytes available for record data and new slot entries.
    pub fn free_space(&self) -> usize {
        self.free_ptr() - (SLOT_DIR + self.slot_cnt() * SLOT_SIZE)
    }

    /// Number of live records on the page.
    pub fn record_count(&self) -> usize {
        (0..self.slot_cnt())
            .filter(|&slot| self.slot(slot).0 != EMPTY_SLOT)
            .count()
    }

    /// Store `record` on this page.
    ///
    /// # Errors
    /// `Error::NoSpace` if the record (plus a new slot entry, when no empty
    /// slot can be reused) does not fit.
    pub fn insert_record(&mut self, record: &[u8]) -> Result<Rid> {
        let slot_cnt = self.slot_cnt();
        let reuse = (0..slot_cnt).find(|&slot| self.slot(slot).0 == EMPTY_SLOT);
        let needed = record.len() + if reuse.is_some() { 0 } else { SLOT_SIZE };
        if needed > self.free_space() {
            return Err(Error::NoSpace);
        }

        let offset = self.free_ptr() - record.len();
        self.as_mut_slice()[offset..offset + record.len()].copy_from_slice(record);
        self.write_u16(OFFSET_FREE_PTR, offset as u16);

        let slot = match reuse {
            Some(slot) => slot,
            None => {
                self.write_u16(OFFSET_SLOT_CNT, (slot_cnt + 1) as u16);
                slot_cnt
            }
        };
        self.set_slot(slot, offset as u16, record.len() as u16);

        Ok(Rid::new(self.page_no(), slot as u16))
    }

    /// Remove the record at `rid`, compacting the data area.
    pub fn delete_record(&mut self, rid: Rid) -> Result<()> {
        let (offset, len) = self.locate(rid)?;
        let free_ptr = self.free_ptr();

        self.as_mut_slice()
            .copy_within(free_ptr..offset, free_ptr + len);
        for slot in 0..self.slot_cnt() {
            let (slot_offset, slot_len) = self.slot(slot);
            if slot != rid.slot as usize
                && slot_offset != EMPTY_SLOT
                && (slot_offset as usize) <= offset
            {
                self.set_slot(slot, slot_offset + len as u16, slot_len);
            }
        }
        self.write_u16(OFFSET_FREE_PTR, (free_ptr + len) as u16);
        self.set_slot(rid.slot as usize, EMPTY_SLOT, 0);

        let mut slot_cnt = self.slot_cnt();
        while slot_cnt > 0 && self.slot(slot_cnt - 1).0 == EMPTY_SLOT {
            slot_cnt -= 1;
        }
        self.write_u16(OFFSET_SLOT_CNT, slot_cnt as u16);

        Ok(())
    }

    /// Borrow the bytes of the record at `rid`.
    pub fn get_record(&self, rid: Rid) -> Result<&[u8]> {
        let (offset, len) = self.locate(rid)?;
        Ok(&self.as_slice()[offset..offset + len])
    }

    /// RID of the first live record, or `None` if the page holds none.
    pub fn first_record(&self) -> Option<Rid> {
        self.live_slot_from(0)
    }

    /// RID of the live record following `rid`, or `None` at end of page.
    pub fn next_record(&self, rid: Rid) -> Option<Rid> {
        self.live_slot_from(rid.slot as usize + 1)
    }

    fn live_slot_from(&self, start: usize) -> Option<Rid> {
        (start..self.slot_cnt())
            .find(|&slot| self.slot(slot).0 != EMPTY_SLOT)
            .map(|slot| Rid::new(self.page_no(), slot as u16))
    }

    fn locate(&self, rid: Rid) -> Result<(usize, usize)> {
        let slot = rid.slot as usize;
        if rid.page_id != self.page_no() || slot >= self.slot_cnt() {
            return Err(Error::InvalidSlot(rid));
        }
        let (offset, len) = self.slot(slot);
        if offset == EMPTY_SLOT {
            return Err(Error::InvalidSlot(rid));
        }
        Ok((offset as usize, len as usize))
    }

    fn slot_cnt(&self) -> usize {
        self.read_u16(OFFSET_SLOT_CNT) as usize
    }

    fn free_ptr(&self) -> usize {
        self.read_u16(OFFSET_FREE_PTR) as usize
    }

    fn slot(&self, slot: usize) -> (u16, u16) {
        let at = SLOT_DIR + slot * SLOT_SIZE;
        (self.read_u16(at), self.read_u16(at + 2))
    }

    fn set_slot(&mut self, slot: usize, offset: u16, len: u16) {
        let at = SLOT_DIR + slot * SLOT_SIZE;
        self.write_u16(at, offset);
        self.write_u16(at + 2, len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_page(no: u32) -> Page {
        let mut page = Page::new();
        page.init(PageId::new(no));
        page
    }

    #[test]
    fn test_init() {
        let page = data_page(7);
        assert_eq!(page.page_no(), PageId::new(7));
        assert_eq!(page.next_page(), PageId::INVALID);
        assert_eq!(page.first_record(), None);
        assert_eq!(page.free_space(), PAGE_SIZE - SLOT_DIR);
    }

    #[test]
    fn test_insert_and_get() {
        let mut page = data_page(3);
        let a = page.insert_record(b"alpha").unwrap();
        let b = page.insert_record(b"bravo!").unwrap();

        assert_eq!(a, Rid::new(PageId::new(3), 0));
        assert_eq!(b, Rid::new(PageId::new(3), 1));
        assert_eq!(page.get_record(a).unwrap(), b"alpha");
        assert_eq!(page.get_record(b).unwrap(), b"bravo!");
        assert_eq!(page.record_count(), 2);
    }

    #[test]
    fn test_iteration_in_slot_order() {
        let mut page = data_page(1);
        let rids: Vec<Rid> = (0u8..5).map(|i| page.insert_record(&[i; 8]).unwrap()).collect();

        let mut seen = vec![];
        let mut cursor = page.first_record();
        while let Some(rid) = cursor {
            seen.push(rid);
            cursor = page.next_record(rid);
        }
        assert_eq!(seen, rids);
    }

    #[test]
    fn test_delete_keeps_other_rids_stable() {
        let mut page = data_page(1);
        let a = page.insert_record(b"aaaa").unwrap();
        let b = page.insert_record(b"bbbbbbbb").unwrap();
        let c = page.insert_record(b"cc").unwrap();

        page.delete_record(b).unwrap();

        assert_eq!(page.get_record(a).unwrap(), b"aaaa");
        assert_eq!(page.get_record(c).unwrap(), b"cc");
        assert!(matches!(page.get_record(b), Err(Error::InvalidSlot(_))));
        assert_eq!(page.next_record(a), Some(c));
        assert_eq!(page.record_count(), 2);
    }

    #[test]
    fn test_delete_reclaims_space_and_reuses_slot() {
        let mut page = data_page(1);
        let before = page.free_space();
        let a = page.insert_record(&[1u8; 100]).unwrap();
        let b = page.insert_record(&[2u8; 100]).unwrap();

        page.delete_record(a).unwrap();
        assert_eq!(page.free_space(), before - 200 - 2 * SLOT_SIZE + 100);

        let c = page.insert_record(&[3u8; 50]).unwrap();
        assert_eq!(c.slot, a.slot);
        assert_eq!(page.get_record(b).unwrap(), &[2u8; 100][..]);
        assert_eq!(page.get_record(c).unwrap(), &[3u8; 50][..]);
    }

    #[test]
    fn test_trailing_empty_slots_are_trimmed() {
        let mut page = data_page(1);
        let before = page.free_space();
        let a = page.insert_record(b"x").unwrap();
        let b = page.insert_record(b"y").unwrap();

        page.delete_record(b).unwrap();
        page.delete_record(a).unwrap();

        assert_eq!(page.free_space(), before);
        assert_eq!(page.first_record(), None);
    }

    #[test]
    fn test_double_delete_fails() {
        let mut page = data_page(1);
        let a = page.insert_record(b"x").unwrap();
        page.insert_record(b"y").unwrap();
        page.delete_record(a).unwrap();
        assert!(matches!(page.delete_record(a), Err(Error::InvalidSlot(_))));
    }

    #[test]
    fn test_rid_from_other_page_rejected() {
        let mut page = data_page(1);
        page.insert_record(b"x").unwrap();
        let foreign = Rid::new(PageId::new(2), 0);
        assert!(matches!(page.get_record(foreign), Err(Error::InvalidSlot(_))));
    }

    #[test]
    fn test_max_record_fits_exactly_once() {
        let mut page = data_page(1);
        page.insert_record(&vec![9u8; MAX_RECORD_SIZE]).unwrap();
        assert_eq!(page.free_space(), 0);
        assert!(matches!(page.insert_record(b""), Err(Error::NoSpace)));
    }

    #[test]
    fn test_no_space() {
        let mut page = data_page(1);
        let mut inserted = 0;
        while page.insert_record(&[0xAB; 200]).is_ok() {
            inserted += 1;
        }
        assert_eq!(inserted, (PAGE_SIZE - SLOT_DIR) / (200 + SLOT_SIZE));
        assert!(matches!(page.insert_record(&[0xAB; 200]), Err(Error::NoSpace)));
    }

    #[test]
    fn test_next_link() {
        let mut page = data_page(1);
        page.set_next_page(PageId::new(9));
        assert_eq!(page.next_page(), PageId::new(9));
    }
}
