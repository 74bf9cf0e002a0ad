//! Page table - maps resident pages to the frames holding them.

use std::collections::HashMap;

use crate::common::config::page_table_capacity;
use crate::common::{FileId, FrameId, PageId};

/// Residency index keyed by `(file, page)`.
///
/// Every entry corresponds to exactly one valid frame. The pool panics on
/// any operation that would break that correspondence, since a stale entry
/// means two frames could end up caching the same page.
#[derive(Debug)]
pub struct PageTable {
    entries: HashMap<(FileId, PageId), FrameId>,
}

impl PageTable {
    /// Create a table sized for a pool of `pool_size` frames.
    pub fn new(pool_size: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(page_table_capacity(pool_size)),
        }
    }

    #[inline]
    pub fn lookup(&self, file: FileId, page: PageId) -> Option<FrameId> {
        self.entries.get(&(file, page)).copied()
    }

    /// # Panics
    /// Panics if the page already has an entry.
    pub fn insert(&mut self, file: FileId, page: PageId, frame_id: FrameId) {
        let prev = self.entries.insert((file, page), frame_id);
        assert!(
            prev.is_none(),
            "{} of {} already mapped to {}",
            page,
            file,
            prev.map_or(frame_id, |f| f)
        );
    }

    /// # Panics
    /// Panics if the page has no entry.
    pub fn remove(&mut self, file: FileId, page: PageId) -> FrameId {
        match self.entries.remove(&(file, page)) {
            Some(frame_id) => frame_id,
            None => panic!("{} of {} missing from page table", page, file),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
