//! RAII guard for a pinned page.
//!
//! A [`PinnedPage`] owns exactly one pin on one page. Page content is
//! borrowed through [`PinnedPage::read`] / [`PinnedPage::write`]; the pin is
//! released by [`PinnedPage::unpin`] or, failing that, when the guard drops.

use log::warn;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::FileHandle;

use super::buffer_pool_manager::BufferPoolManager;

/// One pin on a page of the buffer pool.
///
/// The guard remembers whether the page was modified through it and
/// reports that on unpin, so a page changed through a guard is always
/// written back before its frame is reused.
///
/// # Example
/// ```ignore
/// let mut page = bpm.fetch_page(&file, page_id)?;
/// page.write().set_next_page(next);   // marks the guard dirty
/// page.unpin()?;                      // or just drop it
/// ```
pub struct PinnedPage<'a> {
    bpm: &'a BufferPoolManager,
    file: FileHandle,
    page_id: PageId,
    frame_id: FrameId,
    dirty: bool,
    pinned: bool,
}

impl<'a> PinnedPage<'a> {
    /// Wrap a pin already taken on `frame_id`.
    ///
    /// Called by `BufferPoolManager::fetch_page()` and `new_page()`.
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        file: FileHandle,
        page_id: PageId,
        frame_id: FrameId,
    ) -> Self {
        Self {
            bpm,
            file,
            page_id,
            frame_id,
            dirty: false,
            pinned: true,
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    #[inline]
    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    /// Whether the page will be reported modified on unpin.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Shared access to the page.
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        debug_assert!(self.pinned, "read of {} after unpin", self.page_id);
        self.bpm.page(self.frame_id)
    }

    /// Exclusive access to the page. Marks the guard dirty.
    pub fn write(&mut self) -> RwLockWriteGuard<'_, Page> {
        debug_assert!(self.pinned, "write of {} after unpin", self.page_id);
        self.dirty = true;
        self.bpm.page_mut(self.frame_id)
    }

    /// Report the page modified without touching it.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Release the pin now. Further calls do nothing.
    ///
    /// # Errors
    /// Whatever `BufferPoolManager::unpin_page` reports; the guard counts as
    /// released either way.
    pub fn unpin(&mut self) -> Result<()> {
        if !self.pinned {
            return Ok(());
        }
        self.pinned = false;
        self.bpm.unpin_page(&self.file, self.page_id, self.dirty)
    }
}

impl Drop for PinnedPage<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.unpin() {
            warn!(
                "failed to unpin {} of {}: {}",
                self.page_id,
                self.file.name(),
                e
            );
        }
    }
}

impl std::fmt::Debug for PinnedPage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinnedPage")
            .field("file", &self.file.id())
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame_id)
            .field("dirty", &self.dirty)
            .field("pinned", &self.pinned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::storage::FileManager;
    use tempfile::tempdir;

    #[test]
    fn test_drop_unpins() {
        let dir = tempdir().unwrap();
        let fm = FileManager::new(dir.path());
        fm.create_file("rel").unwrap();
        let file = fm.open_file("rel").unwrap();
        let bpm = BufferPoolManager::new(4);

        let page_id = {
            let page = bpm.new_page(&file).unwrap();
            assert_eq!(bpm.pin_count(&file, page.page_id()), Some(1));
            page.page_id()
        };
        assert_eq!(bpm.pin_count(&file, page_id), Some(0));
        assert!(!bpm.descriptor(bpm.frame_of(&file, page_id).unwrap()).dirty);
    }

    #[test]
    fn test_write_marks_dirty() {
        let dir = tempdir().unwrap();
        let fm = FileManager::new(dir.path());
        fm.create_file("rel").unwrap();
        let file = fm.open_file("rel").unwrap();
        let bpm = BufferPoolManager::new(4);

        let mut page = bpm.new_page(&file).unwrap();
        assert!(!page.is_dirty());
        page.write().as_mut_slice()[0] = 1;
        assert!(page.is_dirty());

        let frame_id = page.frame_id();
        page.unpin().unwrap();
        assert!(bpm.descriptor(frame_id).dirty);
    }

    #[test]
    fn test_unpin_is_idempotent() {
        let dir = tempdir().unwrap();
        let fm = FileManager::new(dir.path());
        fm.create_file("rel").unwrap();
        let file = fm.open_file("rel").unwrap();
        let bpm = BufferPoolManager::new(4);

        let mut page = bpm.new_page(&file).unwrap();
        // A second pin on the same page, held directly.
        bpm.read_page(&file, page.page_id()).unwrap();

        page.unpin().unwrap();
        page.unpin().unwrap();
        assert!(!page.is_pinned());
        assert_eq!(bpm.pin_count(&file, page.page_id()), Some(1));

        bpm.unpin_page(&file, page.page_id(), false).unwrap();
        let err = bpm.unpin_page(&file, page.page_id(), false).unwrap_err();
        assert!(matches!(err, Error::PageNotPinned { .. }));
    }
}
