//! Frame - a slot in the buffer pool.
//!
//! The pool keeps two parallel tables indexed by [`FrameId`]:
//! - [`Frame`] holds the cached [`Page`] bytes behind a lock
//! - [`FrameDescriptor`] holds the bookkeeping the clock sweep needs
//!
//! Descriptors are plain data. All mutation goes through the buffer pool
//! while it holds its state lock.

use std::sync::{Arc, Weak};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FileId, FrameId, PageId};
use crate::storage::page::Page;
use crate::storage::PagedFile;

/// Page storage for one frame.
pub struct Frame {
    page: RwLock<Page>,
}

impl Frame {
    /// Create a new empty frame.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
        }
    }

    /// Acquire read lock on the page.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire write lock on the page.
    #[inline]
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// Bookkeeping for one frame of the pool.
///
/// A frame is `valid` exactly when the page table holds an entry for its
/// `(file_id, page_id)`. `dirty` is only ever set on a valid frame.
///
/// The owning file is held weakly: a cached page never keeps a closed file
/// alive.
#[derive(Debug, Clone)]
pub struct FrameDescriptor {
    pub frame_id: FrameId,
    pub valid: bool,
    pub dirty: bool,
    /// Clock "recently used" bit, cleared by a sweep.
    pub refbit: bool,
    pub pin_cnt: u32,
    pub file_id: Option<FileId>,
    pub page_id: PageId,
    pub(crate) file: Option<Weak<PagedFile>>,
}

impl FrameDescriptor {
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            valid: false,
            dirty: false,
            refbit: false,
            pin_cnt: 0,
            file_id: None,
            page_id: PageId::INVALID,
            file: None,
        }
    }

    /// Take ownership of this frame for `page_id` of `file`, pinned once.
    pub fn set(&mut self, file: &Arc<PagedFile>, page_id: PageId) {
        self.file = Some(Arc::downgrade(file));
        self.file_id = Some(file.id());
        self.page_id = page_id;
        self.pin_cnt = 1;
        self.dirty = false;
        self.refbit = true;
        self.valid = true;
    }

    /// Return the frame to the unused state.
    pub fn clear(&mut self) {
        self.file = None;
        self.file_id = None;
        self.page_id = PageId::INVALID;
        self.pin_cnt = 0;
        self.dirty = false;
        self.refbit = false;
        self.valid = false;
    }

    /// Whether this frame holds `page_id` of the file identified by `file_id`.
    #[inline]
    pub fn holds(&self, file_id: FileId, page_id: PageId) -> bool {
        self.valid && self.file_id == Some(file_id) && self.page_id == page_id
    }

    /// Page table key of a valid frame.
    #[inline]
    pub fn key(&self) -> Option<(FileId, PageId)> {
        self.file_id
            .filter(|_| self.valid)
            .map(|file_id| (file_id, self.page_id))
    }

    /// The owning file, if it is still open.
    pub(crate) fn owner(&self) -> Option<Arc<PagedFile>> {
        self.file.as_ref().and_then(Weak::upgrade)
    }
}
