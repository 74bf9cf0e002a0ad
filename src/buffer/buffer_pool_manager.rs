//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between paged files and memory
//! - Pin-based reference counting
//! - CLOCK replacement with dirty page write-back
//! - Per-file flush, and a best-effort flush on teardown

use log::{debug, warn};
use parking_lot::{Mutex, RwLockReadGuard, RwLockWriteGuard};

use crate::buffer::replacer::ClockReplacer;
use crate::buffer::{BufferPoolStats, Frame, FrameDescriptor, PageTable, PinnedPage};
use crate::common::{Error, FileId, FrameId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::{FileHandle, PagedFile};

/// Manages a pool of buffer frames for caching pages of any open file.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                        │
/// │  ┌──────────────────────────────┐  ┌─────────────────────┐  │
/// │  │ state: Mutex<PoolState>      │  │ frames: Vec<Frame>  │  │
/// │  │  descriptors  [D0][D1][D2].. │  │ [F0] [F1] [F2] ...  │  │
/// │  │  page_table   (file,page)→Fid│─▶│  RwLock<Page> each  │  │
/// │  │  replacer     clock hand     │  │                     │  │
/// │  └──────────────────────────────┘  └─────────────────────┘  │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// Frames are addressed by [`FrameId`]. Every public operation takes the
/// state lock for its whole duration, including any disk I/O it does, so
/// operations are applied one at a time in call order.
///
/// # Pinning
/// [`read_page`](Self::read_page) and [`allocate_page`](Self::allocate_page)
/// pin the frame they return. Each pin must be released by exactly one
/// [`unpin_page`](Self::unpin_page); [`PinnedPage`] does this on drop.
///
/// # Usage
/// ```ignore
/// let db = Database::open(dir, 10)?;
/// let file = db.open_file("rel")?;
///
/// let mut page = db.pool().new_page(&file)?;
/// page.write().as_mut_slice()[0] = 0xAB;
/// // page drops: unpinned dirty
/// ```
pub struct BufferPoolManager {
    /// Page storage, one per frame.
    frames: Vec<Frame>,

    /// Frame table, page table and clock hand.
    state: Mutex<PoolState>,

    stats: BufferPoolStats,

    pool_size: usize,
}

struct PoolState {
    descriptors: Vec<FrameDescriptor>,
    page_table: PageTable,
    replacer: ClockReplacer,
}

impl BufferPoolManager {
    /// Create a new buffer pool manager.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        let frames = (0..pool_size).map(|_| Frame::new()).collect();
        let descriptors = (0..pool_size)
            .map(|i| FrameDescriptor::new(FrameId::new(i)))
            .collect();

        Self {
            frames,
            state: Mutex::new(PoolState {
                descriptors,
                page_table: PageTable::new(pool_size),
                replacer: ClockReplacer::new(pool_size),
            }),
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: Pin and unpin
    // ========================================================================

    /// Pin `page_id` of `file`, reading it from disk if it is not resident.
    ///
    /// # Errors
    /// - `Error::BufferExceeded` if every frame is pinned
    /// - `Error::PageNotFound` / `Error::Io` from the file
    pub fn read_page(&self, file: &FileHandle, page_id: PageId) -> Result<FrameId> {
        let mut state = self.state.lock();

        if let Some(frame_id) = state.page_table.lookup(file.id(), page_id) {
            let desc = &mut state.descriptors[frame_id.0];
            desc.refbit = true;
            desc.pin_cnt += 1;
            self.stats.record_hit();
            return Ok(frame_id);
        }

        let frame_id = self.allocate_frame(&mut state)?;
        file.read_page(page_id, &mut self.frames[frame_id.0].page_mut())?;
        self.stats.record_miss();

        state.page_table.insert(file.id(), page_id, frame_id);
        state.descriptors[frame_id.0].set(file, page_id);
        Ok(frame_id)
    }

    /// Release one pin on `page_id` of `file`.
    ///
    /// `dirty` is sticky: once any unpin reports a modification the frame
    /// is written back before it is reused.
    ///
    /// # Errors
    /// - `Error::PageNotResident` if the page is not in the pool
    /// - `Error::PageNotPinned` if its pin count is already zero
    pub fn unpin_page(&self, file: &PagedFile, page_id: PageId, dirty: bool) -> Result<()> {
        let mut state = self.state.lock();

        let frame_id = state
            .page_table
            .lookup(file.id(), page_id)
            .ok_or(Error::PageNotResident {
                file: file.id(),
                page: page_id,
            })?;

        let desc = &mut state.descriptors[frame_id.0];
        if desc.pin_cnt == 0 {
            return Err(Error::PageNotPinned {
                file: file.id(),
                page: page_id,
            });
        }
        desc.dirty |= dirty;
        desc.refbit = true;
        desc.pin_cnt -= 1;
        Ok(())
    }

    // ========================================================================
    // Public API: Create and dispose pages
    // ========================================================================

    /// Allocate a new page in `file` and pin it in a zeroed frame.
    ///
    /// Nothing is read from disk; the caller initializes the content.
    ///
    /// # Errors
    /// - `Error::BufferExceeded` if every frame is pinned (the file is left
    ///   untouched)
    /// - I/O errors from the file
    pub fn allocate_page(&self, file: &FileHandle) -> Result<(PageId, FrameId)> {
        let mut state = self.state.lock();

        let frame_id = self.allocate_frame(&mut state)?;
        let page_id = file.allocate_page()?;
        self.frames[frame_id.0].page_mut().reset();
        self.stats.record_allocation();

        state.page_table.insert(file.id(), page_id, frame_id);
        state.descriptors[frame_id.0].set(file, page_id);
        Ok((page_id, frame_id))
    }

    /// Drop `page_id` from the pool if resident, then free it in the file.
    ///
    /// # Errors
    /// - `Error::PagePinned` if the page is resident and pinned
    /// - I/O errors from the file
    pub fn dispose_page(&self, file: &FileHandle, page_id: PageId) -> Result<()> {
        {
            let mut state = self.state.lock();
            if let Some(frame_id) = state.page_table.lookup(file.id(), page_id) {
                if state.descriptors[frame_id.0].pin_cnt > 0 {
                    return Err(Error::PagePinned {
                        file: file.id(),
                        page: page_id,
                    });
                }
                state.page_table.remove(file.id(), page_id);
                state.descriptors[frame_id.0].clear();
            }
        }
        file.dispose_page(page_id)
    }

    // ========================================================================
    // Public API: Flush
    // ========================================================================

    /// Write back every dirty page of `file` and drop all its frames.
    ///
    /// All or nothing with respect to pins: if any page of the file is
    /// pinned, nothing is written or dropped.
    ///
    /// # Errors
    /// - `Error::PagePinned` if a page of the file is pinned
    /// - I/O errors from the file
    ///
    /// # Panics
    /// Panics if a frame carries the file's identity without being valid.
    pub fn flush_file(&self, file: &PagedFile) -> Result<()> {
        let mut state = self.state.lock();
        let file_id = file.id();

        for desc in state.descriptors.iter() {
            if desc.file_id != Some(file_id) {
                continue;
            }
            assert!(
                desc.valid,
                "{} owned by {} but marked invalid",
                desc.frame_id,
                file_id
            );
            if desc.pin_cnt > 0 {
                return Err(Error::PagePinned {
                    file: file_id,
                    page: desc.page_id,
                });
            }
        }

        let PoolState {
            descriptors,
            page_table,
            ..
        } = &mut *state;
        for desc in descriptors.iter_mut() {
            if desc.file_id != Some(file_id) {
                continue;
            }
            if desc.dirty {
                file.write_page(desc.page_id, &self.frames[desc.frame_id.0].page())?;
                self.stats.record_write();
                debug!("flushed {} of {} from {}", desc.page_id, file_id, desc.frame_id);
                desc.dirty = false;
            }
            page_table.remove(file_id, desc.page_id);
            desc.clear();
        }
        Ok(())
    }

    // ========================================================================
    // Public API: Scoped pins
    // ========================================================================

    /// [`read_page`](Self::read_page) wrapped in a guard that unpins on drop.
    pub fn fetch_page(&self, file: &FileHandle, page_id: PageId) -> Result<PinnedPage<'_>> {
        let frame_id = self.read_page(file, page_id)?;
        Ok(PinnedPage::new(self, FileHandle::clone(file), page_id, frame_id))
    }

    /// [`allocate_page`](Self::allocate_page) wrapped in a guard that unpins
    /// on drop.
    pub fn new_page(&self, file: &FileHandle) -> Result<PinnedPage<'_>> {
        let (page_id, frame_id) = self.allocate_page(file)?;
        Ok(PinnedPage::new(self, FileHandle::clone(file), page_id, frame_id))
    }

    // ========================================================================
    // Public API: Page access
    // ========================================================================

    /// Read access to the page cached in `frame_id`.
    ///
    /// Only meaningful while the caller holds a pin on that frame.
    #[inline]
    pub fn page(&self, frame_id: FrameId) -> RwLockReadGuard<'_, Page> {
        self.frames[frame_id.0].page()
    }

    /// Write access to the page cached in `frame_id`.
    ///
    /// Only meaningful while the caller holds a pin on that frame. The
    /// caller reports the modification through `unpin_page(.., true)`.
    #[inline]
    pub fn page_mut(&self, frame_id: FrameId) -> RwLockWriteGuard<'_, Page> {
        self.frames[frame_id.0].page_mut()
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Frame holding `page_id` of `file`, if resident.
    pub fn frame_of(&self, file: &PagedFile, page_id: PageId) -> Option<FrameId> {
        self.state.lock().page_table.lookup(file.id(), page_id)
    }

    /// Pin count of `page_id` of `file`, if resident.
    pub fn pin_count(&self, file: &PagedFile, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        state
            .page_table
            .lookup(file.id(), page_id)
            .map(|frame_id| state.descriptors[frame_id.0].pin_cnt)
    }

    /// Copy of one frame's descriptor.
    pub fn descriptor(&self, frame_id: FrameId) -> FrameDescriptor {
        self.state.lock().descriptors[frame_id.0].clone()
    }

    /// Copy of the whole frame table, in frame order.
    pub fn frame_table(&self) -> Vec<FrameDescriptor> {
        self.state.lock().descriptors.clone()
    }

    /// Current position of the clock hand.
    pub fn clock_hand(&self) -> FrameId {
        self.state.lock().replacer.hand()
    }

    /// Number of pages currently resident.
    pub fn page_count(&self) -> usize {
        self.state.lock().page_table.len()
    }

    /// Number of frames with at least one pin.
    pub fn pinned_frame_count(&self) -> usize {
        self.state
            .lock()
            .descriptors
            .iter()
            .filter(|desc| desc.pin_cnt > 0)
            .count()
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Pick a frame with the clock sweep and make it free.
    ///
    /// A dirty victim is written back before anything about it changes, so
    /// a failed write leaves the victim cached and dirty.
    fn allocate_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        let frame_id = state
            .replacer
            .victim(&mut state.descriptors)
            .ok_or(Error::BufferExceeded)?;

        let desc = &state.descriptors[frame_id.0];
        if let Some((file_id, page_id)) = desc.key() {
            if desc.dirty {
                self.write_back(desc, file_id)?;
            }
            debug!("evicting {} of {} from {}", page_id, file_id, frame_id);
            self.stats.record_eviction();

            state.page_table.remove(file_id, page_id);
            state.descriptors[frame_id.0].clear();
        }
        Ok(frame_id)
    }

    /// Write a dirty frame to its owning file.
    ///
    /// # Errors
    /// `Error::FileClosed` if the owning file is gone; the frame keeps its
    /// page and stays dirty.
    fn write_back(&self, desc: &FrameDescriptor, file_id: FileId) -> Result<()> {
        let file = desc.owner().ok_or(Error::FileClosed {
            file: file_id,
            page: desc.page_id,
        })?;
        file.write_page(desc.page_id, &self.frames[desc.frame_id.0].page())?;
        self.stats.record_write();
        debug!("wrote back {} of {}", desc.page_id, file.name());
        Ok(())
    }
}

impl Drop for BufferPoolManager {
    /// Write back every dirty page still cached. Failures are logged.
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for desc in state.descriptors.iter().filter(|d| d.valid && d.dirty) {
            let file = match desc.owner() {
                Some(file) => file,
                None => {
                    warn!(
                        "discarding dirty {} in {}: owning file is closed",
                        desc.page_id, desc.frame_id
                    );
                    continue;
                }
            };
            match file.write_page(desc.page_id, &self.frames[desc.frame_id.0].page()) {
                Ok(()) => self.stats.record_write(),
                Err(e) => warn!(
                    "failed to flush {} of {} at shutdown: {}",
                    desc.page_id,
                    file.name(),
                    e
                ),
            }
        }
    }
}
