//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache between heap files and disk. It
//! manages a fixed pool of frames, each holding one page of some open file.
//!
//! # Components
//! - [`BufferPoolManager`] - The page cache and clock sweep
//! - [`Frame`] / [`FrameDescriptor`] - Page storage and per-frame bookkeeping
//! - [`PageTable`] - `(file, page)` to frame index
//! - [`PinnedPage`] - RAII pin on one page
//! - [`BufferPoolStats`] - Performance statistics
//! - [`replacer`] - Eviction policy implementations

mod buffer_pool_manager;
mod frame;
mod page_table;
mod pinned_page;
pub mod replacer;
mod stats;

pub use buffer_pool_manager::BufferPoolManager;
pub use frame::{Frame, FrameDescriptor};
pub use page_table::PageTable;
pub use pinned_page::PinnedPage;
pub use stats::{BufferPoolStats, StatsSnapshot};
