//! Storage layer - paged files and page formats.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Low-level I/O on one paged file
//! - [`FileManager`] / [`PagedFile`] - Named files with stable identities
//! - [`page`] - Page types and layouts

mod disk_manager;
mod file_manager;
pub mod page;

pub use disk_manager::DiskManager;
pub use file_manager::{FileHandle, FileManager, PagedFile};
