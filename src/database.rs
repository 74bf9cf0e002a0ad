//! Database - the context every heap file works against.
//!
//! A [`Database`] bundles the [`FileManager`] for one directory with the
//! [`BufferPoolManager`] caching its pages. Heap files and scans borrow it;
//! there is no process-wide instance.

use std::path::Path;

use log::info;

use crate::buffer::BufferPoolManager;
use crate::common::Result;
use crate::storage::{FileHandle, FileManager};

/// A directory of paged files plus the buffer pool in front of them.
///
/// # Example
/// ```no_run
/// use minirel::database::Database;
/// use minirel::heap::{create_heap_file, InsertFileScan};
///
/// let db = Database::open("data", 100).unwrap();
/// create_heap_file(&db, "emp").unwrap();
///
/// let mut inserter = InsertFileScan::open(&db, "emp").unwrap();
/// inserter.insert_record(b"hello").unwrap();
/// ```
pub struct Database {
    // Dropped first, so the teardown flush still sees every open file.
    pool: BufferPoolManager,
    files: FileManager,
}

impl Database {
    /// Open the database in `root` with a pool of `pool_size` frames,
    /// creating the directory if needed.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn open<P: AsRef<Path>>(root: P, pool_size: usize) -> Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        info!(
            "opened database at {} with {} frames",
            root.as_ref().display(),
            pool_size
        );
        Ok(Self {
            pool: BufferPoolManager::new(pool_size),
            files: FileManager::new(root),
        })
    }

    #[inline]
    pub fn pool(&self) -> &BufferPoolManager {
        &self.pool
    }

    #[inline]
    pub fn files(&self) -> &FileManager {
        &self.files
    }

    pub fn create_file(&self, name: &str) -> Result<()> {
        self.files.create_file(name)
    }

    /// # Errors
    /// `Error::FileOpen` while the file is open.
    pub fn destroy_file(&self, name: &str) -> Result<()> {
        self.files.destroy_file(name)
    }

    pub fn open_file(&self, name: &str) -> Result<FileHandle> {
        self.files.open_file(name)
    }

    /// Release one open of `file`.
    ///
    /// The last close first flushes the file's pages out of the pool, so a
    /// closed file never has frames left behind.
    ///
    /// # Errors
    /// `Error::PagePinned` if this is the last close and a page of the file
    /// is still pinned; the file stays open in that case.
    pub fn close_file(&self, file: &FileHandle) -> Result<()> {
        if self.files.open_count(file) == 1 {
            self.pool.flush_file(file)?;
        }
        self.files.close_file(file)
    }
}
