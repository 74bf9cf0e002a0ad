//! File Manager - named paged files with stable identities.
//!
//! [`FileManager`] creates, opens, closes and destroys paged files inside
//! one directory. Every open file is a shared [`FileHandle`]; opening the
//! same name twice returns the same handle and bumps its open count, so the
//! buffer pool sees exactly one identity per file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use parking_lot::Mutex;

use crate::common::{Error, FileId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::DiskManager;

/// Shared handle on an open file.
pub type FileHandle = Arc<PagedFile>;

/// An open paged file.
///
/// All I/O goes through an internal lock on the [`DiskManager`], so a
/// handle can be shared freely between heap files and the buffer pool.
pub struct PagedFile {
    id: FileId,
    name: String,
    disk: Mutex<DiskManager>,
}

impl PagedFile {
    #[inline]
    pub fn id(&self) -> FileId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read_page(&self, page_id: PageId, page: &mut Page) -> Result<()> {
        self.disk.lock().read_page(page_id, page)
    }

    pub fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        self.disk.lock().write_page(page_id, page)
    }

    pub fn allocate_page(&self) -> Result<PageId> {
        self.disk.lock().allocate_page()
    }

    pub fn dispose_page(&self, page_id: PageId) -> Result<()> {
        self.disk.lock().dispose_page(page_id)
    }

    pub fn first_page(&self) -> Result<PageId> {
        self.disk.lock().first_page()
    }

    pub fn page_count(&self) -> u32 {
        self.disk.lock().page_count()
    }

    fn sync(&self) -> Result<()> {
        self.disk.lock().sync()
    }
}

impl std::fmt::Debug for PagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

struct OpenFile {
    handle: FileHandle,
    open_count: usize,
}

struct FileTable {
    open: HashMap<String, OpenFile>,
    next_id: u32,
}

/// Creates, opens and destroys the paged files under one directory.
pub struct FileManager {
    root: PathBuf,
    table: Mutex<FileTable>,
}

impl FileManager {
    /// Manage the files in `root`. The directory must already exist.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            table: Mutex::new(FileTable {
                open: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path_of(name)?.exists())
    }

    /// Create an empty paged file.
    ///
    /// # Errors
    /// `Error::FileExists` if a file with that name is already present.
    pub fn create_file(&self, name: &str) -> Result<()> {
        let path = self.path_of(name)?;
        if path.exists() {
            return Err(Error::FileExists(name.to_string()));
        }
        DiskManager::create(&path)?;
        info!("created file {}", name);
        Ok(())
    }

    /// Delete a file from disk.
    ///
    /// # Errors
    /// `Error::FileOpen` while any handle on the file is open.
    pub fn destroy_file(&self, name: &str) -> Result<()> {
        let path = self.path_of(name)?;
        if self.table.lock().open.contains_key(name) {
            return Err(Error::FileOpen(name.to_string()));
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("destroyed file {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::FileNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open a file, sharing the handle if it is already open.
    pub fn open_file(&self, name: &str) -> Result<FileHandle> {
        let path = self.path_of(name)?;
        let mut table = self.table.lock();

        if let Some(entry) = table.open.get_mut(name) {
            entry.open_count += 1;
            return Ok(Arc::clone(&entry.handle));
        }

        if !path.exists() {
            return Err(Error::FileNotFound(name.to_string()));
        }
        let disk = DiskManager::open(&path)?;
        let id = FileId::new(table.next_id);
        table.next_id += 1;

        let handle = Arc::new(PagedFile {
            id,
            name: name.to_string(),
            disk: Mutex::new(disk),
        });
        table.open.insert(
            name.to_string(),
            OpenFile {
                handle: Arc::clone(&handle),
                open_count: 1,
            },
        );
        info!("opened file {} as {}", name, id);
        Ok(handle)
    }

    /// Number of outstanding opens of `file`, 0 if it is not open.
    pub fn open_count(&self, file: &PagedFile) -> usize {
        self.table
            .lock()
            .open
            .get(file.name())
            .filter(|entry| entry.handle.id() == file.id())
            .map_or(0, |entry| entry.open_count)
    }

    /// Release one open of `file`; the last close syncs it to disk.
    ///
    /// Cached pages of the file must be flushed before the last close, so
    /// outside the crate files are closed through `Database::close_file`.
    pub(crate) fn close_file(&self, file: &FileHandle) -> Result<()> {
        let mut table = self.table.lock();
        let entry = match table.open.get_mut(file.name()) {
            Some(entry) if entry.handle.id() == file.id() => entry,
            _ => return Err(Error::FileNotFound(file.name().to_string())),
        };

        entry.open_count -= 1;
        if entry.open_count == 0 {
            table.open.remove(file.name());
            drop(table);
            file.sync()?;
            info!("closed file {}", file.name());
        }
        Ok(())
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        let bad = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
        if bad {
            return Err(Error::BadFileName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}
