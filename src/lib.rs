//! minirel - a clock-replacement buffer manager and heap-file access method.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            minirel                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Query Layer (query/)                        │   │
//! │  │         insert / delete / select + projection            │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Heap Files (heap/)                          │   │
//! │  │   HeapFile + HeapFileScan + InsertFileScan + ScanFilter  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Buffer Pool (buffer/)                       │   │
//! │  │   BufferPoolManager + ClockReplacer + PageTable          │   │
//! │  │   FrameDescriptor + PinnedPage + Statistics              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Storage Layer (storage/)                    │   │
//! │  │   FileManager + DiskManager + Page + slotted records     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FileId, FrameId, Rid, Error, config)
//! - [`storage`] - Paged files and page formats
//! - [`buffer`] - Buffer pool with clock replacement
//! - [`heap`] - Heap files and scans
//! - [`query`] - Relational operators over heap files
//! - [`database`] - The context tying files and pool together
//!
//! # Quick Start
//! ```no_run
//! use minirel::database::Database;
//! use minirel::heap::{create_heap_file, HeapFileScan, InsertFileScan};
//!
//! let db = Database::open("my_database", 100).unwrap();
//! create_heap_file(&db, "emp").unwrap();
//!
//! let mut inserter = InsertFileScan::open(&db, "emp").unwrap();
//! let rid = inserter.insert_record(b"alice").unwrap();
//! drop(inserter);
//!
//! let mut scan = HeapFileScan::open(&db, "emp").unwrap();
//! assert_eq!(scan.scan_next().unwrap(), Some(rid));
//! ```

pub mod buffer;
pub mod common;
pub mod database;
pub mod heap;
pub mod query;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FileId, FrameId, PageId, Result, Rid};

pub use buffer::{BufferPoolManager, BufferPoolStats, PinnedPage, StatsSnapshot};
pub use database::Database;
pub use heap::{Datatype, HeapFile, HeapFileScan, InsertFileScan, Operator};
pub use storage::page::Page;
