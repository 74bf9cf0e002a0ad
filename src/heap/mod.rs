//! Heap files - unordered record files over the buffer pool.
//!
//! - [`HeapFile`] - an open heap file with random access by [`Rid`](crate::Rid)
//! - [`HeapFileScan`] - filtered sequential scan with mark/reset and delete
//! - [`InsertFileScan`] - appends records, growing the page chain
//! - [`ScanFilter`] - the `field <op> value` predicate used by scans

mod filter;
mod heap_file;
mod insert_scan;
mod scan;

pub use filter::{Datatype, Operator, ScanFilter};
pub use heap_file::{create_heap_file, destroy_heap_file, HeapFile};
pub use insert_scan::InsertFileScan;
pub use scan::HeapFileScan;
