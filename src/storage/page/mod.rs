//! Page types and layouts.
//!
//! This module contains:
//! - [`Page`] - The raw 4KB data container
//! - slotted record operations on data pages (`init`, `insert_record`, ...)
//! - [`FileHeader`] - The heap file header page layout

mod file_header;
#[allow(clippy::module_inception)]
mod page;
mod slotted;

pub use file_header::FileHeader;
pub use page::Page;
pub use slotted::{DPFIXED, MAX_RECORD_SIZE};
