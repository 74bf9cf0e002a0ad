//! Common types and utilities shared across minirel.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants
//! - Error types
//! - Identifiers (PageId, FileId, FrameId, Rid)

pub mod config;
pub mod error;
mod frame_id;
mod page_id;
mod rid;

pub use error::{Error, Result};
pub use frame_id::FrameId;
pub use page_id::{FileId, PageId};
pub use rid::Rid;
