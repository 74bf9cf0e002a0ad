//! Record identifier.

use std::fmt;

use super::PageId;

/// Stable handle to a record: the page holding it and its slot there.
///
/// A RID stays valid until the record it names is deleted; deleting or
/// inserting other records on the same page never moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    pub page_id: PageId,
    pub slot: u16,
}

impl Rid {
    #[inline]
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}.{})", self.page_id.0, self.slot)
    }
}
