//! Configuration constants for minirel.

/// Size of a page in bytes (4KB).
///
/// Every file is a sequence of `PAGE_SIZE` pages and every buffer frame
/// holds exactly one page.
pub const PAGE_SIZE: usize = 4096;

/// Width of the file-name field in a heap file header page.
///
/// Names longer than this are truncated when the header is written.
pub const MAX_NAME_SIZE: usize = 50;

/// Number of frames used when the caller has no better idea.
pub const DEFAULT_POOL_SIZE: usize = 100;

/// Capacity of the page identity index for a pool of `pool_size` frames.
///
/// The index is oversized by ~20% and forced odd to keep the load factor
/// low even with every frame resident.
pub fn page_table_capacity(pool_size: usize) -> usize {
    (pool_size * 6 / 5) | 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_page_table_capacity_oversizes() {
        assert_eq!(page_table_capacity(10), 13);
        assert_eq!(page_table_capacity(3), 3);
        for n in 1..200 {
            let cap = page_table_capacity(n);
            assert!(cap >= n);
            assert_eq!(cap % 2, 1);
        }
    }
}
