//! CLOCK (second chance) replacement policy.
//!
//! The hand sweeps the frame table circularly. A frame whose reference bit
//! is set gets a second chance: the bit is cleared and the hand moves on.
//! An unused frame, or a valid frame with a clear bit and no pins, is the
//! victim.

use crate::buffer::FrameDescriptor;
use crate::common::FrameId;

/// Clock sweep over a table of [`FrameDescriptor`]s.
///
/// The replacer owns only the hand. Reference bits and pin counts live in
/// the descriptors, so the hand position and the bits together carry the
/// full access history from one call to the next.
#[derive(Debug)]
pub struct ClockReplacer {
    hand: usize,
    pool_size: usize,
}

impl ClockReplacer {
    /// Create a replacer for `pool_size` frames.
    ///
    /// The hand starts on the last frame so the first sweep begins at
    /// frame 0.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        Self {
            hand: pool_size - 1,
            pool_size,
        }
    }

    /// Current hand position.
    #[inline]
    pub fn hand(&self) -> FrameId {
        FrameId::new(self.hand)
    }

    /// Select a victim frame, clearing reference bits along the way.
    ///
    /// Visits at most `2 * pool_size` frames, enough to see every frame
    /// again after its bit was cleared. Returns `None` when every frame is
    /// pinned. The hand is left on the victim.
    pub fn victim(&mut self, descriptors: &mut [FrameDescriptor]) -> Option<FrameId> {
        debug_assert_eq!(descriptors.len(), self.pool_size);

        for _ in 0..self.pool_size * 2 {
            self.hand = (self.hand + 1) % self.pool_size;
            let desc = &mut descriptors[self.hand];

            if !desc.valid {
                return Some(FrameId::new(self.hand));
            }
            if desc.refbit {
                desc.refbit = false;
            } else if desc.pin_cnt == 0 {
                return Some(FrameId::new(self.hand));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> Vec<FrameDescriptor> {
        (0..n).map(|i| FrameDescriptor::new(FrameId::new(i))).collect()
    }

    /// Mark a descriptor as holding a page without a real file behind it.
    fn occupy(desc: &mut FrameDescriptor, pin_cnt: u32, refbit: bool) {
        desc.valid = true;
        desc.pin_cnt = pin_cnt;
        desc.refbit = refbit;
    }

    #[test]
    fn test_first_sweep_starts_at_zero() {
        let mut descs = table(4);
        let mut clock = ClockReplacer::new(4);
        assert_eq!(clock.hand(), FrameId::new(3));

        assert_eq!(clock.victim(&mut descs), Some(FrameId::new(0)));
        assert_eq!(clock.hand(), FrameId::new(0));
    }

    #[test]
    fn test_invalid_frames_taken_in_order() {
        let mut descs = table(3);
        let mut clock = ClockReplacer::new(3);

        for i in 0..3 {
            let victim = clock.victim(&mut descs).unwrap();
            assert_eq!(victim, FrameId::new(i));
            occupy(&mut descs[i], 1, true);
        }
        assert_eq!(clock.victim(&mut descs), None);
    }

    #[test]
    fn test_second_chance() {
        let mut descs = table(3);
        let mut clock = ClockReplacer::new(3);
        for desc in descs.iter_mut() {
            occupy(desc, 0, true);
        }

        // Every bit is set: the first lap clears them all, the second lap
        // takes frame 0.
        assert_eq!(clock.victim(&mut descs), Some(FrameId::new(0)));
        assert!(descs.iter().all(|d| !d.refbit));

        assert_eq!(clock.victim(&mut descs), Some(FrameId::new(1)));
    }

    #[test]
    fn test_skips_pinned_frames() {
        let mut descs = table(3);
        let mut clock = ClockReplacer::new(3);
        occupy(&mut descs[0], 2, false);
        occupy(&mut descs[1], 1, true);
        occupy(&mut descs[2], 0, true);

        assert_eq!(clock.victim(&mut descs), Some(FrameId::new(2)));
        // The pinned frame's bit was cleared on the way.
        assert!(!descs[1].refbit);
    }

    #[test]
    fn test_all_pinned_exhausts() {
        let mut descs = table(2);
        let mut clock = ClockReplacer::new(2);
        occupy(&mut descs[0], 1, true);
        occupy(&mut descs[1], 3, false);

        assert_eq!(clock.victim(&mut descs), None);
        assert!(!descs[0].refbit);
        // 2N steps bring the hand back where it started.
        assert_eq!(clock.hand(), FrameId::new(1));
    }

    #[test]
    fn test_unpinned_after_failed_sweep() {
        let mut descs = table(2);
        let mut clock = ClockReplacer::new(2);
        occupy(&mut descs[0], 1, true);
        occupy(&mut descs[1], 1, true);
        assert_eq!(clock.victim(&mut descs), None);

        // The failed sweep left both bits clear, so an unpinned frame is
        // taken on the very next visit.
        descs[1].pin_cnt = 0;
        assert_eq!(clock.victim(&mut descs), Some(FrameId::new(1)));
    }

    #[test]
    #[should_panic(expected = "pool_size must be > 0")]
    fn test_zero_pool_panics() {
        ClockReplacer::new(0);
    }
}
