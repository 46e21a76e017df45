//! Array-backed frame reference table.

use crate::FrameAlloc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use vm_addresses::PageFrameNumber;

/// No frame with a zero map count was left.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("all {frames} page frames are in use")]
pub struct OutOfFrames {
    pub frames: usize,
}

/// Map count per physical frame, indexed by frame number.
///
/// # Invariants
/// - `counts.len()` is the number of frames and never changes.
/// - A count is never decremented below zero; releasing a free frame is a
///   bookkeeping bug and panics in debug builds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MapCounts {
    counts: Vec<u32>,
}

impl MapCounts {
    /// Create a table of `frames` free frames.
    #[must_use]
    pub fn new(frames: usize) -> Self {
        Self {
            counts: vec![0; frames],
        }
    }

    /// Number of frames with a count of zero.
    #[must_use]
    pub fn free_frames(&self) -> usize {
        self.counts.iter().filter(|&&c| c == 0).count()
    }

    /// Iterate over `(frame, count)` for every frame.
    pub fn iter(&self) -> impl Iterator<Item = (PageFrameNumber, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| PageFrameNumber::from_index(i).map(|p| (p, c)))
    }
}

impl FrameAlloc for MapCounts {
    fn frames(&self) -> usize {
        self.counts.len()
    }

    fn map_count(&self, pfn: PageFrameNumber) -> u32 {
        self.counts.get(pfn.as_usize()).copied().unwrap_or(0)
    }

    fn peek_free(&self) -> Option<PageFrameNumber> {
        self.counts
            .iter()
            .position(|&c| c == 0)
            .and_then(PageFrameNumber::from_index)
    }

    fn alloc_frame(&mut self) -> Option<PageFrameNumber> {
        let pfn = self.peek_free()?;
        self.counts[pfn.as_usize()] = 1;
        log::trace!("claimed frame {pfn}");
        Some(pfn)
    }

    fn share_frame(&mut self, pfn: PageFrameNumber) {
        let c = &mut self.counts[pfn.as_usize()];
        debug_assert!(*c > 0, "sharing free frame {pfn}");
        *c += 1;
    }

    fn release_frame(&mut self, pfn: PageFrameNumber) -> u32 {
        let c = &mut self.counts[pfn.as_usize()];
        debug_assert!(*c > 0, "releasing free frame {pfn}");
        *c = c.saturating_sub(1);
        if *c == 0 {
            log::trace!("frame {pfn} is free again");
        }
        *c
    }
}

/// Non-zero map counts, one `pfn: count` pair per line.
impl fmt::Display for MapCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pfn, count) in self.iter().filter(|&(_, c)| c > 0) {
            writeln!(f, "{pfn:>4}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn pfn(v: u16) -> PageFrameNumber {
        PageFrameNumber::new(v)
    }

    #[test]
    fn allocates_lowest_free_frame() {
        let mut m = MapCounts::new(4);
        assert_eq!(m.alloc_frame(), Some(pfn(0)));
        assert_eq!(m.alloc_frame(), Some(pfn(1)));
        assert_eq!(m.alloc_frame(), Some(pfn(2)));

        // Freeing a lower frame makes it the next candidate again.
        assert_eq!(m.release_frame(pfn(0)), 0);
        assert_eq!(m.peek_free(), Some(pfn(0)));
        assert_eq!(m.alloc_frame(), Some(pfn(0)));
        assert_eq!(m.alloc_frame(), Some(pfn(3)));
    }

    #[test]
    fn exhaustion_is_deterministic() {
        let mut m = MapCounts::new(2);
        m.alloc_frame();
        m.alloc_frame();
        assert_eq!(m.alloc_frame(), None);
        assert_eq!(m.try_alloc_frame(), Err(OutOfFrames { frames: 2 }));
        assert_eq!(m.try_alloc_frame(), Err(OutOfFrames { frames: 2 }));
        assert_eq!(m.free_frames(), 0);
    }

    #[test]
    fn shared_frames_are_not_free() {
        let mut m = MapCounts::new(2);
        let a = m.alloc_frame().unwrap();
        m.share_frame(a);
        assert_eq!(m.map_count(a), 2);
        assert_eq!(m.release_frame(a), 1);
        assert_eq!(m.peek_free(), Some(pfn(1)));
        assert_eq!(m.release_frame(a), 0);
        assert_eq!(m.peek_free(), Some(pfn(0)));
    }

    #[test]
    fn out_of_range_frame_has_no_count() {
        let m = MapCounts::new(2);
        assert_eq!(m.map_count(pfn(9)), 0);
    }

    #[test]
    fn display_lists_used_frames() {
        let mut m = MapCounts::new(3);
        m.alloc_frame();
        m.alloc_frame();
        m.share_frame(pfn(1));
        m.release_frame(pfn(0));
        assert_eq!(m.to_string(), "   1: 2\n");
    }

    #[test]
    fn error_message_names_frame_count() {
        assert_eq!(
            OutOfFrames { frames: 128 }.to_string(),
            "all 128 page frames are in use"
        );
    }
}
