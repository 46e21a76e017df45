//! # Page-Frame Allocation
//!
//! Physical frames of the simulated machine and who is using them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Frame Reference Table                  │
//! │    • one map count per physical frame               │
//! │    • count 0  → free, next allocation candidate     │
//! │    • count ≥2 → copy-on-write shared, never written │
//! └─────────────────┬───────────────────────────────────┘
//!                   │  lowest-numbered free frame first
//! ┌─────────────────▼───────────────────────────────────┐
//! │                  FrameAlloc                         │
//! │    • alloc / share / release by frame number        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! A frame's count is the number of valid page-table entries, across all
//! processes, bound to it. Frames are never reclaimed behind the simulation's
//! back: the count only drops when an entry is freed or moved away by a
//! copy-on-write fault.
//!
//! ```rust
//! use vm_alloc::{FrameAlloc, MapCounts};
//!
//! let mut frames = MapCounts::new(2);
//! let a = frames.alloc_frame().unwrap();
//! frames.share_frame(a);
//! assert_eq!(frames.map_count(a), 2);
//! assert_eq!(frames.release_frame(a), 1);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

pub mod map_counts;

pub use map_counts::{MapCounts, OutOfFrames};
use vm_addresses::PageFrameNumber;

/// Source of physical frames for page-table entries.
///
/// Implementations track one reference count per frame and always hand out
/// the lowest-numbered free frame, which keeps allocation deterministic.
pub trait FrameAlloc {
    /// Total number of frames managed.
    fn frames(&self) -> usize;

    /// Number of page-table entries currently bound to `pfn`.
    fn map_count(&self, pfn: PageFrameNumber) -> u32;

    /// Lowest-numbered frame with a count of zero, without claiming it.
    fn peek_free(&self) -> Option<PageFrameNumber>;

    /// Claim the lowest-numbered free frame, setting its count to one.
    ///
    /// Returns `None` when every frame is in use.
    fn alloc_frame(&mut self) -> Option<PageFrameNumber>;

    /// Record one more entry bound to `pfn`.
    fn share_frame(&mut self, pfn: PageFrameNumber);

    /// Record one entry fewer bound to `pfn` and return the remaining count.
    fn release_frame(&mut self, pfn: PageFrameNumber) -> u32;

    /// Claim the lowest free frame or report exhaustion.
    ///
    /// # Errors
    /// [`OutOfFrames`] when every frame has a non-zero count.
    fn try_alloc_frame(&mut self) -> Result<PageFrameNumber, OutOfFrames> {
        self.alloc_frame().ok_or_else(|| OutOfFrames {
            frames: self.frames(),
        })
    }
}
