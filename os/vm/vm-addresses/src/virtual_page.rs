use crate::{InnerIndex, OuterIndex};
use core::fmt;

/// Virtual page number inside one process's address space.
///
/// ### Invariants
/// - None by construction. Whether a VPN lies inside the address space
///   depends on the machine geometry; see [`in_range`](Self::in_range).
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualPageNumber(u32);

impl VirtualPageNumber {
    #[inline]
    #[must_use]
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// `true` if the page exists in an address space of `pages` pages.
    #[inline]
    #[must_use]
    pub const fn in_range(self, pages: usize) -> bool {
        self.as_usize() < pages
    }

    /// Split into outer/inner table indices for `ptes_per_page` entries per level.
    ///
    /// ### Panics
    /// Divides by `ptes_per_page`; a zero level size is rejected by
    /// `MachineConfig::validate` long before this is reached.
    #[inline]
    #[must_use]
    pub const fn split(self, ptes_per_page: usize) -> (OuterIndex, InnerIndex) {
        let v = self.as_usize();
        (
            OuterIndex::new(v / ptes_per_page),
            InnerIndex::new(v % ptes_per_page),
        )
    }

    /// Inverse of [`split`](Self::split).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn join(outer: OuterIndex, inner: InnerIndex, ptes_per_page: usize) -> Self {
        Self((outer.as_usize() * ptes_per_page + inner.as_usize()) as u32)
    }
}

impl From<u32> for VirtualPageNumber {
    #[inline]
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl fmt::Display for VirtualPageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for VirtualPageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vpn({})", self.0)
    }
}
