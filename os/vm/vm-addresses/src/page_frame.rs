use core::fmt;

/// Physical page frame number.
///
/// Frames are numbered densely from zero; a machine never has more than
/// `MAX_PAGEFRAMES` of them, so 16 bits suffice and the number fits the PFN
/// field of a page-table entry without truncation.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct PageFrameNumber(u16);

impl PageFrameNumber {
    #[inline]
    #[must_use]
    pub const fn new(v: u16) -> Self {
        Self(v)
    }

    /// Convert a table index into a frame number, if it fits.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_index(i: usize) -> Option<Self> {
        if i > u16::MAX as usize {
            None
        } else {
            Some(Self(i as u16))
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PageFrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for PageFrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pfn({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_index_rejects_wide_values() {
        assert_eq!(PageFrameNumber::from_index(7), Some(PageFrameNumber::new(7)));
        assert_eq!(
            PageFrameNumber::from_index(0xFFFF).map(PageFrameNumber::as_usize),
            Some(0xFFFF)
        );
        assert_eq!(PageFrameNumber::from_index(0x1_0000), None);
    }
}
