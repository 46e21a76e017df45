//! # Inner Page Directory
//!
//! One inner level of the two-level table: a fixed-length array of
//! [`PageTableEntry`] values, indexed by [`InnerIndex`].

use crate::PageTableEntry;
use alloc::boxed::Box;
use alloc::vec;
use vm_addresses::InnerIndex;

/// An inner directory holding `ptes_per_page` entries, all invalid at creation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PteDirectory {
    entries: Box<[PageTableEntry]>,
}

impl PteDirectory {
    /// Create a directory of `len` invalid entries.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self {
            entries: vec![PageTableEntry::zero(); len].into_boxed_slice(),
        }
    }

    /// Number of entries (valid or not).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the entry at `i`.
    #[inline]
    #[must_use]
    pub fn get(&self, i: InnerIndex) -> PageTableEntry {
        self.entries[i.as_usize()]
    }

    /// Write the entry at `i`.
    #[inline]
    pub fn set(&mut self, i: InnerIndex, e: PageTableEntry) {
        self.entries[i.as_usize()] = e;
    }

    /// Iterate over the valid entries with their indices.
    pub fn valid_entries(&self) -> impl Iterator<Item = (InnerIndex, PageTableEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_valid())
            .map(|(i, e)| (InnerIndex::new(i), *e))
    }

    /// Strip write permission from every valid entry and return a copy of the
    /// directory in which invalid slots stay zero.
    pub(crate) fn fork_write_protected(&mut self) -> Self {
        let mut child = Self::zeroed(self.len());
        for (slot, parent) in child.entries.iter_mut().zip(self.entries.iter_mut()) {
            if parent.is_valid() {
                *parent = parent.write_protected();
                *slot = *parent;
            }
        }
        child
    }
}
