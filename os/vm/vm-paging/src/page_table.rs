//! # Two-Level Page Table
//!
//! The outer directory of one process. Each outer slot either holds an inner
//! [`PteDirectory`] or nothing; a directory is created the first time one of
//! its entries is written and lives as long as the table.
//!
//! ## Semantics
//!
//! - [`PageTable::walk`] distinguishes a missing directory from an invalid
//!   entry, so the fault handler can report which one it saw.
//! - [`PageTable::set`] allocates the directory on demand; every other
//!   mutation only touches directories that already exist.
//! - After modifying the active table, the caller is responsible for any TLB
//!   maintenance.

use crate::{PageTableEntry, PteDirectory};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use vm_addresses::{OuterIndex, PageFrameNumber, VirtualPageNumber};

/// Result of walking the table for one VPN.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Walk {
    /// The outer slot has no inner directory (or lies outside the table).
    NoDirectory,
    /// The inner directory exists; the entry may still be invalid.
    Entry(PageTableEntry),
}

/// A process's two-level page table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageTable {
    outer: Box<[Option<Box<PteDirectory>>]>,
    ptes_per_page: usize,
}

impl PageTable {
    /// Create an empty table with `ptes_per_page` outer slots, each of which
    /// will hold `ptes_per_page` entries once allocated.
    #[must_use]
    pub fn new(ptes_per_page: usize) -> Self {
        let mut outer = Vec::with_capacity(ptes_per_page);
        outer.resize_with(ptes_per_page, || None);
        Self {
            outer: outer.into_boxed_slice(),
            ptes_per_page,
        }
    }

    #[inline]
    #[must_use]
    pub const fn ptes_per_page(&self) -> usize {
        self.ptes_per_page
    }

    /// Number of inner directories allocated so far.
    #[must_use]
    pub fn allocated_directories(&self) -> usize {
        self.outer.iter().filter(|d| d.is_some()).count()
    }

    /// Borrow the inner directory at `i`, if allocated.
    #[inline]
    #[must_use]
    pub fn directory(&self, i: OuterIndex) -> Option<&PteDirectory> {
        self.outer.get(i.as_usize())?.as_deref()
    }

    /// Walk the table for `vpn`.
    #[must_use]
    pub fn walk(&self, vpn: VirtualPageNumber) -> Walk {
        let (outer, inner) = vpn.split(self.ptes_per_page);
        match self.directory(outer) {
            Some(dir) => Walk::Entry(dir.get(inner)),
            None => Walk::NoDirectory,
        }
    }

    /// The entry for `vpn` if its directory exists.
    #[inline]
    #[must_use]
    pub fn entry(&self, vpn: VirtualPageNumber) -> Option<PageTableEntry> {
        match self.walk(vpn) {
            Walk::Entry(e) => Some(e),
            Walk::NoDirectory => None,
        }
    }

    /// Write the entry for `vpn`, allocating its inner directory if needed.
    ///
    /// ### Panics
    /// If `vpn` lies outside the table; callers check the range first.
    pub fn set(&mut self, vpn: VirtualPageNumber, e: PageTableEntry) {
        let len = self.ptes_per_page;
        let (outer, inner) = vpn.split(len);
        self.outer[outer.as_usize()]
            .get_or_insert_with(|| Box::new(PteDirectory::zeroed(len)))
            .set(inner, e);
    }

    /// Overwrite the entry for `vpn` only if its directory already exists.
    ///
    /// Returns `false` if there was no directory to write into.
    pub fn replace(&mut self, vpn: VirtualPageNumber, e: PageTableEntry) -> bool {
        let (outer, inner) = vpn.split(self.ptes_per_page);
        match self.outer.get_mut(outer.as_usize()).and_then(Option::as_mut) {
            Some(dir) => {
                dir.set(inner, e);
                true
            }
            None => false,
        }
    }

    /// Iterate over every valid mapping in VPN order.
    pub fn mappings(&self) -> impl Iterator<Item = (VirtualPageNumber, PageTableEntry)> + '_ {
        let len = self.ptes_per_page;
        self.outer.iter().enumerate().flat_map(move |(o, dir)| {
            dir.iter().flat_map(move |dir| {
                dir.valid_entries()
                    .map(move |(i, e)| (VirtualPageNumber::join(OuterIndex::new(o), i, len), e))
            })
        })
    }

    /// Build a copy-on-write child of this table.
    ///
    /// Every directory that exists here is mirrored in the child. Valid
    /// entries keep their frame and original permission on both sides but
    /// lose write permission on both sides. The caller owns the frame
    /// reference counts and must add one share per mapping of the child.
    #[must_use]
    pub fn fork_write_protected(&mut self) -> Self {
        let outer = self
            .outer
            .iter_mut()
            .map(|slot| {
                slot.as_deref_mut()
                    .map(|dir| Box::new(dir.fork_write_protected()))
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        log::trace!(
            "forked page table with {} directories",
            outer.iter().filter(|d| d.is_some()).count()
        );
        Self {
            outer,
            ptes_per_page: self.ptes_per_page,
        }
    }
}

/// One line per valid mapping: `outer:inner live orig | pfn`, where `live`
/// is the current write bit and `orig` the original permission.
impl fmt::Display for PageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (vpn, e) in self.mappings() {
            let (outer, inner) = vpn.split(self.ptes_per_page);
            let pfn = e.frame().map_or(0, PageFrameNumber::as_usize);
            let live = if e.is_writable() { 'w' } else { '-' };
            writeln!(
                f,
                "{outer:02}:{inner:02} {live} {} | {pfn:<3}",
                e.original_permission()
            )?;
        }
        Ok(())
    }
}
