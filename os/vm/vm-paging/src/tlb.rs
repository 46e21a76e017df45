//! # Translation Lookaside Buffer
//!
//! A small fully associative cache of VPN → PFN translations for the process
//! that is currently running.
//!
//! ## Semantics
//!
//! - Entries carry no permission bits. A hit only says where the page lives,
//!   not that a write is allowed; writers must walk the page table.
//! - [`Tlb::lookup`] reflects exactly the translations inserted since the
//!   last [`Tlb::flush`]. Nothing is ever filled in speculatively.
//! - Re-inserting a cached VPN replaces its frame, so a copy-on-write fault
//!   that moved the page cannot leave the old frame behind.
//! - Capacity equals the number of virtual pages, so a full TLB can only
//!   mean every page is cached; there is no eviction policy.

use alloc::vec::Vec;
use vm_addresses::{PageFrameNumber, VirtualPageNumber};

/// A single cached translation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TlbEntry {
    pub vpn: VirtualPageNumber,
    pub pfn: PageFrameNumber,
}

/// Lookup counters, kept across flushes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TlbStats {
    pub hits: u64,
    pub misses: u64,
}

/// The translation cache.
#[derive(Clone, Debug)]
pub struct Tlb {
    entries: Vec<TlbEntry>,
    capacity: usize,
    stats: TlbStats,
}

impl Tlb {
    /// Create an empty TLB able to hold `capacity` translations.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            stats: TlbStats::default(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub const fn stats(&self) -> TlbStats {
        self.stats
    }

    /// Cached frame for `vpn`, without touching the counters.
    #[must_use]
    pub fn lookup(&self, vpn: VirtualPageNumber) -> Option<PageFrameNumber> {
        self.entries.iter().find(|e| e.vpn == vpn).map(|e| e.pfn)
    }

    /// Like [`lookup`](Self::lookup), but counts the hit or miss.
    pub fn probe(&mut self, vpn: VirtualPageNumber) -> Option<PageFrameNumber> {
        let hit = self.lookup(vpn);
        if hit.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        log::trace!("tlb probe vpn {vpn}: {hit:?}");
        hit
    }

    /// Cache `vpn → pfn`, replacing any translation already held for `vpn`.
    ///
    /// The caller guarantees the translation is live in the active page table.
    pub fn insert(&mut self, vpn: VirtualPageNumber, pfn: PageFrameNumber) {
        if let Some(e) = self.entries.iter_mut().find(|e| e.vpn == vpn) {
            e.pfn = pfn;
            return;
        }
        debug_assert!(self.entries.len() < self.capacity, "TLB overflow");
        self.entries.push(TlbEntry { vpn, pfn });
    }

    /// Drop the translation for `vpn`. Returns `true` if one was cached.
    pub fn evict(&mut self, vpn: VirtualPageNumber) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.vpn != vpn);
        before != self.entries.len()
    }

    /// Drop every translation.
    pub fn flush(&mut self) {
        log::trace!("tlb flush ({} entries)", self.entries.len());
        self.entries.clear();
    }

    /// Iterate over the cached translations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TlbEntry> + '_ {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vpn(v: u32) -> VirtualPageNumber {
        VirtualPageNumber::new(v)
    }

    fn pfn(v: u16) -> PageFrameNumber {
        PageFrameNumber::new(v)
    }

    #[test]
    fn lookup_sees_only_inserted_translations() {
        let mut tlb = Tlb::new(256);
        assert_eq!(tlb.lookup(vpn(3)), None);
        tlb.insert(vpn(3), pfn(7));
        assert_eq!(tlb.lookup(vpn(3)), Some(pfn(7)));
        assert_eq!(tlb.lookup(vpn(4)), None);
    }

    #[test]
    fn reinsert_replaces_frame() {
        let mut tlb = Tlb::new(256);
        tlb.insert(vpn(0), pfn(0));
        tlb.insert(vpn(0), pfn(1));
        assert_eq!(tlb.len(), 1);
        assert_eq!(tlb.lookup(vpn(0)), Some(pfn(1)));
    }

    #[test]
    fn evict_and_flush() {
        let mut tlb = Tlb::new(256);
        tlb.insert(vpn(1), pfn(1));
        tlb.insert(vpn(2), pfn(2));

        assert!(tlb.evict(vpn(1)));
        assert!(!tlb.evict(vpn(1)));
        assert_eq!(tlb.lookup(vpn(1)), None);
        assert_eq!(tlb.lookup(vpn(2)), Some(pfn(2)));

        tlb.flush();
        assert!(tlb.is_empty());
        assert_eq!(tlb.lookup(vpn(2)), None);
    }

    #[test]
    fn probe_counts_hits_and_misses() {
        let mut tlb = Tlb::new(4);
        assert_eq!(tlb.probe(vpn(0)), None);
        tlb.insert(vpn(0), pfn(5));
        assert_eq!(tlb.probe(vpn(0)), Some(pfn(5)));
        assert_eq!(tlb.probe(vpn(0)), Some(pfn(5)));
        tlb.flush();
        assert_eq!(tlb.stats(), TlbStats { hits: 2, misses: 1 });
    }

    #[test]
    fn fills_to_capacity_without_eviction() {
        let mut tlb = Tlb::new(4);
        for v in 0..4 {
            tlb.insert(vpn(v), pfn(0));
        }
        assert_eq!(tlb.len(), tlb.capacity());
        assert_eq!(tlb.iter().map(|e| e.vpn.as_u32()).collect::<Vec<_>>(), [0, 1, 2, 3]);
    }
}
