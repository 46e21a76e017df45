//! The simulation context and its access path.

use crate::error::{AccessViolation, VmError};
use crate::process::{Process, ReadyQueue};
use vm_addresses::{PageFrameNumber, ProcessId, VirtualPageNumber};
use vm_alloc::{FrameAlloc, MapCounts};
use vm_info::{ConfigError, MachineConfig};
use vm_paging::{PageTable, PageTableEntry, Permission, Tlb, TlbStats, Walk};

/// One simulated machine: TLB, running process, ready queue and frames.
///
/// The page table of [`current`](Self::current) is the active one; every
/// operation below acts on it.
pub struct Mmu<A: FrameAlloc = MapCounts> {
    pub(crate) config: MachineConfig,
    pub(crate) frames: A,
    pub(crate) tlb: Tlb,
    pub(crate) current: Process,
    pub(crate) ready: ReadyQueue,
}

impl Mmu<MapCounts> {
    /// Boot a machine with every frame free and a root process
    /// ([`ProcessId::ROOT`]) that has an empty page table.
    ///
    /// # Errors
    /// Propagates [`MachineConfig::validate`] failures.
    pub fn new(config: MachineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_allocator(config, MapCounts::new(config.frames())))
    }
}

impl<A: FrameAlloc> Mmu<A> {
    /// Boot a machine on top of an existing frame allocator.
    ///
    /// The caller is responsible for `config` being valid and for `frames`
    /// having no mappings yet.
    pub fn with_allocator(config: MachineConfig, frames: A) -> Self {
        log::debug!(
            "booting mmu: {} frames, {} entries per level",
            frames.frames(),
            config.ptes_per_page()
        );
        Self {
            config,
            tlb: Tlb::new(config.virtual_pages()),
            current: Process::new(ProcessId::ROOT, PageTable::new(config.ptes_per_page())),
            ready: ReadyQueue::new(),
            frames,
        }
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> MachineConfig {
        self.config
    }

    /// The running process.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> &Process {
        &self.current
    }

    #[inline]
    #[must_use]
    pub const fn current_pid(&self) -> ProcessId {
        self.current.pid()
    }

    #[inline]
    #[must_use]
    pub const fn ready(&self) -> &ReadyQueue {
        &self.ready
    }

    /// Pids of the waiting processes, oldest first.
    pub fn ready_pids(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.ready.iter().map(Process::pid)
    }

    /// The running or waiting process with `pid`.
    #[must_use]
    pub fn process(&self, pid: ProcessId) -> Option<&Process> {
        if self.current.pid() == pid {
            Some(&self.current)
        } else {
            self.ready.get(pid)
        }
    }

    #[inline]
    #[must_use]
    pub const fn frames(&self) -> &A {
        &self.frames
    }

    #[inline]
    #[must_use]
    pub fn map_count(&self, pfn: PageFrameNumber) -> u32 {
        self.frames.map_count(pfn)
    }

    #[inline]
    #[must_use]
    pub const fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    #[inline]
    #[must_use]
    pub const fn tlb_stats(&self) -> TlbStats {
        self.tlb.stats()
    }

    /// Valid mappings of the running process, in VPN order.
    pub fn mappings(&self) -> impl Iterator<Item = (VirtualPageNumber, PageTableEntry)> + '_ {
        self.current.page_table().mappings()
    }

    /// Cached frame for `vpn` of the running process.
    #[must_use]
    pub fn lookup_tlb(&self, vpn: VirtualPageNumber) -> Option<PageFrameNumber> {
        self.tlb.lookup(vpn)
    }

    /// Cache `vpn → pfn` for the running process.
    ///
    /// The caller guarantees that this is the live mapping in the active
    /// page table; the TLB does not check.
    ///
    /// # Errors
    /// [`VmError::IllegalAccess`] for a page outside the address space,
    /// which the TLB has no slot for.
    pub fn insert_tlb(
        &mut self,
        vpn: VirtualPageNumber,
        pfn: PageFrameNumber,
    ) -> Result<(), VmError> {
        self.check_range(vpn)?;
        self.tlb.insert(vpn, pfn);
        Ok(())
    }

    pub(crate) fn check_range(&self, vpn: VirtualPageNumber) -> Result<(), VmError> {
        if vpn.in_range(self.config.virtual_pages()) {
            Ok(())
        } else {
            Err(VmError::illegal(vpn, AccessViolation::OutOfRange))
        }
    }

    /// Map `vpn` of the running process to the lowest-numbered free frame.
    ///
    /// The entry's write bit follows `permission`, and the permission is
    /// remembered as the page's original permission.
    ///
    /// # Errors
    /// - [`VmError::OutOfMemory`] when no frame is free; nothing is modified.
    /// - [`VmError::AlreadyMapped`] when `vpn` is already valid.
    /// - [`VmError::IllegalAccess`] for a page outside the address space.
    pub fn alloc_page(
        &mut self,
        vpn: VirtualPageNumber,
        permission: Permission,
    ) -> Result<PageFrameNumber, VmError> {
        self.check_range(vpn)?;
        if self
            .current
            .page_table()
            .entry(vpn)
            .is_some_and(PageTableEntry::is_valid)
        {
            return Err(VmError::AlreadyMapped(vpn));
        }

        let pid = self.current.pid();
        let pfn = self
            .frames
            .try_alloc_frame()
            .inspect_err(|_| log::warn!("pid {pid}: no frame left for vpn {vpn}"))?;

        self.current
            .page_table_mut()
            .set(vpn, PageTableEntry::mapped(pfn, permission));
        log::debug!("pid {pid}: alloc vpn {vpn} -> pfn {pfn} ({permission})");
        Ok(pfn)
    }

    /// Unmap `vpn` from the running process and drop its cached translation.
    ///
    /// Only this process's share of the frame is released; a copy-on-write
    /// sibling keeps its mapping.
    ///
    /// # Errors
    /// [`VmError::IllegalAccess`] if `vpn` is not mapped; nothing is modified.
    pub fn free_page(&mut self, vpn: VirtualPageNumber) -> Result<(), VmError> {
        self.check_range(vpn)?;
        let entry = match self.current.page_table().walk(vpn) {
            Walk::NoDirectory => {
                return Err(VmError::illegal(vpn, AccessViolation::NoDirectory));
            }
            Walk::Entry(e) => e,
        };
        let Some(pfn) = entry.frame() else {
            return Err(VmError::illegal(vpn, AccessViolation::InvalidEntry));
        };

        let left = self.frames.release_frame(pfn);
        self.current
            .page_table_mut()
            .replace(vpn, PageTableEntry::zero());
        self.tlb.evict(vpn);
        log::debug!(
            "pid {}: free vpn {vpn} (pfn {pfn}, {left} mappings left)",
            self.current.pid()
        );
        Ok(())
    }

    /// Walk the active page table once, without faulting or caching.
    ///
    /// Returns the frame if `access` is permitted by the entry for `vpn`.
    #[must_use]
    pub fn walk(&self, vpn: VirtualPageNumber, access: Permission) -> Option<PageFrameNumber> {
        match self.current.page_table().walk(vpn) {
            Walk::Entry(e) if e.permits(access) => e.frame(),
            _ => None,
        }
    }

    /// Translate one access of the running process.
    ///
    /// Reads try the TLB first. On a failed walk the page-fault handler runs
    /// and the walk is retried once; a successful walk is cached.
    ///
    /// # Errors
    /// Whatever [`handle_page_fault`](Self::handle_page_fault) reports, plus
    /// [`VmError::InternalInconsistency`] if a resolved fault still does not
    /// translate.
    pub fn translate(
        &mut self,
        vpn: VirtualPageNumber,
        access: Permission,
    ) -> Result<PageFrameNumber, VmError> {
        self.check_range(vpn)?;
        if !access.allows_write()
            && let Some(pfn) = self.tlb.probe(vpn)
        {
            return Ok(pfn);
        }

        if let Some(pfn) = self.walk(vpn, access) {
            self.tlb.insert(vpn, pfn);
            return Ok(pfn);
        }

        self.handle_page_fault(vpn, access)?;

        let Some(pfn) = self.walk(vpn, access) else {
            log::error!("pid {}: vpn {vpn} still faults after resolution", self.current.pid());
            return Err(VmError::InternalInconsistency {
                vpn,
                detail: "resolved fault does not translate",
            });
        };
        self.tlb.insert(vpn, pfn);
        Ok(pfn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vm_alloc::OutOfFrames;

    fn mmu(frames: usize) -> Mmu {
        Mmu::new(MachineConfig::default().with_frames(frames)).unwrap()
    }

    fn vpn(v: u32) -> VirtualPageNumber {
        VirtualPageNumber::new(v)
    }

    fn pfn(v: u16) -> PageFrameNumber {
        PageFrameNumber::new(v)
    }

    #[test]
    fn boots_with_root_process() {
        let m = mmu(4);
        assert_eq!(m.current_pid(), ProcessId::ROOT);
        assert_eq!(m.ready_pids().count(), 0);
        assert_eq!(m.mappings().count(), 0);
        assert_eq!(m.tlb().capacity(), 256);
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(matches!(
            Mmu::new(MachineConfig::new(0, 16)),
            Err(ConfigError::NoFrames)
        ));
    }

    #[test]
    fn alloc_binds_lowest_free_frame() {
        let mut m = mmu(4);
        assert_eq!(m.alloc_page(vpn(10), Permission::ReadWrite), Ok(pfn(0)));
        assert_eq!(m.alloc_page(vpn(3), Permission::ReadOnly), Ok(pfn(1)));
        assert_eq!(m.map_count(pfn(0)), 1);

        let e = m.current().page_table().entry(vpn(3)).unwrap();
        assert!(e.is_valid());
        assert!(!e.is_writable());
        assert_eq!(e.original_permission(), Permission::ReadOnly);
    }

    #[test]
    fn alloc_twice_is_refused_without_leaking() {
        let mut m = mmu(4);
        m.alloc_page(vpn(1), Permission::ReadWrite).unwrap();
        assert_eq!(
            m.alloc_page(vpn(1), Permission::ReadOnly),
            Err(VmError::AlreadyMapped(vpn(1)))
        );
        assert_eq!(m.map_count(pfn(0)), 1);
        assert_eq!(m.map_count(pfn(1)), 0);
    }

    #[test]
    fn out_of_memory_leaves_table_untouched() {
        let mut m = mmu(1);
        m.alloc_page(vpn(0), Permission::ReadWrite).unwrap();
        assert_eq!(
            m.alloc_page(vpn(40), Permission::ReadWrite),
            Err(VmError::OutOfMemory(OutOfFrames { frames: 1 }))
        );
        assert_eq!(m.current().page_table().entry(vpn(40)), None);
        assert_eq!(m.current().page_table().allocated_directories(), 1);
    }

    #[test]
    fn out_of_range_pages_are_illegal() {
        let mut m = mmu(4);
        let err = VmError::illegal(vpn(256), AccessViolation::OutOfRange);
        assert_eq!(m.alloc_page(vpn(256), Permission::ReadOnly), Err(err));
        assert_eq!(m.free_page(vpn(256)), Err(err));
        assert_eq!(m.translate(vpn(256), Permission::ReadOnly), Err(err));
    }

    #[test]
    fn free_clears_entry_count_and_tlb() {
        let mut m = mmu(4);
        m.alloc_page(vpn(2), Permission::ReadWrite).unwrap();
        assert_eq!(m.translate(vpn(2), Permission::ReadOnly), Ok(pfn(0)));
        assert_eq!(m.lookup_tlb(vpn(2)), Some(pfn(0)));

        m.free_page(vpn(2)).unwrap();
        assert_eq!(m.lookup_tlb(vpn(2)), None);
        assert_eq!(m.map_count(pfn(0)), 0);
        let e = m.current().page_table().entry(vpn(2)).unwrap();
        assert_eq!(e, PageTableEntry::zero());

        // The frame is the next candidate again.
        assert_eq!(m.alloc_page(vpn(9), Permission::ReadOnly), Ok(pfn(0)));
    }

    #[test]
    fn free_of_unmapped_page_is_illegal() {
        let mut m = mmu(4);
        assert_eq!(
            m.free_page(vpn(0)),
            Err(VmError::illegal(vpn(0), AccessViolation::NoDirectory))
        );
        m.alloc_page(vpn(0), Permission::ReadWrite).unwrap();
        assert_eq!(
            m.free_page(vpn(1)),
            Err(VmError::illegal(vpn(1), AccessViolation::InvalidEntry))
        );
    }

    #[test]
    fn reads_hit_tlb_after_first_walk() {
        let mut m = mmu(4);
        m.alloc_page(vpn(7), Permission::ReadOnly).unwrap();
        assert_eq!(m.translate(vpn(7), Permission::ReadOnly), Ok(pfn(0)));
        assert_eq!(m.translate(vpn(7), Permission::ReadOnly), Ok(pfn(0)));
        assert_eq!(m.tlb_stats(), TlbStats { hits: 1, misses: 1 });
    }

    #[test]
    fn writes_bypass_tlb() {
        let mut m = mmu(4);
        m.alloc_page(vpn(7), Permission::ReadOnly).unwrap();
        m.translate(vpn(7), Permission::ReadOnly).unwrap();
        assert_eq!(
            m.translate(vpn(7), Permission::ReadWrite),
            Err(VmError::illegal(vpn(7), AccessViolation::WriteToReadOnly))
        );
        assert_eq!(m.tlb_stats().hits, 0);
    }

    #[test]
    fn walk_honours_write_bit() {
        let mut m = mmu(4);
        m.alloc_page(vpn(0), Permission::ReadOnly).unwrap();
        assert_eq!(m.walk(vpn(0), Permission::ReadOnly), Some(pfn(0)));
        assert_eq!(m.walk(vpn(0), Permission::ReadWrite), None);
        assert_eq!(m.walk(vpn(1), Permission::ReadOnly), None);
    }

    #[test]
    fn explicit_tlb_operations() {
        let mut m = mmu(4);
        assert_eq!(m.insert_tlb(vpn(4), pfn(3)), Ok(()));
        assert_eq!(m.lookup_tlb(vpn(4)), Some(pfn(3)));
        assert_eq!(m.lookup_tlb(vpn(5)), None);
    }

    #[test]
    fn tlb_insert_outside_address_space_is_refused() {
        let mut m = mmu(4);
        for v in 256..600 {
            assert_eq!(
                m.insert_tlb(vpn(v), pfn(0)),
                Err(VmError::illegal(vpn(v), AccessViolation::OutOfRange))
            );
        }
        assert!(m.tlb().is_empty());
    }
}
