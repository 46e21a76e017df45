//! Consistency checks and dumps of the simulated machine.

use crate::mmu::Mmu;
use crate::process::Process;
use alloc::vec;
use vm_addresses::{PageFrameNumber, ProcessId, VirtualPageNumber};
use vm_alloc::FrameAlloc;
use vm_paging::{Permission, Walk};

/// A broken paging rule, as found by [`Mmu::check_invariants`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("pfn {pfn} has map count {recorded} but {mapped} valid entries")]
    MapCountMismatch {
        pfn: PageFrameNumber,
        recorded: u32,
        mapped: u32,
    },
    #[error("pid {pid}: vpn {vpn} is writable on shared pfn {pfn}")]
    SharedWritable {
        pid: ProcessId,
        vpn: VirtualPageNumber,
        pfn: PageFrameNumber,
    },
    #[error("pid {pid}: read-only vpn {vpn} is writable")]
    ReadOnlyWritable {
        pid: ProcessId,
        vpn: VirtualPageNumber,
    },
    #[error("tlb caches vpn {vpn} -> pfn {pfn}, which pid {pid} does not map")]
    StaleTlbEntry {
        pid: ProcessId,
        vpn: VirtualPageNumber,
        pfn: PageFrameNumber,
    },
    #[error("pid {0} exists more than once")]
    DuplicatePid(ProcessId),
    #[error("pid {pid}: vpn {vpn} maps nonexistent pfn {pfn}")]
    FrameOutOfRange {
        pid: ProcessId,
        vpn: VirtualPageNumber,
        pfn: PageFrameNumber,
    },
}

impl<A: FrameAlloc> Mmu<A> {
    /// Every process, running one first, then the ready queue in order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> + '_ {
        core::iter::once(&self.current).chain(self.ready.iter())
    }

    /// Check the paging rules against the live state.
    ///
    /// # Errors
    /// The first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let frames = self.frames.frames();
        let mut mapped = vec![0_u32; frames];

        for (i, process) in self.processes().enumerate() {
            let pid = process.pid();
            if self.processes().skip(i + 1).any(|p| p.pid() == pid) {
                return Err(InvariantViolation::DuplicatePid(pid));
            }

            for (vpn, entry) in process.page_table().mappings() {
                let Some(pfn) = entry.frame() else { continue };
                let Some(slot) = mapped.get_mut(pfn.as_usize()) else {
                    return Err(InvariantViolation::FrameOutOfRange { pid, vpn, pfn });
                };
                *slot += 1;

                if !entry.is_writable() {
                    continue;
                }
                if entry.original_permission() == Permission::ReadOnly {
                    return Err(InvariantViolation::ReadOnlyWritable { pid, vpn });
                }
                if self.frames.map_count(pfn) >= 2 {
                    return Err(InvariantViolation::SharedWritable { pid, vpn, pfn });
                }
            }
        }

        for (i, &count) in mapped.iter().enumerate() {
            let Some(pfn) = PageFrameNumber::from_index(i) else {
                break;
            };
            let recorded = self.frames.map_count(pfn);
            if recorded != count {
                return Err(InvariantViolation::MapCountMismatch {
                    pfn,
                    recorded,
                    mapped: count,
                });
            }
        }

        let pid = self.current.pid();
        for entry in self.tlb.iter() {
            let live = match self.current.page_table().walk(entry.vpn) {
                Walk::Entry(e) => e.frame(),
                Walk::NoDirectory => None,
            };
            if live != Some(entry.pfn) {
                return Err(InvariantViolation::StaleTlbEntry {
                    pid,
                    vpn: entry.vpn,
                    pfn: entry.pfn,
                });
            }
        }

        Ok(())
    }
}

impl<A: FrameAlloc + core::fmt::Display> Mmu<A> {
    /// Log the running process's page table, the ready queue and the frame
    /// table at info level.
    pub fn dump(&self) {
        log::info!("pid {} page table:\n{}", self.current.pid(), self.current.page_table());
        log::info!(
            "ready: {:?}, tlb: {}/{} entries, {:?}",
            self.ready_pids().collect::<alloc::vec::Vec<_>>(),
            self.tlb.len(),
            self.tlb.capacity(),
            self.tlb.stats()
        );
        log::info!("page frames:\n{}", self.frames);
    }
}
