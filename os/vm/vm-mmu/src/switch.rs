//! Process switching and copy-on-write fork.

use crate::mmu::Mmu;
use crate::process::Process;
use core::mem;
use vm_addresses::ProcessId;
use vm_alloc::FrameAlloc;

/// What [`Mmu::switch_process`] did.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SwitchOutcome {
    /// `to` was waiting (or already running) and is running again.
    Resumed { from: ProcessId, to: ProcessId },
    /// `pid` was unknown; `child` is a copy-on-write fork of `parent`.
    Forked { parent: ProcessId, child: ProcessId },
}

impl SwitchOutcome {
    /// The process running after the switch.
    #[must_use]
    pub const fn running(self) -> ProcessId {
        match self {
            Self::Resumed { to, .. } => to,
            Self::Forked { child, .. } => child,
        }
    }
}

impl<A: FrameAlloc> Mmu<A> {
    /// Make `pid` the running process.
    ///
    /// The TLB is flushed first in every case. A waiting process is resumed
    /// without touching any page table. Any other pid is forked off the
    /// running process: each of the parent's mappings is shared with the
    /// child, and both sides lose write permission so that the first write
    /// on either side faults.
    pub fn switch_process(&mut self, pid: ProcessId) -> SwitchOutcome {
        self.tlb.flush();
        let from = self.current.pid();

        if from == pid {
            log::debug!("switch: pid {pid} keeps running");
            return SwitchOutcome::Resumed { from, to: pid };
        }

        if let Some(next) = self.ready.take(pid) {
            let prev = mem::replace(&mut self.current, next);
            self.ready.push_back(prev);
            log::debug!("switch: pid {from} -> pid {pid}");
            return SwitchOutcome::Resumed { from, to: pid };
        }

        let child_table = self.current.page_table_mut().fork_write_protected();
        let mut shared = 0_usize;
        for (_, entry) in child_table.mappings() {
            if let Some(pfn) = entry.frame() {
                self.frames.share_frame(pfn);
                shared += 1;
            }
        }

        let parent = mem::replace(&mut self.current, Process::new(pid, child_table));
        self.ready.push_back(parent);
        log::debug!("fork: pid {from} -> pid {pid}, {shared} pages shared");
        SwitchOutcome::Forked {
            parent: from,
            child: pid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vm_addresses::{PageFrameNumber, VirtualPageNumber};
    use vm_info::MachineConfig;
    use vm_paging::Permission;

    fn mmu(frames: usize) -> Mmu {
        Mmu::new(MachineConfig::default().with_frames(frames)).unwrap()
    }

    fn vpn(v: u32) -> VirtualPageNumber {
        VirtualPageNumber::new(v)
    }

    fn pid(v: u32) -> ProcessId {
        ProcessId::new(v)
    }

    #[test]
    fn fork_shares_and_protects() {
        let mut m = mmu(4);
        m.alloc_page(vpn(0), Permission::ReadWrite).unwrap();
        m.alloc_page(vpn(20), Permission::ReadOnly).unwrap();

        let out = m.switch_process(pid(1));
        assert_eq!(out, SwitchOutcome::Forked { parent: pid(0), child: pid(1) });
        assert_eq!(out.running(), pid(1));
        assert_eq!(m.ready_pids().collect::<Vec<_>>(), [pid(0)]);

        for p in [pid(0), pid(1)] {
            let table = m.process(p).unwrap().page_table();
            assert_eq!(table.mappings().count(), 2);
            assert!(table.mappings().all(|(_, e)| !e.is_writable()));
        }
        assert_eq!(m.map_count(PageFrameNumber::new(0)), 2);
        assert_eq!(m.map_count(PageFrameNumber::new(1)), 2);
    }

    #[test]
    fn resume_rotates_ready_queue() {
        let mut m = mmu(4);
        m.switch_process(pid(1));
        m.switch_process(pid(2));
        assert_eq!(m.ready_pids().collect::<Vec<_>>(), [pid(0), pid(1)]);

        let out = m.switch_process(pid(0));
        assert_eq!(out, SwitchOutcome::Resumed { from: pid(2), to: pid(0) });
        assert_eq!(m.current_pid(), pid(0));
        assert_eq!(m.ready_pids().collect::<Vec<_>>(), [pid(1), pid(2)]);
    }

    #[test]
    fn resume_does_not_touch_page_tables() {
        let mut m = mmu(4);
        m.alloc_page(vpn(3), Permission::ReadWrite).unwrap();
        m.switch_process(pid(1));
        let child = m.current().page_table().clone();
        m.switch_process(pid(0));
        m.switch_process(pid(1));
        assert_eq!(m.current().page_table(), &child);
        assert_eq!(m.map_count(PageFrameNumber::new(0)), 2);
    }

    #[test]
    fn switch_to_self_only_flushes() {
        let mut m = mmu(4);
        m.alloc_page(vpn(3), Permission::ReadWrite).unwrap();
        m.translate(vpn(3), Permission::ReadOnly).unwrap();
        assert_eq!(
            m.switch_process(pid(0)),
            SwitchOutcome::Resumed { from: pid(0), to: pid(0) }
        );
        assert!(m.tlb().is_empty());
        assert!(m.ready().is_empty());
        assert!(m.current().page_table().entry(vpn(3)).unwrap().is_writable());
    }
}
