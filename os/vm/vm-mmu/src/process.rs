//! Simulated processes and the ready queue.

use alloc::collections::VecDeque;
use vm_addresses::ProcessId;
use vm_paging::PageTable;

/// A process: an id and the page table it owns.
#[derive(Clone, Debug)]
pub struct Process {
    pid: ProcessId,
    page_table: PageTable,
}

impl Process {
    #[must_use]
    pub const fn new(pid: ProcessId, page_table: PageTable) -> Self {
        Self { pid, page_table }
    }

    #[inline]
    #[must_use]
    pub const fn pid(&self) -> ProcessId {
        self.pid
    }

    #[inline]
    #[must_use]
    pub const fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    #[inline]
    pub(crate) const fn page_table_mut(&mut self) -> &mut PageTable {
        &mut self.page_table
    }
}

/// Processes waiting to run, oldest first.
///
/// Switching away from a process appends it at the back; resuming removes
/// the requested pid wherever it sits.
#[derive(Clone, Debug, Default)]
pub struct ReadyQueue {
    processes: VecDeque<Process>,
}

impl ReadyQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            processes: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, pid: ProcessId) -> bool {
        self.processes.iter().any(|p| p.pid == pid)
    }

    /// Borrow the waiting process with `pid`.
    #[must_use]
    pub fn get(&self, pid: ProcessId) -> Option<&Process> {
        self.processes.iter().find(|p| p.pid == pid)
    }

    pub fn push_back(&mut self, process: Process) {
        debug_assert!(!self.contains(process.pid), "pid {} queued twice", process.pid);
        self.processes.push_back(process);
    }

    /// Unlink and return the process with `pid`.
    pub fn take(&mut self, pid: ProcessId) -> Option<Process> {
        let at = self.processes.iter().position(|p| p.pid == pid)?;
        self.processes.remove(at)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> + '_ {
        self.processes.iter()
    }
}
