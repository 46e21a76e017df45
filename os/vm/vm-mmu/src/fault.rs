//! Page-fault classification and resolution.
//!
//! A fault is raised for a `(vpn, access)` pair whose page-table walk failed.
//! It is either an illegal access, which is reported and changes nothing, or
//! a copy-on-write protection fault on a page that was allocated read-write:
//!
//! | map count | resolution                                      |
//! |-----------|-------------------------------------------------|
//! | 1         | write bit restored, same frame                  |
//! | ≥ 2       | lowest free frame bound, shared count drops by 1 |
//!
//! The handler never caches a translation. A copy drops the cached
//! translation of the faulting page, since it names the old frame; the next
//! [`Mmu::translate`] walks again and caches the new one.

use crate::error::{AccessViolation, VmError};
use crate::mmu::Mmu;
use vm_addresses::{PageFrameNumber, VirtualPageNumber};
use vm_alloc::FrameAlloc;
use vm_paging::{PageTableEntry, Permission, Walk};

/// How a fault was resolved.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FaultResolution {
    /// The frame was no longer shared; write permission was given back.
    WriteRestored { pfn: PageFrameNumber },
    /// The frame was shared; the faulting page now owns a fresh frame.
    Copied {
        from: PageFrameNumber,
        to: PageFrameNumber,
    },
}

impl FaultResolution {
    /// Frame the faulting page is bound to after resolution.
    #[must_use]
    pub const fn frame(self) -> PageFrameNumber {
        match self {
            Self::WriteRestored { pfn } => pfn,
            Self::Copied { to, .. } => to,
        }
    }
}

/// What the handler found when it looked at a faulting access.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FaultCause {
    NoDirectory,
    InvalidEntry,
    WriteToReadOnly,
    /// Write-protected read-write page whose frame has a single mapping.
    CowExclusive(PageTableEntry),
    /// Write-protected read-write page whose frame is mapped more than once.
    CowShared(PageTableEntry),
    /// None of the above; the state contradicts the paging rules.
    Inconsistent(&'static str),
}

impl FaultCause {
    /// The access violation this cause reports, if it is an illegal access.
    #[must_use]
    pub const fn violation(self) -> Option<AccessViolation> {
        match self {
            Self::NoDirectory => Some(AccessViolation::NoDirectory),
            Self::InvalidEntry => Some(AccessViolation::InvalidEntry),
            Self::WriteToReadOnly => Some(AccessViolation::WriteToReadOnly),
            Self::CowExclusive(_) | Self::CowShared(_) | Self::Inconsistent(_) => None,
        }
    }
}

impl<A: FrameAlloc> Mmu<A> {
    /// Classify a fault on `vpn` of the running process without changing
    /// anything.
    #[must_use]
    pub fn classify(&self, vpn: VirtualPageNumber, access: Permission) -> FaultCause {
        let entry = match self.current.page_table().walk(vpn) {
            Walk::NoDirectory => return FaultCause::NoDirectory,
            Walk::Entry(e) => e,
        };
        let Some(pfn) = entry.frame() else {
            return FaultCause::InvalidEntry;
        };
        if entry.permits(access) {
            return FaultCause::Inconsistent("fault on a permitted access");
        }
        if entry.original_permission() == Permission::ReadOnly {
            return FaultCause::WriteToReadOnly;
        }
        match self.frames.map_count(pfn) {
            0 => FaultCause::Inconsistent("mapped frame has no map count"),
            1 => FaultCause::CowExclusive(entry),
            _ => FaultCause::CowShared(entry),
        }
    }

    /// Resolve a fault on `vpn` of the running process.
    ///
    /// # Errors
    /// - [`VmError::IllegalAccess`] for an unmapped page or a write to a
    ///   read-only page.
    /// - [`VmError::OutOfMemory`] if a shared frame must be copied and no
    ///   frame is free. The page stays shared and write-protected.
    /// - [`VmError::InternalInconsistency`] if the state cannot have faulted.
    pub fn handle_page_fault(
        &mut self,
        vpn: VirtualPageNumber,
        access: Permission,
    ) -> Result<FaultResolution, VmError> {
        self.check_range(vpn)?;
        let pid = self.current.pid();

        let cause = self.classify(vpn, access);
        if let Some(violation) = cause.violation() {
            log::warn!("pid {pid}: {access} access to vpn {vpn} refused: {violation}");
            return Err(VmError::illegal(vpn, violation));
        }

        match cause {
            FaultCause::CowExclusive(entry) => {
                let (Some(pfn), Some(restored)) = (entry.frame(), entry.with_write_restored())
                else {
                    return Err(self.inconsistent(vpn, "cannot restore write permission"));
                };
                self.current.page_table_mut().replace(vpn, restored);
                log::debug!("pid {pid}: vpn {vpn} writable again on pfn {pfn}");
                Ok(FaultResolution::WriteRestored { pfn })
            }
            FaultCause::CowShared(entry) => {
                let Some(from) = entry.frame() else {
                    return Err(self.inconsistent(vpn, "shared entry has no frame"));
                };
                let to = self.frames.try_alloc_frame().inspect_err(|_| {
                    log::warn!("pid {pid}: no frame left to copy vpn {vpn} off pfn {from}");
                })?;
                let Some(copy) = entry.rebound(to).with_write_restored() else {
                    self.frames.release_frame(to);
                    return Err(self.inconsistent(vpn, "cannot restore write permission"));
                };
                let left = self.frames.release_frame(from);
                self.current.page_table_mut().replace(vpn, copy);
                self.tlb.evict(vpn);
                log::debug!("pid {pid}: copied vpn {vpn} from pfn {from} ({left} left) to pfn {to}");
                Ok(FaultResolution::Copied { from, to })
            }
            FaultCause::Inconsistent(detail) => Err(self.inconsistent(vpn, detail)),
            FaultCause::NoDirectory | FaultCause::InvalidEntry | FaultCause::WriteToReadOnly => {
                Err(self.inconsistent(vpn, "unreported access violation"))
            }
        }
    }

    fn inconsistent(&self, vpn: VirtualPageNumber, detail: &'static str) -> VmError {
        log::error!("pid {}: fault on vpn {vpn}: {detail}", self.current.pid());
        VmError::InternalInconsistency { vpn, detail }
    }
}
