use vm_addresses::VirtualPageNumber;
use vm_alloc::OutOfFrames;

/// Failure of a paging operation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum VmError {
    /// No free frame was left for an allocation or a copy-on-write copy.
    #[error(transparent)]
    OutOfMemory(#[from] OutOfFrames),

    /// The access is not allowed; the caller decides what happens to the process.
    #[error("illegal access to vpn {vpn}: {violation}")]
    IllegalAccess {
        vpn: VirtualPageNumber,
        violation: AccessViolation,
    },

    /// `alloc_page` on a page that is already mapped.
    #[error("vpn {0} is already mapped")]
    AlreadyMapped(VirtualPageNumber),

    /// The simulation reached a state its own rules exclude.
    #[error("internal inconsistency at vpn {vpn}: {detail}")]
    InternalInconsistency {
        vpn: VirtualPageNumber,
        detail: &'static str,
    },
}

/// Why an access was refused.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, thiserror::Error)]
pub enum AccessViolation {
    #[error("page number outside the address space")]
    OutOfRange,
    /// The page's inner directory was never allocated.
    #[error("page directory not allocated")]
    NoDirectory,
    /// The directory exists but the entry maps nothing.
    #[error("page not mapped")]
    InvalidEntry,
    #[error("write to read-only page")]
    WriteToReadOnly,
}

impl VmError {
    pub(crate) const fn illegal(vpn: VirtualPageNumber, violation: AccessViolation) -> Self {
        Self::IllegalAccess { vpn, violation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_name_the_page() {
        let vpn = VirtualPageNumber::new(5);
        assert_eq!(
            VmError::illegal(vpn, AccessViolation::WriteToReadOnly).to_string(),
            "illegal access to vpn 5: write to read-only page"
        );
        assert_eq!(
            VmError::AlreadyMapped(vpn).to_string(),
            "vpn 5 is already mapped"
        );
        assert_eq!(
            VmError::from(OutOfFrames { frames: 4 }).to_string(),
            "all 4 page frames are in use"
        );
    }

    #[test]
    fn violations_describe_themselves() {
        assert_eq!(AccessViolation::OutOfRange.to_string(), "page number outside the address space");
        assert_eq!(AccessViolation::NoDirectory.to_string(), "page directory not allocated");
        assert_eq!(AccessViolation::InvalidEntry.to_string(), "page not mapped");
        let err: &dyn core::error::Error = &AccessViolation::WriteToReadOnly;
        assert!(err.source().is_none());
    }
}
