//! # Page-Table Entry
//!
//! - [`PageEntryBits`]: the raw 32-bit layout.
//! - [`PageTableEntry`]: typed view that keeps the copy-on-write rules.
//!
//! ## Invariants & Notes
//!
//! - An entry whose original permission is read-only can never be made
//!   writable; [`PageTableEntry::with_write_restored`] refuses it.
//! - The frame number is only meaningful while `valid` is set; cleared
//!   entries carry frame 0.
//! - Whether the frame is shared is not known to the entry. Callers consult
//!   the frame reference counts before restoring write access.

use crate::Permission;
use bitfield_struct::bitfield;
use vm_addresses::PageFrameNumber;

/// Raw page-table entry bits.
///
/// ### Bit layout
///
/// | Bits  | Name                | Meaning |
/// |-------|---------------------|---------|
/// | 0     | `valid`             | Entry maps a frame |
/// | 1     | `writable`          | Writes are currently permitted |
/// | 2     | `read_only_origin`  | Page was allocated read-only |
/// | 3–15  | reserved            | Zero |
/// | 16–31 | `frame`             | Physical frame number |
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct PageEntryBits {
    /// Valid (bit 0).
    pub valid: bool,
    /// Writable (bit 1).
    ///
    /// Cleared on both sides of a fork to force a fault on the next write.
    pub writable: bool,
    /// Original permission was read-only (bit 2).
    ///
    /// Set once at allocation time and copied verbatim into forked children.
    pub read_only_origin: bool,
    #[bits(13)]
    __: u16,
    /// Physical frame number (bits 16..31).
    #[bits(16)]
    pub frame: u16,
}

/// A single page-table entry.
///
/// All bits live inside the inner [`PageEntryBits`]; the typed helpers below
/// are the only way the simulation changes them.
///
/// ```rust
/// # use vm_paging::{PageTableEntry, Permission};
/// # use vm_addresses::PageFrameNumber;
/// let e = PageTableEntry::mapped(PageFrameNumber::new(3), Permission::ReadWrite);
/// let shared = e.write_protected();
/// assert!(!shared.is_writable());
/// assert_eq!(shared.original_permission(), Permission::ReadWrite);
/// assert!(shared.with_write_restored().is_some_and(PageTableEntry::is_writable));
/// ```
#[doc(alias = "PTE")]
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Default)]
pub struct PageTableEntry(PageEntryBits);

impl PageTableEntry {
    /// Create a zero (invalid) entry.
    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self(PageEntryBits::new())
    }

    /// Create a valid entry bound to `pfn`, opened with `permission`.
    ///
    /// `writable` follows the permission and the original-permission tag
    /// records it.
    #[inline]
    #[must_use]
    pub const fn mapped(pfn: PageFrameNumber, permission: Permission) -> Self {
        Self(
            PageEntryBits::new()
                .with_valid(true)
                .with_writable(permission.allows_write())
                .with_read_only_origin(!permission.allows_write())
                .with_frame(pfn.as_u16()),
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0.valid()
    }

    #[inline]
    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.0.writable()
    }

    /// The bound frame, if the entry is valid.
    #[inline]
    #[must_use]
    pub const fn frame(self) -> Option<PageFrameNumber> {
        if self.is_valid() {
            Some(PageFrameNumber::new(self.0.frame()))
        } else {
            None
        }
    }

    /// Permission the page was allocated with, independent of COW protection.
    #[inline]
    #[must_use]
    pub const fn original_permission(self) -> Permission {
        if self.0.read_only_origin() {
            Permission::ReadOnly
        } else {
            Permission::ReadWrite
        }
    }

    /// `true` if an `access` through this entry succeeds without a fault.
    #[inline]
    #[must_use]
    pub const fn permits(self, access: Permission) -> bool {
        self.is_valid() && (!access.allows_write() || self.is_writable())
    }

    /// Same entry with write permission removed.
    #[inline]
    #[must_use]
    pub const fn write_protected(self) -> Self {
        Self(self.0.with_writable(false))
    }

    /// Same entry with write permission restored, or `None` if the page is
    /// invalid or was opened read-only.
    #[inline]
    #[must_use]
    pub const fn with_write_restored(self) -> Option<Self> {
        if !self.is_valid() || self.0.read_only_origin() {
            return None;
        }
        Some(Self(self.0.with_writable(true)))
    }

    /// Same entry bound to another frame; permission bits are kept.
    #[inline]
    #[must_use]
    pub const fn rebound(self, pfn: PageFrameNumber) -> Self {
        Self(self.0.with_frame(pfn.as_u16()))
    }

    /// Expose the underlying bitfield.
    #[inline]
    #[must_use]
    pub const fn flags(self) -> PageEntryBits {
        self.0
    }

    /// Return the raw 32-bit value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0.into_bits()
    }

    /// Construct from a raw 32-bit value. No validation is performed.
    #[inline]
    #[must_use]
    pub const fn from_raw(v: u32) -> Self {
        Self(PageEntryBits::from_bits(v))
    }
}

impl core::fmt::Debug for PageTableEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageTableEntry")
            .field("valid", &self.is_valid())
            .field("writable", &self.is_writable())
            .field("original", &self.original_permission())
            .field("frame", &self.0.frame())
            .finish()
    }
}
