//! # Two-Level Paging Structures
//!
//! The translation state of the simulated MMU: page-table entries, the
//! two-level page table built from them, and the TLB that caches their
//! translations for the running process.
//!
//! ## Virtual Page Number → Page Frame Number Walk
//!
//! With `n` entries per level, a VPN is split into two indices:
//!
//! ```text
//! |   vpn / n   |   vpn % n   |
//! |    outer    |    inner    |
//! ```
//!
//! ```text
//!  PageTable (outer)  →  PteDirectory (inner)  →  PageTableEntry  →  frame
//!   │                     │
//!   │                     └───► allocated on first use of any of its entries
//!   └─────────────────────────► one per process
//! ```
//!
//! ## Entry bits
//!
//! Every [`PageTableEntry`] carries the hardware-visible `valid` and
//! `writable` bits plus the [`Permission`] the page was opened with. The two
//! are deliberately separate: copy-on-write sharing clears `writable` on a
//! page that is still logically read-write, and only the original permission
//! tells a protection fault that can be resolved by copying apart from an
//! illegal write.
//!
//! ## What you get
//! - [`PageTableEntry`] / [`PageEntryBits`]: the entry and its raw bitfield.
//! - [`PteDirectory`]: one inner directory.
//! - [`PageTable`]: the outer directory with lazily allocated inner directories.
//! - [`Tlb`]: the translation cache, plus hit/miss accounting in [`TlbStats`].

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod directory;
mod entry;
mod page_table;
mod permission;
mod tlb;

pub use crate::directory::PteDirectory;
pub use crate::entry::{PageEntryBits, PageTableEntry};
pub use crate::page_table::{PageTable, Walk};
pub use crate::permission::Permission;
pub use crate::tlb::{Tlb, TlbEntry, TlbStats};
