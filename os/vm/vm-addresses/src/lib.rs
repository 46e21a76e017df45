//! # Page, Frame and Process Numbers
//!
//! Strongly typed wrappers for the numbers the paging simulation passes
//! around. Virtual page numbers, physical frame numbers and process ids are
//! all small integers; mixing them up is the classic bug in paging code, so
//! each gets its own zero-cost newtype.
//!
//! | Type | Wraps | Meaning |
//! |------|-------|---------|
//! | [`VirtualPageNumber`] | `u32` | Page index inside one process's address space. |
//! | [`PageFrameNumber`] | `u16` | Index of a physical page frame. |
//! | [`ProcessId`] | `u32` | Identifier of a simulated process. |
//! | [`OuterIndex`] / [`InnerIndex`] | `usize` | The two table indices a VPN splits into. |
//!
//! ## Two-level split
//!
//! With `n` entries per page-table level, a VPN selects outer slot `vpn / n`
//! and inner slot `vpn % n`:
//!
//! ```rust
//! # use vm_addresses::*;
//! let vpn = VirtualPageNumber::new(37);
//! let (outer, inner) = vpn.split(16);
//! assert_eq!((outer.as_usize(), inner.as_usize()), (2, 5));
//! assert_eq!(VirtualPageNumber::join(outer, inner, 16), vpn);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod indices;
mod page_frame;
mod process_id;
mod virtual_page;

pub use indices::{InnerIndex, OuterIndex};
pub use page_frame::PageFrameNumber;
pub use process_id::ProcessId;
pub use virtual_page::VirtualPageNumber;
