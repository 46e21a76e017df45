//! # Simulated MMU with Copy-on-Write Fork
//!
//! This crate ties the paging structures together into one simulation
//! context, the [`Mmu`]. It owns every piece of shared mutable state of the
//! simulated machine and is passed by `&mut` to each operation, so an
//! operation always runs to completion before the next one can observe
//! anything:
//!
//! ```text
//! ┌──────────────────────────── Mmu ────────────────────────────┐
//! │  Tlb            translations of the running process only     │
//! │  current        running Process (pid + PageTable)            │
//! │  ready          suspended processes, in switch order         │
//! │  frames         map count per physical frame (FrameAlloc)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Access path
//!
//! [`Mmu::translate`] is what a memory access does:
//!
//! 1. Reads consult the TLB first. Writes never do, because a cached
//!    translation carries no write permission.
//! 2. The page table is walked. A walk that succeeds is cached in the TLB.
//! 3. A failed walk raises a page fault ([`Mmu::handle_page_fault`]). The
//!    handler either reports an illegal access or resolves a copy-on-write
//!    protection fault, after which the walk is retried once.
//!
//! ## Copy-on-write
//!
//! [`Mmu::switch_process`] to an unknown pid forks the running process. The
//! child's page table shares every frame of the parent, and both sides lose
//! write permission. The first write on either side faults; if the frame is
//! still shared the writer gets a fresh frame, otherwise it simply gets its
//! write permission back.
//!
//! ```rust
//! use vm_info::MachineConfig;
//! use vm_mmu::{Mmu, ProcessId, VirtualPageNumber, Permission};
//!
//! let mut mmu = Mmu::new(MachineConfig::default().with_frames(4)).unwrap();
//! let vpn = VirtualPageNumber::new(0);
//! assert_eq!(mmu.alloc_page(vpn, Permission::ReadWrite).unwrap().as_usize(), 0);
//!
//! mmu.switch_process(ProcessId::new(1));
//! let child_frame = mmu.translate(vpn, Permission::ReadWrite).unwrap();
//! assert_eq!(child_frame.as_usize(), 1);
//! assert!(mmu.check_invariants().is_ok());
//! ```
//!
//! ## Errors
//!
//! Every failure is a [`VmError`] value; nothing here retries on its own or
//! terminates a process. What to do about an illegal access is the caller's
//! decision.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod error;
mod fault;
mod inspect;
mod mmu;
mod process;
mod switch;

pub use crate::error::{AccessViolation, VmError};
pub use crate::fault::{FaultCause, FaultResolution};
pub use crate::inspect::InvariantViolation;
pub use crate::mmu::Mmu;
pub use crate::process::{Process, ReadyQueue};
pub use crate::switch::SwitchOutcome;

pub use vm_addresses::{PageFrameNumber, ProcessId, VirtualPageNumber};
pub use vm_alloc::{FrameAlloc, MapCounts, OutOfFrames};
pub use vm_info::{ConfigError, MachineConfig};
pub use vm_paging::{PageTable, PageTableEntry, Permission, TlbStats};
