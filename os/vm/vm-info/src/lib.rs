//! # Machine Configuration
//!
//! This crate is the authoritative source for the fixed geometry of the
//! simulated machine: how many physical page frames exist and how many
//! entries each level of the two-level page table holds. Every other crate
//! in the workspace sizes its tables from here, so the frame allocator, the
//! page tables and the TLB can never disagree about the shape of memory.
//!
//! ## Architecture
//!
//! ### Memory Layout ([`memory`])
//! Compile-time defaults:
//! * **Page frames**: [`NR_PAGEFRAMES`](memory::NR_PAGEFRAMES) physical frames
//! * **Table geometry**: [`NR_PTES_PER_PAGE`](memory::NR_PTES_PER_PAGE) entries per level
//! * **Address space**: [`NR_VIRTUAL_PAGES`](memory::NR_VIRTUAL_PAGES) virtual pages per process
//!
//! ### Runtime Geometry ([`config`])
//! A validated [`MachineConfig`] that lets a simulation pick a different
//! geometry (tests typically shrink the frame count to provoke exhaustion):
//!
//! ```rust
//! # use vm_info::MachineConfig;
//! let config = MachineConfig::default().with_frames(4);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.virtual_pages(), 16 * 16);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod config;
pub mod memory;

pub use config::{ConfigError, MachineConfig};
