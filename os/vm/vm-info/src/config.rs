//! # Runtime Machine Geometry

use crate::memory::{MAX_PAGEFRAMES, NR_PAGEFRAMES, NR_PTES_PER_PAGE};
use vm_accessors_derive::Accessors;

/// Geometry of one simulated machine.
///
/// Defaults to the compile-time constants in [`memory`](crate::memory).
/// Builders do not validate; call [`validate`](Self::validate) before handing
/// the configuration to a simulation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Accessors)]
pub struct MachineConfig {
    /// Number of physical page frames.
    frames: usize,
    /// Entries per page-table level.
    ptes_per_page: usize,
}

/// Reasons a [`MachineConfig`] cannot describe a machine.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("a machine needs at least one page frame")]
    NoFrames,
    #[error("{0} page frames exceed the addressable maximum of {max}", max = MAX_PAGEFRAMES)]
    TooManyFrames(usize),
    #[error("a page-table level needs at least one entry")]
    EmptyLevel,
    #[error("{0} entries per level overflow the virtual address space")]
    LevelTooLarge(usize),
}

impl MachineConfig {
    /// Build a configuration from explicit values.
    #[inline]
    #[must_use]
    pub const fn new(frames: usize, ptes_per_page: usize) -> Self {
        Self {
            frames,
            ptes_per_page,
        }
    }

    /// Number of virtual pages one process can address.
    #[inline]
    #[must_use]
    pub const fn virtual_pages(&self) -> usize {
        self.ptes_per_page * self.ptes_per_page
    }

    /// Check that the geometry is usable.
    ///
    /// # Errors
    /// - [`ConfigError::NoFrames`] / [`ConfigError::TooManyFrames`] when the
    ///   frame count is zero or does not fit a PTE.
    /// - [`ConfigError::EmptyLevel`] / [`ConfigError::LevelTooLarge`] when the
    ///   level size is zero or its square does not fit a `u32` page number.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.frames == 0 {
            return Err(ConfigError::NoFrames);
        }
        if self.frames > MAX_PAGEFRAMES {
            return Err(ConfigError::TooManyFrames(self.frames));
        }
        if self.ptes_per_page == 0 {
            return Err(ConfigError::EmptyLevel);
        }
        match self.ptes_per_page.checked_mul(self.ptes_per_page) {
            Some(pages) if pages <= u32::MAX as usize => Ok(()),
            _ => Err(ConfigError::LevelTooLarge(self.ptes_per_page)),
        }
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::new(NR_PAGEFRAMES, NR_PTES_PER_PAGE)
    }
}
