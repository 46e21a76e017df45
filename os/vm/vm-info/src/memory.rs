//! # Memory Layout

/// Number of physical page frames in the simulated machine.
pub const NR_PAGEFRAMES: usize = 128;

/// log2 of the number of entries held by one page-table level.
pub const PTES_PER_PAGE_SHIFT: u32 = 4;

/// Entries per page-table level (outer directory and inner directories alike).
pub const NR_PTES_PER_PAGE: usize = 1 << PTES_PER_PAGE_SHIFT;

/// Virtual pages addressable by one process (outer × inner).
pub const NR_VIRTUAL_PAGES: usize = NR_PTES_PER_PAGE * NR_PTES_PER_PAGE;

/// Upper bound on the frame count: a page-table entry stores a 16-bit PFN.
pub const MAX_PAGEFRAMES: usize = 1 << 16;

/// PID of the process that exists before any switch happens.
pub const ROOT_PID: u32 = 0;

const _: () = {
    assert!(NR_PAGEFRAMES > 0);
    assert!(NR_PAGEFRAMES <= MAX_PAGEFRAMES);
    assert!(NR_PTES_PER_PAGE.is_power_of_two());
};
