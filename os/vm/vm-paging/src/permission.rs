use core::fmt;

/// Access mode of a page, or of a request against it.
///
/// As a page attribute it is the permission the page was allocated with.
/// As a request it says whether the access reads or also writes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Permission {
    /// Read access only.
    ReadOnly,
    /// Read and write access.
    ReadWrite,
}

impl Permission {
    /// `true` for [`Permission::ReadWrite`].
    #[inline]
    #[must_use]
    pub const fn allows_write(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadOnly => "r-",
            Self::ReadWrite => "rw",
        })
    }
}
