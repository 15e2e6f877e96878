//! Allocation handles.
//!
//! A [`Ptr`] is what `allocate` hands back: the arena offset of a block's
//! first payload byte. It stays valid while that block is occupied; blocks
//! never move, so the offset never changes underneath the caller.

use std::fmt;

use crate::header::HEADER_SIZE;

/// Offset of a payload within the arena.
///
/// Handles can be built from arbitrary offsets so that callers can express
/// the same mistakes a raw pointer allows (releasing `p + 1`, or an offset
/// past the arena). The heap validates every handle it is given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[must_use]
pub struct Ptr(usize);

impl Ptr {
    /// Create a handle for the given arena offset.
    pub const fn new(offset: usize) -> Self {
        Self(offset)
    }

    /// The arena offset this handle points at.
    pub const fn offset(&self) -> usize {
        self.0
    }

    /// A handle `bytes` further into the arena.
    pub const fn add(self, bytes: usize) -> Self {
        Self(self.0.saturating_add(bytes))
    }

    /// Offset of the header this handle claims to follow, if any.
    pub(crate) fn header_offset(&self) -> Option<usize> {
        self.0.checked_sub(HEADER_SIZE)
    }
}

impl fmt::Display for Ptr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ptr(+{})", self.0)
    }
}
