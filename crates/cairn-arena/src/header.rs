//! Block headers and block walking.
//!
//! Every block starts with an 8-byte [`Header`] stored in the arena itself,
//! followed by its payload. The header is a single little-endian `u64`:
//!
//! ```text
//! bit 63                               3   2   1   0
//! ┌───────────────────────────────────┬───┬───┬───────┐
//! │ payload size (multiple of 8)      │ 0 │ 0 │ used  │
//! └───────────────────────────────────┴───┴───┴───────┘
//! ```
//!
//! Because sizes are multiples of 8 the low three bits are free; bit 0
//! carries the occupied flag. Bits 1 and 2 stay zero in a healthy arena
//! and are decoded as part of the size, so a stray write shows up as an
//! unaligned size in [`Heap::check`](crate::Heap::check).
//!
//! The next header lives at `offset + HEADER_SIZE + size`.

use crate::arena::Arena;
use crate::handle::Ptr;

/// Size of a block header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Allocation grain. Every payload size is a multiple of this.
pub const ALIGN: usize = 8;

const OCCUPIED_BIT: u64 = 1;

/// Round `size` up to the next multiple of [`ALIGN`].
///
/// Callers must ensure `size + ALIGN - 1` does not overflow.
#[inline]
pub const fn round_up(size: usize) -> usize {
    (size + ALIGN - 1) & !(ALIGN - 1)
}

/// Decoded per-block metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    size: usize,
    occupied: bool,
}

impl Header {
    /// Create a header for a payload of `size` bytes.
    pub const fn new(size: usize, occupied: bool) -> Self {
        Self { size, occupied }
    }

    /// Header for a free block.
    pub const fn free(size: usize) -> Self {
        Self::new(size, false)
    }

    /// Header for an occupied block.
    pub const fn used(size: usize) -> Self {
        Self::new(size, true)
    }

    /// Payload size in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Whether the block is handed out.
    pub const fn occupied(&self) -> bool {
        self.occupied
    }

    /// Bytes covered by the block, header included.
    pub const fn span(&self) -> usize {
        HEADER_SIZE.saturating_add(self.size)
    }

    pub(crate) fn encode(self) -> [u8; HEADER_SIZE] {
        debug_assert_eq!(self.size % ALIGN, 0, "unaligned block size");
        let word = self.size as u64 | if self.occupied { OCCUPIED_BIT } else { 0 };
        word.to_le_bytes()
    }

    pub(crate) fn decode(bytes: [u8; HEADER_SIZE]) -> Self {
        let word = u64::from_le_bytes(bytes);
        Self {
            size: (word & !OCCUPIED_BIT) as usize,
            occupied: word & OCCUPIED_BIT != 0,
        }
    }
}

/// A block as seen by a walk over the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Offset of the block's header within the arena.
    pub offset: usize,
    /// Payload size in bytes.
    pub size: usize,
    /// Whether the block is handed out.
    pub occupied: bool,
}

impl BlockInfo {
    /// Offset of the first payload byte.
    pub fn payload_offset(&self) -> usize {
        self.offset + HEADER_SIZE
    }

    /// Offset one past the block's last byte.
    pub fn end(&self) -> usize {
        self.payload_offset() + self.size
    }

    /// The handle a caller would hold for this block.
    pub fn ptr(&self) -> Ptr {
        Ptr::new(self.payload_offset())
    }
}

/// Iterator over the blocks of an arena in address order.
///
/// Yields nothing for an uninitialized arena. Stops at the first header
/// whose block would cross the arena's end, so a walk never reads past
/// the upper bound.
pub struct Blocks<'a> {
    arena: &'a Arena,
    offset: usize,
}

impl<'a> Blocks<'a> {
    pub(crate) fn new(arena: &'a Arena) -> Self {
        let offset = if arena.is_initialized() {
            0
        } else {
            arena.capacity()
        };
        Self { arena, offset }
    }
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let capacity = self.arena.capacity();
        if self.offset + HEADER_SIZE > capacity {
            return None;
        }
        let header = self.arena.header(self.offset);
        let end = self.offset.checked_add(header.span())?;
        if end > capacity {
            self.offset = capacity;
            return None;
        }
        let block = BlockInfo {
            offset: self.offset,
            size: header.size(),
            occupied: header.occupied(),
        };
        self.offset = end;
        Some(block)
    }
}
