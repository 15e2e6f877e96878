//! Heap-specific error types.

use std::error::Error;
use std::fmt;

/// Errors returned by heap operations.
///
/// Every variant except [`InvalidSize`](HeapError::InvalidSize) is also
/// delivered to the heap's [`DiagnosticSink`](crate::DiagnosticSink) along
/// with the caller's source location. None of them leave the arena in an
/// inconsistent state; the heap stays usable after any of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// Requested size was zero or larger than the capacity minus one header.
    InvalidSize {
        /// Number of bytes requested.
        requested: usize,
    },
    /// No free block is large enough for the request.
    OutOfMemory {
        /// Number of bytes requested, rounded up to the 8-byte grain.
        requested: usize,
    },
    /// A release arrived before the arena was ever allocated from.
    UninitializedFree,
    /// The released pointer lies outside the arena's byte range.
    PointerOutOfRange {
        /// The address as the caller supplied it: an arena offset for
        /// [`Ptr`](crate::Ptr) releases, an absolute address for raw ones.
        addr: usize,
    },
    /// The released pointer names a block that is already free.
    DoubleFree {
        /// Payload offset of the free block.
        offset: usize,
    },
    /// The released pointer is inside the arena but not at a payload start.
    MisalignedFree {
        /// The offending arena offset.
        offset: usize,
    },
}

impl HeapError {
    /// Whether this error is reported to the diagnostic sink.
    ///
    /// Invalid sizes are an ordinary null return, not misuse.
    pub fn is_reported(&self) -> bool {
        !matches!(self, Self::InvalidSize { .. })
    }
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { requested } => {
                write!(f, "invalid allocation size: {requested} bytes")
            }
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: no free block holds {requested} bytes")
            }
            Self::UninitializedFree => {
                write!(f, "free() cannot be called before memory is initialized")
            }
            Self::PointerOutOfRange { addr } => {
                write!(f, "pointer {addr:#x} is outside the memory")
            }
            Self::DoubleFree { offset } => {
                write!(f, "pointer at offset {offset} is already freed")
            }
            Self::MisalignedFree { offset } => {
                write!(
                    f,
                    "pointer at offset {offset} does not point to the beginning of a memory segment"
                )
            }
        }
    }
}

impl Error for HeapError {}

/// Errors detected during [`ArenaConfig::validate()`](crate::ArenaConfig::validate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Capacity is not a multiple of 8.
    CapacityNotAligned {
        /// The configured capacity.
        capacity: usize,
    },
    /// Capacity cannot hold two headers and one minimum payload.
    CapacityTooSmall {
        /// The configured capacity.
        capacity: usize,
        /// The smallest acceptable capacity.
        minimum: usize,
    },
    /// `min_split_payload` is zero.
    SplitPayloadZero,
    /// `min_split_payload` is not a multiple of 8.
    SplitPayloadNotAligned {
        /// The configured value.
        value: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityNotAligned { capacity } => {
                write!(f, "capacity {capacity} is not a multiple of 8")
            }
            Self::CapacityTooSmall { capacity, minimum } => {
                write!(f, "capacity {capacity} is below minimum of {minimum}")
            }
            Self::SplitPayloadZero => write!(f, "min_split_payload must be at least 8"),
            Self::SplitPayloadNotAligned { value } => {
                write!(f, "min_split_payload {value} is not a multiple of 8")
            }
        }
    }
}

impl Error for ConfigError {}

/// A broken arena invariant found by [`Heap::check()`](crate::Heap::check).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Corruption {
    /// A header starts too close to the end to fit.
    TruncatedHeader {
        /// Header offset.
        offset: usize,
    },
    /// A block's payload size is not a multiple of 8.
    UnalignedSize {
        /// Header offset.
        offset: usize,
        /// The recorded payload size.
        size: usize,
    },
    /// A block extends past the end of the arena.
    Overrun {
        /// Header offset.
        offset: usize,
        /// Offset one past the block's last byte.
        end: usize,
    },
    /// Two physically adjacent blocks are both free.
    Uncoalesced {
        /// Header offset of the left block.
        left: usize,
        /// Header offset of the right block.
        right: usize,
    },
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedHeader { offset } => {
                write!(f, "header at {offset} does not fit in the arena")
            }
            Self::UnalignedSize { offset, size } => {
                write!(f, "block at {offset} has unaligned size {size}")
            }
            Self::Overrun { offset, end } => {
                write!(f, "block at {offset} ends at {end}, past the arena")
            }
            Self::Uncoalesced { left, right } => {
                write!(f, "free blocks at {left} and {right} were not merged")
            }
        }
    }
}

impl Error for Corruption {}
